//! circlesweep: find the best centered circle of a target diameter.
//!
//! Sweeps the (Canny, accumulator) threshold grid of the built-in circle
//! detector over an image, scores every detection by diameter match and
//! distance from the image center, and reports the winner.
//!
//! # Usage
//!
//! ```text
//! circlesweep [OPTIONS] --target-diameter <PX> <IMAGE_PATH>
//! ```
//!
//! Exit status is 0 when a circle was found, 2 when the search finished
//! without a match, and 1 on error.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use circlesweep_io::{LogObserver, OutputOptions, find_best_circle};
use circlesweep_search::{DetectorKind, SearchConfig, SearchOutcome, ThresholdRange};
use clap::{ArgAction, Parser};

/// Find the best centered circle of a target diameter in an image.
///
/// Runs the circle detector once per (Canny threshold, accumulator
/// threshold) pair in parallel and keeps the circle whose diameter is
/// closest to the target and whose center is closest to the image
/// center.
#[derive(Parser)]
#[command(name = "circlesweep", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Diameter of the circle to look for, in pixels.
    #[arg(long, default_value_t = SearchConfig::DEFAULT_TARGET_DIAMETER)]
    target_diameter: f64,

    /// Reject circles whose diameter differs from the target by more
    /// than this many pixels. 0 disables the filter.
    #[arg(long, default_value_t = SearchConfig::DEFAULT_DIAMETER_TOLERANCE)]
    diameter_tolerance: f64,

    /// Canny threshold sweep as START:END:STEP (inclusive).
    #[arg(long, value_name = "START:END:STEP", default_value_t = RangeArg(SearchConfig::DEFAULT_CANNY))]
    canny: RangeArg,

    /// Accumulator threshold sweep as START:END:STEP (inclusive).
    #[arg(long, value_name = "START:END:STEP", default_value_t = RangeArg(SearchConfig::DEFAULT_ACCUMULATOR))]
    accumulator: RangeArg,

    /// Weight of the diameter error in the score.
    #[arg(long, default_value_t = SearchConfig::DEFAULT_SIZE_WEIGHT)]
    size_weight: f64,

    /// Weight of the center distance in the score.
    #[arg(long, default_value_t = SearchConfig::DEFAULT_CENTER_WEIGHT)]
    center_weight: f64,

    /// Worker threads. 0 uses every available hardware thread.
    #[arg(long, default_value_t = 0)]
    max_threads: usize,

    /// Score below which a candidate counts as a good match.
    #[arg(long, default_value_t = SearchConfig::DEFAULT_GOOD_MATCH_SCORE)]
    good_match_score: f64,

    /// Keep good matches and write one annotated image per candidate
    /// into --candidates-dir.
    #[arg(long)]
    save_candidates: bool,

    /// Maximum number of saved candidates.
    #[arg(long, default_value_t = SearchConfig::DEFAULT_MAX_CANDIDATES)]
    max_candidates: usize,

    /// Save every good match instead of stopping at --max-candidates.
    #[arg(long)]
    no_candidate_limit: bool,

    /// Full search config as a JSON file.
    ///
    /// When provided, all other search parameter flags are ignored.
    /// Missing fields take their default values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write an annotated copy of the image here.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write a plain-text summary here.
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Write an SVG overlay with the diagnostic caption here.
    #[arg(long, value_name = "FILE")]
    overlay_svg: Option<PathBuf>,

    /// Directory for per-candidate images (with --save-candidates).
    #[arg(long, value_name = "DIR", default_value = "candidates")]
    candidates_dir: PathBuf,

    /// Print the result as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Print the resolved search config as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// A threshold sweep given on the command line as `START:END:STEP`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RangeArg(ThresholdRange);

impl FromStr for RangeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [start, end, step] = parts.as_slice() else {
            return Err(format!("expected START:END:STEP, got '{s}'"));
        };
        let number = |label: &str, text: &str| {
            text.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid {label} '{text}': {e}"))
        };
        Ok(Self(ThresholdRange::new(
            number("start", *start)?,
            number("end", *end)?,
            number("step", *step)?,
        )))
    }
}

impl fmt::Display for RangeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.0.start, self.0.end, self.0.step)
    }
}

/// Build a [`SearchConfig`] from CLI arguments.
///
/// If `--config` is provided, the file is parsed as JSON and all
/// individual search flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<SearchConfig, String> {
    if let Some(ref path) = cli.config {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
        return serde_json::from_str(&json)
            .map_err(|e| format!("Error parsing {}: {e}", path.display()));
    }

    Ok(SearchConfig {
        target_diameter: cli.target_diameter,
        diameter_tolerance: cli.diameter_tolerance,
        canny: cli.canny.0,
        accumulator: cli.accumulator.0,
        size_weight: cli.size_weight,
        center_weight: cli.center_weight,
        max_threads: cli.max_threads,
        save_candidates: cli.save_candidates,
        limit_candidates: !cli.no_candidate_limit,
        max_candidates: cli.max_candidates,
        good_match_score: cli.good_match_score,
    })
}

fn output_from_cli(cli: &Cli) -> OutputOptions {
    OutputOptions {
        annotated_path: cli.output.clone(),
        summary_path: cli.summary.clone(),
        svg_path: cli.overlay_svg.clone(),
        candidates_dir: Some(cli.candidates_dir.clone()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    if cli.print_config {
        return match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error serializing config: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Some(cells) = config.grid_size() {
        log::info!(
            "{}: target diameter {}, {cells} combinations",
            cli.image_path.display(),
            config.target_diameter,
        );
    }

    let result = match find_best_circle(
        &cli.image_path,
        &config,
        &DetectorKind::Contour,
        &LogObserver,
        &output_from_cli(&cli),
    ) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", result.report());
    }

    match result.outcome() {
        SearchOutcome::Found(_) => ExitCode::SUCCESS,
        SearchOutcome::NoMatch | SearchOutcome::Cancelled => ExitCode::from(2),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("circlesweep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_search_config() {
        let config = config_from_cli(&parse(&["coin.png"])).unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn flags_override_fields() {
        let cli = parse(&[
            "coin.png",
            "--target-diameter",
            "60",
            "--canny",
            "90:110:10",
            "--accumulator",
            "40:60:10",
            "--max-threads",
            "3",
            "--save-candidates",
            "--no-candidate-limit",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.target_diameter, 60.0);
        assert_eq!(config.canny, ThresholdRange::new(90.0, 110.0, 10.0));
        assert_eq!(config.accumulator, ThresholdRange::new(40.0, 60.0, 10.0));
        assert_eq!(config.max_threads, 3);
        assert!(config.save_candidates);
        assert!(!config.limit_candidates);
        assert_eq!(config.grid_size(), Some(9));
    }

    #[test]
    fn range_round_trips_through_display() {
        let arg: RangeArg = "50:200:10".parse().unwrap();
        assert_eq!(arg.0, SearchConfig::DEFAULT_CANNY);
        assert_eq!(arg.to_string(), "50:200:10");
    }

    #[test]
    fn malformed_range_is_rejected() {
        assert!("50:200".parse::<RangeArg>().is_err());
        assert!("50:x:10".parse::<RangeArg>().is_err());
        assert!(
            Cli::try_parse_from(["circlesweep", "coin.png", "--canny", "1:2"]).is_err()
        );
    }

    #[test]
    fn config_file_replaces_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"target_diameter": 42.0, "max_threads": 1}"#).unwrap();

        let cli = parse(&[
            "coin.png",
            "--config",
            path.to_str().unwrap(),
            "--target-diameter",
            "99",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.target_diameter, 42.0);
        assert_eq!(config.max_threads, 1);
        assert_eq!(config.canny, SearchConfig::DEFAULT_CANNY);
    }

    #[test]
    fn unreadable_config_file_is_an_error() {
        let cli = parse(&["coin.png", "--config", "/definitely/not/here.json"]);
        assert!(config_from_cli(&cli).unwrap_err().contains("Error reading"));
    }

    #[test]
    fn overflowing_grid_fails_validation() {
        let cli = parse(&[
            "coin.png",
            "--canny",
            "1:1e12:1",
            "--accumulator",
            "1:1e12:1",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.grid_size(), None);
        assert!(config.validate().unwrap_err().to_string().contains("grid too large"));
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(parse(&["coin.png", "-vv"]).verbose, 2);
    }
}
