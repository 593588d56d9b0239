//! SVG overlay for a search result.
//!
//! The overlay shares the source image's pixel coordinate system
//! (`viewBox="0 0 width height"`), so it can be layered over the image
//! in a browser or vector editor. Unlike the raster annotation it
//! carries the diagnostic caption as real `<text>` elements.
//!
//! Built with the [`svg`] crate, which handles XML escaping.

use circlesweep_search::{Dimensions, ScoredCandidate};
use svg::Document;
use svg::node::element::{Circle, Description, Element, Group, Line, Title};
use svg::node::{Node, Text};

/// Caption line height in pixels.
const CAPTION_LINE_HEIGHT: f64 = 14.0;
/// Caption inset from the top-left corner in pixels.
const CAPTION_INSET: f64 = 8.0;

/// Metadata to embed in the overlay document.
#[derive(Debug, Clone, Default)]
pub struct OverlayMetadata<'a> {
    /// Emitted as `<title>`, typically the source image file name.
    pub title: Option<&'a str>,
    /// Emitted as `<desc>`, typically the serialized search config.
    pub description: Option<&'a str>,
}

/// Serialize `best` as an SVG overlay sized to `dimensions`.
///
/// With no winner the document contains only the image-center
/// crosshair and the caption.
#[must_use]
pub fn to_overlay_svg(
    dimensions: Dimensions,
    best: Option<&ScoredCandidate>,
    caption: &[String],
    metadata: &OverlayMetadata<'_>,
) -> String {
    let (w, h) = (dimensions.width, dimensions.height);
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let center = dimensions.center();
    let arm = f64::from(w.min(h)) / 20.0;
    let crosshair = Group::new()
        .set("id", "image-center")
        .set("stroke", "red")
        .set("stroke-width", 1)
        .add(line((center.x - arm, center.y), (center.x + arm, center.y)))
        .add(line((center.x, center.y - arm), (center.x, center.y + arm)));
    doc = doc.add(crosshair);

    if let Some(best) = best {
        let c = best.circle;
        let group = Group::new()
            .set("id", "best-circle")
            .set("data-canny", best.parameters.canny_threshold)
            .set("data-accumulator", best.parameters.accumulator_threshold)
            .set("data-score", best.score)
            .add(
                Circle::new()
                    .set("cx", c.center.x)
                    .set("cy", c.center.y)
                    .set("r", c.radius)
                    .set("fill", "none")
                    .set("stroke", "lime")
                    .set("stroke-width", 2),
            )
            .add(
                line((center.x, center.y), (c.center.x, c.center.y))
                    .set("stroke", "yellow")
                    .set("stroke-width", 1),
            );
        doc = doc.add(group);
    }

    if !caption.is_empty() {
        let mut text = Group::new()
            .set("id", "caption")
            .set("font-family", "monospace")
            .set("font-size", 12)
            .set("fill", "white")
            .set("stroke", "black")
            .set("stroke-width", 0.5);
        for (i, entry) in caption.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = CAPTION_LINE_HEIGHT.mul_add(i as f64 + 1.0, CAPTION_INSET);
            let mut el = Element::new("text");
            el.assign("x", CAPTION_INSET);
            el.assign("y", y);
            el.append(Text::new(entry.as_str()));
            text = text.add(el);
        }
        doc = doc.add(text);
    }

    // The svg crate omits the XML declaration.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

fn line(from: (f64, f64), to: (f64, f64)) -> Line {
    Line::new()
        .set("x1", from.0)
        .set("y1", from.1)
        .set("x2", to.0)
        .set("y2", to.1)
}
