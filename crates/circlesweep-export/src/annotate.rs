//! Annotated raster output.
//!
//! Draws the winning circle, a marker on its center, a crosshair on the
//! image center and a line connecting the two over a color copy of the
//! source image, then prints the caption in a shaded box in the top-left
//! corner. Strokes are rasterised by `tiny-skia` with anti-aliasing and
//! sub-pixel positioning; caption glyphs by `imageproc` with the
//! embedded DejaVu Sans Mono face.
//!
//! The canvas starts fully opaque, so the pixmap's premultiplied RGBA
//! equals straight RGBA and converts to an [`RgbaImage`] without an
//! un-premultiply pass.

use ab_glyph::FontRef;
use circlesweep_search::{Dimensions, GrayImage, Point, ScoredCandidate};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tiny_skia::{IntSize, LineCap, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::ExportError;

/// Colors and stroke sizes for [`annotate`]. Colors are straight RGBA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    /// Circle outline and circle-center marker.
    pub circle_color: [u8; 4],
    /// Image-center crosshair.
    pub crosshair_color: [u8; 4],
    /// Line from the image center to the circle center.
    pub line_color: [u8; 4],
    /// Stroke width in pixels.
    pub line_width: f32,
    /// Half-length of each crosshair arm in pixels.
    pub crosshair_size: f32,
    /// Caption glyphs.
    pub text_color: [u8; 4],
    /// Box behind the caption. Keep alpha below 255 to let the image
    /// show through.
    pub text_background: [u8; 4],
    /// Caption glyph height in pixels.
    pub text_size: f32,
}

impl AnnotationStyle {
    /// A style whose strokes scale with the image so they stay visible
    /// on large inputs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_dimensions(dimensions: Dimensions) -> Self {
        let short_side = dimensions.width.min(dimensions.height) as f32;
        Self {
            line_width: (short_side / 250.0).max(2.0),
            crosshair_size: (short_side / 20.0).max(10.0),
            text_size: (short_side / 30.0).max(12.0),
            ..Self::default()
        }
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            circle_color: [0, 255, 0, 255],
            crosshair_color: [255, 0, 0, 255],
            line_color: [255, 255, 0, 255],
            line_width: 2.0,
            crosshair_size: 10.0,
            text_color: [255, 255, 255, 255],
            text_background: [0, 0, 0, 160],
            text_size: 14.0,
        }
    }
}

const CAPTION_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Geometry of the top-left caption box.
struct CaptionLayout {
    padding: f32,
    line_height: f32,
    width: f32,
}

impl CaptionLayout {
    #[allow(clippy::cast_precision_loss)]
    fn measure(font: &FontRef<'_>, size: f32, lines: &[String]) -> Self {
        let widest = lines
            .iter()
            .map(|line| text_size(size, font, line).0)
            .max()
            .unwrap_or(0);
        let padding = (size / 3.0).round();
        Self {
            padding,
            line_height: size.ceil(),
            width: 2.0f32.mul_add(padding, widest as f32),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn height(&self, lines: usize) -> f32 {
        (lines as f32).mul_add(self.line_height, 2.0 * self.padding)
    }
}

/// Render `candidate` over a color copy of `image`, with `caption`
/// printed one line per row in the top-left corner.
///
/// Lines that run past the right edge are clipped. An empty caption
/// draws no box.
///
/// # Errors
///
/// Returns [`ExportError::Style`] for a non-positive stroke width or
/// text size, [`ExportError::Canvas`] when the image has a zero
/// dimension, and [`ExportError::Font`] if the embedded face fails to
/// parse.
#[allow(clippy::cast_possible_truncation)]
pub fn annotate(
    image: &GrayImage,
    candidate: &ScoredCandidate,
    caption: &[String],
    style: &AnnotationStyle,
) -> Result<RgbaImage, ExportError> {
    if !(style.line_width.is_finite() && style.line_width > 0.0) {
        return Err(ExportError::Style(format!(
            "line width must be > 0 (got {})",
            style.line_width
        )));
    }
    if !(style.text_size.is_finite() && style.text_size > 0.0) {
        return Err(ExportError::Style(format!(
            "text size must be > 0 (got {})",
            style.text_size
        )));
    }
    let font = FontRef::try_from_slice(CAPTION_FONT)?;

    let (width, height) = image.dimensions();
    let canvas = || ExportError::Canvas { width, height };
    let size = IntSize::from_wh(width, height).ok_or_else(canvas)?;

    let data: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[0], p[0], p[0], u8::MAX])
        .collect();
    let mut pixmap = Pixmap::from_vec(data, size).ok_or_else(canvas)?;

    let stroke = Stroke {
        width: style.line_width,
        line_cap: LineCap::Round,
        ..Stroke::default()
    };
    let image_center = Dimensions { width, height }.center();
    let circle = candidate.circle;

    let mut draw = |path: Option<Path>, color: [u8; 4]| {
        if let Some(path) = path {
            pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
        }
    };

    draw(
        PathBuilder::from_circle(
            circle.center.x as f32,
            circle.center.y as f32,
            circle.radius as f32,
        ),
        style.circle_color,
    );
    draw(segment(image_center, circle.center), style.line_color);
    draw(
        crosshair(circle.center, style.crosshair_size / 2.0),
        style.circle_color,
    );
    draw(
        crosshair(image_center, style.crosshair_size),
        style.crosshair_color,
    );

    let layout = CaptionLayout::measure(&font, style.text_size, caption);
    if !caption.is_empty()
        && let Some(rect) = Rect::from_xywh(0.0, 0.0, layout.width, layout.height(caption.len()))
    {
        pixmap.fill_rect(rect, &paint(style.text_background), Transform::identity(), None);
    }

    let mut out =
        RgbaImage::from_raw(width, height, pixmap.data().to_vec()).ok_or_else(canvas)?;
    let x = layout.padding as i32;
    let mut y = layout.padding;
    for line in caption {
        draw_text_mut(
            &mut out,
            Rgba(style.text_color),
            x,
            y as i32,
            style.text_size,
            &font,
            line,
        );
        y += layout.line_height;
    }
    Ok(out)
}

fn paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    let [r, g, b, a] = color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

#[allow(clippy::cast_possible_truncation)]
fn segment(from: Point, to: Point) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x as f32, from.y as f32);
    pb.line_to(to.x as f32, to.y as f32);
    pb.finish()
}

#[allow(clippy::cast_possible_truncation)]
fn crosshair(at: Point, arm: f32) -> Option<Path> {
    let (x, y) = (at.x as f32, at.y as f32);
    let mut pb = PathBuilder::new();
    pb.move_to(x - arm, y);
    pb.line_to(x + arm, y);
    pb.move_to(x, y - arm);
    pb.line_to(x, y + arm);
    pb.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use circlesweep_search::{DetectedCircle, ParameterCombination};
    use image::Luma;

    use crate::caption_lines;

    use super::*;

    fn candidate(x: f64, y: f64, radius: f64) -> ScoredCandidate {
        ScoredCandidate {
            circle: DetectedCircle::new(Point::new(x, y), radius),
            parameters: ParameterCombination::new(100.0, 50.0),
            size_difference: 0.0,
            center_distance: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn output_matches_input_size() {
        let image = GrayImage::new(120, 80);
        let out = annotate(&image, &candidate(60.0, 40.0, 20.0), &[], &AnnotationStyle::default())
            .unwrap();
        assert_eq!(out.dimensions(), (120, 80));
    }

    #[test]
    fn draws_circle_and_crosshair() {
        let image = GrayImage::new(100, 100);
        let out = annotate(&image, &candidate(50.0, 50.0, 30.0), &[], &AnnotationStyle::default())
            .unwrap();

        // On the circle outline, right of center.
        let on_circle = out.get_pixel(80, 50);
        assert!(on_circle[1] > 200 && on_circle[0] < 60, "{on_circle:?}");

        // Image-center crosshair is drawn last.
        let at_center = out.get_pixel(50, 50);
        assert!(at_center[0] > 200 && at_center[1] < 60, "{at_center:?}");

        // Far corner untouched.
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn keeps_source_intensity() {
        let image = GrayImage::from_pixel(64, 64, Luma([128]));
        let out = annotate(&image, &candidate(32.0, 32.0, 10.0), &[], &AnnotationStyle::default())
            .unwrap();
        assert_eq!(*out.get_pixel(1, 62), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn connecting_line_reaches_off_center_circle() {
        let image = GrayImage::new(100, 100);
        let out = annotate(&image, &candidate(80.0, 50.0, 10.0), &[], &AnnotationStyle::default())
            .unwrap();
        // Between the two crosshairs on the connecting line.
        let on_line = out.get_pixel(65, 50);
        assert!(on_line[0] > 200 && on_line[1] > 200 && on_line[2] < 60, "{on_line:?}");
    }

    #[test]
    fn degenerate_circle_still_renders() {
        let image = GrayImage::new(40, 40);
        let out = annotate(&image, &candidate(20.0, 20.0, 0.0), &[], &AnnotationStyle::default());
        assert!(out.is_ok());
    }

    #[test]
    fn empty_image_is_an_error() {
        let result = annotate(
            &GrayImage::new(0, 10),
            &candidate(0.0, 0.0, 1.0),
            &[],
            &AnnotationStyle::default(),
        );
        assert!(matches!(result, Err(ExportError::Canvas { .. })));
    }

    #[test]
    fn zero_line_width_is_rejected() {
        let style = AnnotationStyle {
            line_width: 0.0,
            ..AnnotationStyle::default()
        };
        let result = annotate(&GrayImage::new(10, 10), &candidate(5.0, 5.0, 2.0), &[], &style);
        assert!(matches!(result, Err(ExportError::Style(_))));
    }

    #[test]
    fn zero_text_size_is_rejected() {
        let style = AnnotationStyle {
            text_size: 0.0,
            ..AnnotationStyle::default()
        };
        let result = annotate(&GrayImage::new(10, 10), &candidate(5.0, 5.0, 2.0), &[], &style);
        assert!(matches!(result, Err(ExportError::Style(ref m)) if m.contains("text size")));
    }

    #[test]
    fn caption_is_printed_on_the_image() {
        let image = GrayImage::from_pixel(300, 200, Luma([128]));
        let winner = candidate(200.0, 120.0, 30.0);
        let caption = caption_lines(&winner, 60.0);
        let out = annotate(&image, &winner, &caption, &AnnotationStyle::default()).unwrap();

        // Shaded box in the corner.
        let background = out.get_pixel(1, 1)[0];
        assert!(background < 100, "{background}");

        // Glyphs of the first line stand out from the box.
        let brightest = (0..150)
            .flat_map(|x| (0..20).map(move |y| (x, y)))
            .map(|(x, y)| out.get_pixel(x, y)[0])
            .max()
            .unwrap();
        assert!(brightest > background + 80, "{brightest} vs {background}");

        // Below the caption and away from the drawing, the source shows.
        assert_eq!(*out.get_pixel(295, 190), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn caption_differs_between_candidates() {
        let image = GrayImage::from_pixel(300, 200, Luma([128]));
        let render = |canny: f64| {
            let mut winner = candidate(150.0, 100.0, 30.0);
            winner.parameters = ParameterCombination::new(canny, 50.0);
            let caption = caption_lines(&winner, 60.0);
            annotate(&image, &winner, &caption, &AnnotationStyle::default()).unwrap()
        };
        assert_ne!(render(90.0), render(110.0));
    }

    #[test]
    fn empty_caption_draws_no_box() {
        let image = GrayImage::from_pixel(100, 100, Luma([128]));
        let out = annotate(&image, &candidate(50.0, 50.0, 30.0), &[], &AnnotationStyle::default())
            .unwrap();
        assert_eq!(*out.get_pixel(1, 1), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn style_scales_with_image() {
        let small = AnnotationStyle::for_dimensions(Dimensions {
            width: 100,
            height: 100,
        });
        let large = AnnotationStyle::for_dimensions(Dimensions {
            width: 4000,
            height: 3000,
        });
        assert!((small.line_width - 2.0).abs() < f32::EPSILON);
        assert!(large.line_width > small.line_width);
        assert!(large.crosshair_size > small.crosshair_size);
    }
}
