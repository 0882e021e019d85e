//! Snapshots - render an element or the whole window to an image file.
//!
//! Pixels come from a [`SnapshotSource`]. In a windowed host that is the
//! toolkit's grab; [`Rasterizer`] paints element boxes with their
//! `backgroundColor` and is used when no toolkit source is installed.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use serde_json::{json, Value};

use crate::element::{ElementId, ElementTree};
use crate::error::SnapshotError;
use crate::types::{json_f32, Point, PropMap};

/// Largest width or height a snapshot is rendered or resized to.
pub const MAX_SNAPSHOT_SIDE: u32 = 8192;

/// Reject sizes past [`MAX_SNAPSHOT_SIDE`] on either side.
pub fn check_size(width: u32, height: u32) -> Result<(), SnapshotError> {
    if width > MAX_SNAPSHOT_SIDE || height > MAX_SNAPSHOT_SIDE {
        return Err(SnapshotError::TooLarge {
            width,
            height,
            max: MAX_SNAPSHOT_SIDE,
        });
    }
    Ok(())
}

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Png,
    Jpeg,
}

/// Parsed `takeSnapshot` options.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOptions {
    pub format: SnapshotFormat,
    /// File extension, as requested (`"jpg"` and `"jpeg"` are both kept).
    pub extension: String,
    /// Output size; only set when both width and height were given.
    pub size: Option<(u32, u32)>,
    /// 1..=100
    pub quality: u8,
}

impl SnapshotOptions {
    pub fn from_props(options: &PropMap, default_format: &str) -> Result<Self, SnapshotError> {
        let extension = options
            .get("format")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .unwrap_or(default_format)
            .to_ascii_lowercase();

        let format = match extension.as_str() {
            "png" => SnapshotFormat::Png,
            "jpg" | "jpeg" => SnapshotFormat::Jpeg,
            other => return Err(SnapshotError::UnsupportedFormat(other.to_string())),
        };

        let dimension = |key: &str| options.get(key).and_then(json_f32).map(|v| v.max(0.0) as u32);
        let size = match (dimension("width"), dimension("height")) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        };
        if let Some((width, height)) = size {
            check_size(width, height)?;
        }

        let quality = options
            .get("quality")
            .and_then(json_f32)
            .map(|q| (q * 100.0).round().clamp(1.0, 100.0) as u8)
            .unwrap_or(100);

        Ok(Self {
            format,
            extension,
            size,
            quality,
        })
    }
}

/// Produces the pixels of an element subtree.
pub trait SnapshotSource {
    /// Render `target` and its descendants into a `width` x `height` image
    /// with `target`'s top-left corner at the origin.
    fn render(&self, elements: &ElementTree, target: ElementId, width: u32, height: u32) -> RgbaImage;
}

/// Software renderer that fills element frames with their background color.
#[derive(Debug, Default)]
pub struct Rasterizer;

impl Rasterizer {
    fn paint(&self, elements: &ElementTree, id: ElementId, origin: Point, canvas: &mut RgbaImage) {
        let Some(element) = elements.get(id) else {
            return;
        };

        if let Some(color) = element.props.get("backgroundColor").and_then(parse_color) {
            fill_rect(canvas, origin, element.frame.width, element.frame.height, color);
        }

        for &child in &element.children {
            if let Some(c) = elements.get(child) {
                self.paint(elements, child, origin + c.frame.origin(), canvas);
            }
        }
    }
}

impl SnapshotSource for Rasterizer {
    fn render(&self, elements: &ElementTree, target: ElementId, width: u32, height: u32) -> RgbaImage {
        let mut canvas = RgbaImage::new(width.max(1), height.max(1));
        self.paint(elements, target, Point::default(), &mut canvas);
        canvas
    }
}

fn fill_rect(canvas: &mut RgbaImage, origin: Point, width: f32, height: f32, color: Rgba<u8>) {
    let x0 = origin.x.max(0.0).round() as u32;
    let y0 = origin.y.max(0.0).round() as u32;
    let x1 = ((origin.x + width).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((origin.y + height).round().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let dst = canvas.get_pixel_mut(x, y);
            *dst = blend(*dst, color);
        }
    }
}

/// Source-over blend of `src` onto `dst`.
fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |i: usize| {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        c.round() as u8
    };
    Rgba([channel(0), channel(1), channel(2), (out_a * 255.0).round() as u8])
}

/// Parse a color prop: `0xAARRGGBB` integers, or `#rgb`, `#rrggbb`, `#rrggbbaa`.
pub fn parse_color(value: &Value) -> Option<Rgba<u8>> {
    match value {
        Value::Number(n) => {
            let argb = n.as_u64()? as u32;
            let [a, r, g, b] = argb.to_be_bytes();
            Some(Rgba([r, g, b, a]))
        }
        Value::String(s) => {
            let hex = s.strip_prefix('#')?;
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            match hex.len() {
                3 => {
                    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok().map(|v| v * 17);
                    Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255]))
                }
                6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
                8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Resize per `options` and write to a new file in `directory`.
///
/// The file is kept on disk; the caller owns its lifetime.
pub fn save_snapshot(image: RgbaImage, options: &SnapshotOptions, directory: &Path) -> Result<PathBuf, SnapshotError> {
    let mut image = DynamicImage::ImageRgba8(image);
    if let Some((width, height)) = options.size {
        image = image.resize_exact(width, height, FilterType::Triangle);
    }

    let file = tempfile::Builder::new()
        .suffix(&format!(".{}", options.extension))
        .tempfile_in(directory)?;

    {
        let mut writer = BufWriter::new(file.as_file());
        match options.format {
            SnapshotFormat::Png => image.write_to(&mut writer, ImageOutputFormat::Png)?,
            SnapshotFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
                .write_to(&mut writer, ImageOutputFormat::Jpeg(options.quality))?,
        }
        writer.flush()?;
    }

    let (_, path) = file.keep().map_err(|err| SnapshotError::Io(err.error))?;
    Ok(path)
}

/// `file://` URL for a local path.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Rejection payload handed to the script side.
pub fn rejection(err: &SnapshotError) -> Value {
    let message = match err {
        SnapshotError::ViewNotFound => "Could not find view".to_string(),
        SnapshotError::UnsupportedFormat(_) | SnapshotError::TooLarge { .. } => err.to_string(),
        SnapshotError::Image(_) | SnapshotError::Io(_) => "Unable to save image to file".to_string(),
    };
    json!({ "error": message })
}

/// Open a saved snapshot, for inspection.
pub fn load_snapshot(path: &Path) -> Result<DynamicImage, SnapshotError> {
    let file = File::open(path)?;
    let reader = image::io::Reader::new(std::io::BufReader::new(file)).with_guessed_format()?;
    Ok(reader.decode()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::layout::GeometrySink;
    use crate::types::Frame;
    use image::GenericImageView;

    fn options(value: Value) -> PropMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_options_defaults() {
        let opts = SnapshotOptions::from_props(&PropMap::new(), "png").unwrap();
        assert_eq!(opts.format, SnapshotFormat::Png);
        assert_eq!(opts.extension, "png");
        assert_eq!(opts.size, None);
        assert_eq!(opts.quality, 100);
    }

    #[test]
    fn test_options_parse() {
        let opts = SnapshotOptions::from_props(
            &options(json!({"format": "jpg", "width": 20, "height": 10, "quality": 0.5})),
            "png",
        )
        .unwrap();
        assert_eq!(opts.format, SnapshotFormat::Jpeg);
        assert_eq!(opts.extension, "jpg");
        assert_eq!(opts.size, Some((20, 10)));
        assert_eq!(opts.quality, 50);

        // Resize needs both dimensions
        let opts = SnapshotOptions::from_props(&options(json!({"width": 20})), "png").unwrap();
        assert_eq!(opts.size, None);
    }

    #[test]
    fn test_options_unsupported_format() {
        let err = SnapshotOptions::from_props(&options(json!({"format": "gif"})), "png").unwrap_err();
        assert!(matches!(err, SnapshotError::UnsupportedFormat(ref f) if f == "gif"));
    }

    #[test]
    fn test_options_size_limit() {
        let opts = SnapshotOptions::from_props(&options(json!({"width": 8192, "height": 1})), "png").unwrap();
        assert_eq!(opts.size, Some((8192, 1)));

        let err = SnapshotOptions::from_props(&options(json!({"width": 20, "height": 8193})), "png").unwrap_err();
        assert!(matches!(err, SnapshotError::TooLarge { width: 20, height: 8193, max: 8192 }));
        assert_eq!(
            rejection(&err),
            json!({"error": "Snapshot size 20x8193 exceeds the 8192px limit"})
        );
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color(&json!("#ff0000")), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color(&json!("#0f0")), Some(Rgba([0, 255, 0, 255])));
        assert_eq!(parse_color(&json!("#0000ff80")), Some(Rgba([0, 0, 255, 128])));
        assert_eq!(parse_color(&json!(0xff00ff00u32)), Some(Rgba([0, 255, 0, 255])));
        assert_eq!(parse_color(&json!("red")), None);
    }

    #[test]
    fn test_rasterizer_paints_children() {
        let mut elements = ElementTree::new();
        let root = elements.allocate(Element::new(1, "RCTView", "RCTViewManager"));
        let child = elements.allocate(Element::new(2, "RCTView", "RCTViewManager"));
        elements.insert_child(root, child, 0);
        elements.apply_geometry(root, Frame::new(0.0, 0.0, 4.0, 4.0));
        elements.apply_geometry(child, Frame::new(2.0, 2.0, 2.0, 2.0));
        elements.get_mut(root).unwrap().props.insert("backgroundColor".into(), json!("#ffffff"));
        elements.get_mut(child).unwrap().props.insert("backgroundColor".into(), json!("#ff0000"));

        let image = Rasterizer.render(&elements, root, 4, 4);

        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(3, 3), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_save_png_and_resize() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SnapshotOptions::from_props(&options(json!({"width": 2, "height": 3})), "png").unwrap();

        let path = save_snapshot(RgbaImage::new(8, 8), &opts, dir.path()).unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(load_snapshot(&path).unwrap().dimensions(), (2, 3));
        assert!(file_url(&path).starts_with("file:///"));
    }

    #[test]
    fn test_save_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SnapshotOptions::from_props(&options(json!({"format": "jpeg", "quality": 0.8})), "png").unwrap();

        let path = save_snapshot(RgbaImage::new(4, 4), &opts, dir.path()).unwrap();

        assert_eq!(path.extension().unwrap(), "jpeg");
        assert_eq!(load_snapshot(&path).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let opts = SnapshotOptions::from_props(&PropMap::new(), "png").unwrap();

        let err = save_snapshot(RgbaImage::new(1, 1), &opts, &missing).unwrap_err();
        assert_eq!(rejection(&err), json!({"error": "Unable to save image to file"}));
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(rejection(&SnapshotError::ViewNotFound), json!({"error": "Could not find view"}));
    }
}
