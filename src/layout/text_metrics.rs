//! Text Metrics
//!
//! Intrinsic sizing for text-bearing leaf nodes.
//!
//! Glyph shaping belongs to the toolkit; here text is measured on a fixed
//! advance grid, one advance per display column as reported by
//! `unicode-width` (CJK and emoji take two columns). That is enough for the
//! layout engine to size leaves before the toolkit renders them.

use taffy::{AvailableSpace, Size};
use unicode_width::UnicodeWidthChar;

/// Advance of one display column, as a fraction of the font size.
const ADVANCE_RATIO: f32 = 0.5;

/// Default line height, as a multiple of the font size.
const LINE_HEIGHT_RATIO: f32 = 1.25;

/// Display width of a character in columns (control characters are 0).
fn char_columns(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Display width of a single line of text in columns.
pub fn string_width(s: &str) -> usize {
    s.chars().map(char_columns).sum()
}

/// Width of the widest line in columns.
pub fn widest_line(text: &str) -> usize {
    text.lines().map(string_width).max().unwrap_or(0)
}

/// Number of lines `text` occupies when wrapped at `max_columns`.
///
/// Explicit newlines always break. Returns 0 for empty text.
pub fn line_count(text: &str, max_columns: usize) -> usize {
    if text.is_empty() {
        return 0;
    }
    if max_columns == 0 {
        return text.lines().count().max(1);
    }

    let mut lines = 0usize;
    let mut current = 0usize;

    for c in text.chars() {
        if c == '\n' {
            lines += 1;
            current = 0;
            continue;
        }

        let width = char_columns(c);
        if current + width > max_columns && current > 0 {
            lines += 1;
            current = width;
        } else {
            current += width;
        }
    }

    if current > 0 || lines == 0 {
        lines += 1;
    }

    lines
}

/// Font parameters and content of a text leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub content: String,
    pub font_size: f32,
    pub line_height: Option<f32>,
    /// Extra space around the text, horizontal and vertical, per side.
    pub inset: (f32, f32),
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 14.0,
            line_height: None,
            inset: (0.0, 0.0),
        }
    }
}

impl TextBlock {
    pub fn advance(&self) -> f32 {
        self.font_size * ADVANCE_RATIO
    }

    pub fn line_height(&self) -> f32 {
        self.line_height.unwrap_or(self.font_size * LINE_HEIGHT_RATIO)
    }

    /// Measure callback body for the layout engine.
    pub fn measure(
        &self,
        known_dimensions: Size<Option<f32>>,
        available_space: Size<AvailableSpace>,
    ) -> Size<f32> {
        let (inset_x, inset_y) = self.inset;
        let advance = self.advance();

        let natural_columns = widest_line(&self.content);
        let max_columns = match known_dimensions.width {
            Some(w) => ((w - 2.0 * inset_x).max(0.0) / advance).floor() as usize,
            None => match available_space.width {
                AvailableSpace::Definite(w) => ((w - 2.0 * inset_x).max(0.0) / advance).floor() as usize,
                AvailableSpace::MinContent => self
                    .content
                    .split_whitespace()
                    .map(string_width)
                    .max()
                    .unwrap_or(0),
                AvailableSpace::MaxContent => natural_columns,
            },
        };

        let columns = natural_columns.min(max_columns.max(1));
        let lines = line_count(&self.content, max_columns.max(1));

        let width = if self.content.is_empty() {
            2.0 * inset_x
        } else {
            columns as f32 * advance + 2.0 * inset_x
        };
        let height = lines as f32 * self.line_height() + 2.0 * inset_y;

        Size {
            width: known_dimensions.width.unwrap_or(width),
            height: known_dimensions.height.unwrap_or(height),
        }
    }
}
