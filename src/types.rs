//! Core types for spark-host.
//!
//! Tags, geometry, property maps and the style keyword tables the layout
//! wrapper translates into engine values.

use serde_json::{Map, Value};

// =============================================================================
// Identity
// =============================================================================

/// Integer handle identifying one visual element across the bridge boundary.
pub type Tag = i64;

/// Property bag sent from the script side with `createView`/`updateView`.
pub type PropMap = Map<String, Value>;

// =============================================================================
// Geometry
// =============================================================================

/// Position and size of a visual element, relative to its visual parent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Check whether a point in the parent's coordinate space falls inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A point in some element's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// =============================================================================
// Style keywords
// =============================================================================

/// A symbolic style value with a fixed keyword lookup table.
///
/// Lookups that miss fall back to `Default`, which is always the zero value
/// of the corresponding engine enum.
pub trait StyleKeyword: Copy + Default + PartialEq + 'static {
    const TABLE: &'static [(&'static str, Self)];

    /// Resolve a keyword, `None` if the table has no entry for it.
    fn parse_keyword(value: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(keyword, _)| *keyword == value)
            .map(|(_, parsed)| *parsed)
    }

    /// Keyword for this value, empty when the value has no spelling.
    fn keyword(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, value)| *value == self)
            .map(|(keyword, _)| *keyword)
            .unwrap_or("")
    }
}

/// Main axis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FlexDirection {
    #[default]
    Column = 0,
    ColumnReverse = 1,
    Row = 2,
    RowReverse = 3,
}

impl FlexDirection {
    /// Check if this is a row direction (Row or RowReverse).
    pub const fn is_row(&self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }
}

impl StyleKeyword for FlexDirection {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("row", Self::Row),
        ("row-reverse", Self::RowReverse),
        ("column", Self::Column),
        ("column-reverse", Self::ColumnReverse),
    ];
}

/// Main axis distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Justify {
    #[default]
    FlexStart = 0,
    Center = 1,
    FlexEnd = 2,
    SpaceBetween = 3,
    SpaceAround = 4,
}

impl StyleKeyword for Justify {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("flex-start", Self::FlexStart),
        ("flex-end", Self::FlexEnd),
        ("center", Self::Center),
        ("space-between", Self::SpaceBetween),
        ("space-around", Self::SpaceAround),
    ];
}

/// Cross axis alignment, shared by alignItems, alignSelf and alignContent.
///
/// `Auto` has no keyword; it is what unknown keywords resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Align {
    #[default]
    Auto = 0,
    FlexStart = 1,
    Center = 2,
    FlexEnd = 3,
    Stretch = 4,
    Baseline = 5,
    SpaceBetween = 6,
    SpaceAround = 7,
}

impl StyleKeyword for Align {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("flex-start", Self::FlexStart),
        ("flex-end", Self::FlexEnd),
        ("center", Self::Center),
        ("stretch", Self::Stretch),
        ("baseline", Self::Baseline),
        ("space-between", Self::SpaceBetween),
        ("space-around", Self::SpaceAround),
    ];
}

/// Flex line wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FlexWrap {
    #[default]
    NoWrap = 0,
    Wrap = 1,
}

impl StyleKeyword for FlexWrap {
    const TABLE: &'static [(&'static str, Self)] =
        &[("wrap", Self::Wrap), ("nowrap", Self::NoWrap)];
}

/// Whether the node takes part in layout at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Display {
    #[default]
    Flex = 0,
    None = 1,
}

impl StyleKeyword for Display {
    const TABLE: &'static [(&'static str, Self)] =
        &[("none", Self::None), ("flex", Self::Flex)];
}

/// Content overflow behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Overflow {
    #[default]
    Visible = 0,
    Hidden = 1,
    Scroll = 2,
}

impl StyleKeyword for Overflow {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("visible", Self::Visible),
        ("hidden", Self::Hidden),
        ("scroll", Self::Scroll),
    ];
}

/// Positioning scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PositionType {
    #[default]
    Relative = 0,
    Absolute = 1,
}

impl StyleKeyword for PositionType {
    const TABLE: &'static [(&'static str, Self)] =
        &[("relative", Self::Relative), ("absolute", Self::Absolute)];
}

/// Writing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Direction {
    #[default]
    Inherit = 0,
    Ltr = 1,
    Rtl = 2,
}

impl StyleKeyword for Direction {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("inherit", Self::Inherit),
        ("ltr", Self::Ltr),
        ("rtl", Self::Rtl),
    ];
}

/// Read a JSON number as `f32`, accepting integers.
pub fn json_f32(value: &Value) -> Option<f32> {
    value.as_f64().map(|v| v as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(FlexDirection::parse_keyword("row-reverse"), Some(FlexDirection::RowReverse));
        assert_eq!(Justify::parse_keyword("space-around"), Some(Justify::SpaceAround));
        assert_eq!(Align::parse_keyword("baseline"), Some(Align::Baseline));
        assert_eq!(Direction::parse_keyword("rtl"), Some(Direction::Rtl));
        assert_eq!(FlexWrap::parse_keyword("diagonal"), None);
    }

    #[test]
    fn test_overflow_hidden_spelling() {
        assert_eq!(Overflow::parse_keyword("hidden"), Some(Overflow::Hidden));
        assert_eq!(Overflow::parse_keyword("hidde"), None);
    }

    #[test]
    fn test_keyword_spelling() {
        assert_eq!(PositionType::Absolute.keyword(), "absolute");
        assert_eq!(Align::Auto.keyword(), "");
        assert_eq!(Display::default(), Display::Flex);
    }

    #[test]
    fn test_frame_contains() {
        let frame = Frame::new(10.0, 10.0, 20.0, 5.0);
        assert!(frame.contains(Point::new(10.0, 10.0)));
        assert!(frame.contains(Point::new(29.0, 14.0)));
        assert!(!frame.contains(Point::new(30.0, 10.0)));
        assert!(!frame.contains(Point::new(9.0, 12.0)));
    }
}
