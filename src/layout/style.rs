//! Style properties - names, values, and their translation onto Taffy styles.
//!
//! Script-side style keys arrive as strings (`"flexDirection"`, `"marginTop"`)
//! with JSON values. This module resolves the key to a [`StyleProperty`],
//! normalizes the value to a [`StyleValue`], and writes the result onto a
//! Taffy [`Style`].

use serde_json::Value;
use taffy::{
    AlignContent as TaffyAlignContent, AlignItems as TaffyAlignItems, Dimension as TaffyDimension,
    Display as TaffyDisplay, FlexDirection as TaffyFlexDirection, FlexWrap as TaffyFlexWrap,
    JustifyContent as TaffyJustifyContent, LengthPercentage, LengthPercentageAuto,
    Overflow as TaffyOverflow, Position as TaffyPosition, Style,
};

use crate::types::{
    Align, Display, FlexDirection, FlexWrap, Justify, Overflow, PositionType, StyleKeyword,
};

// =============================================================================
// Property names
// =============================================================================

/// Every style key the layout wrapper understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    // Keywords
    FlexDirection,
    JustifyContent,
    AlignItems,
    AlignContent,
    AlignSelf,
    FlexWrap,
    Display,
    Overflow,
    Position,
    Direction,

    // Dimensions
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,

    // Margin
    Margin,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    MarginHorizontal,
    MarginVertical,

    // Padding
    Padding,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    PaddingHorizontal,
    PaddingVertical,

    // Border
    BorderWidth,
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,

    // Flex item
    Flex,
    FlexGrow,
    FlexShrink,
    FlexBasis,
    AspectRatio,

    // Insets
    Top,
    Right,
    Bottom,
    Left,
}

impl StyleProperty {
    /// Resolve a script-side style key.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "flexDirection" => Self::FlexDirection,
            "justifyContent" => Self::JustifyContent,
            "alignItems" => Self::AlignItems,
            "alignContent" => Self::AlignContent,
            "alignSelf" => Self::AlignSelf,
            "flexWrap" => Self::FlexWrap,
            "display" => Self::Display,
            "overflow" => Self::Overflow,
            "position" => Self::Position,
            "direction" => Self::Direction,
            "width" => Self::Width,
            "height" => Self::Height,
            "minWidth" => Self::MinWidth,
            "maxWidth" => Self::MaxWidth,
            "minHeight" => Self::MinHeight,
            "maxHeight" => Self::MaxHeight,
            "margin" => Self::Margin,
            "marginTop" => Self::MarginTop,
            "marginRight" => Self::MarginRight,
            "marginBottom" => Self::MarginBottom,
            "marginLeft" => Self::MarginLeft,
            "marginHorizontal" => Self::MarginHorizontal,
            "marginVertical" => Self::MarginVertical,
            "padding" => Self::Padding,
            "paddingTop" => Self::PaddingTop,
            "paddingRight" => Self::PaddingRight,
            "paddingBottom" => Self::PaddingBottom,
            "paddingLeft" => Self::PaddingLeft,
            "paddingHorizontal" => Self::PaddingHorizontal,
            "paddingVertical" => Self::PaddingVertical,
            "borderWidth" => Self::BorderWidth,
            "borderTopWidth" => Self::BorderTopWidth,
            "borderRightWidth" => Self::BorderRightWidth,
            "borderBottomWidth" => Self::BorderBottomWidth,
            "borderLeftWidth" => Self::BorderLeftWidth,
            "flex" => Self::Flex,
            "flexGrow" => Self::FlexGrow,
            "flexShrink" => Self::FlexShrink,
            "flexBasis" => Self::FlexBasis,
            "aspectRatio" => Self::AspectRatio,
            "top" => Self::Top,
            "right" => Self::Right,
            "bottom" => Self::Bottom,
            "left" => Self::Left,
            _ => return None,
        })
    }

    /// Whether the value is a symbolic keyword rather than a number.
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::FlexDirection
                | Self::JustifyContent
                | Self::AlignItems
                | Self::AlignContent
                | Self::AlignSelf
                | Self::FlexWrap
                | Self::Display
                | Self::Overflow
                | Self::Position
                | Self::Direction
        )
    }
}

// =============================================================================
// Values
// =============================================================================

/// A normalized style value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Reset to the engine default.
    Undefined,
    Auto,
    Points(f32),
    Percent(f32),
    Keyword(String),
}

impl StyleValue {
    /// Normalize a JSON prop value.
    ///
    /// Numbers are points, `"NN%"` strings are percentages, `"auto"` is auto,
    /// `null` resets, any other string is kept as a keyword.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Undefined,
            Value::Number(n) => n
                .as_f64()
                .map(|v| Self::Points(v as f32))
                .unwrap_or(Self::Undefined),
            Value::String(s) => Self::from_str_value(s),
            _ => Self::Undefined,
        }
    }

    fn from_str_value(s: &str) -> Self {
        if s == "auto" {
            return Self::Auto;
        }
        if let Some(percent) = s.strip_suffix('%') {
            if let Ok(p) = percent.trim().parse::<f32>() {
                return Self::Percent(p);
            }
        }
        Self::Keyword(s.to_string())
    }

    pub fn keyword(value: &str) -> Self {
        Self::Keyword(value.to_string())
    }

    fn as_keyword(&self) -> &str {
        match self {
            Self::Keyword(k) => k,
            _ => "",
        }
    }

    fn as_number(&self) -> Option<f32> {
        match self {
            Self::Points(p) => Some(*p),
            _ => None,
        }
    }
}

impl From<f32> for StyleValue {
    fn from(value: f32) -> Self {
        Self::Points(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::from_str_value(value)
    }
}

// =============================================================================
// Engine defaults
// =============================================================================

/// Style every new node starts from.
///
/// Column direction, no shrink and flex-start line packing, so that unset
/// attributes behave like the flexbox dialect the script side targets.
pub fn base_style() -> Style {
    Style {
        display: TaffyDisplay::Flex,
        flex_direction: TaffyFlexDirection::Column,
        flex_shrink: 0.0,
        align_content: Some(TaffyAlignContent::FlexStart),
        ..Default::default()
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Resolve a keyword through its table, falling back to the zero value.
fn resolve_keyword<K: StyleKeyword + std::fmt::Debug>(property: StyleProperty, value: &StyleValue) -> K {
    let keyword = value.as_keyword();
    match K::parse_keyword(keyword) {
        Some(parsed) => parsed,
        None => {
            if !matches!(value, StyleValue::Undefined) {
                tracing::warn!(
                    target: "layout",
                    ?property,
                    keyword,
                    fallback = ?K::default(),
                    "unknown style keyword"
                );
            }
            K::default()
        }
    }
}

fn to_dimension(value: &StyleValue, default: TaffyDimension) -> TaffyDimension {
    match value {
        StyleValue::Points(p) => TaffyDimension::Length(*p),
        StyleValue::Percent(p) => TaffyDimension::Percent(*p / 100.0),
        StyleValue::Auto => TaffyDimension::Auto,
        _ => default,
    }
}

fn to_lpa(value: &StyleValue, default: LengthPercentageAuto) -> LengthPercentageAuto {
    match value {
        StyleValue::Points(p) => LengthPercentageAuto::Length(*p),
        StyleValue::Percent(p) => LengthPercentageAuto::Percent(*p / 100.0),
        StyleValue::Auto => LengthPercentageAuto::Auto,
        _ => default,
    }
}

fn to_lp(value: &StyleValue) -> LengthPercentage {
    match value {
        StyleValue::Points(p) => LengthPercentage::Length(*p),
        StyleValue::Percent(p) => LengthPercentage::Percent(*p / 100.0),
        _ => LengthPercentage::Length(0.0),
    }
}

fn to_taffy_flex_direction(dir: FlexDirection) -> TaffyFlexDirection {
    match dir {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn to_taffy_justify_content(justify: Justify) -> Option<TaffyJustifyContent> {
    Some(match justify {
        Justify::FlexStart => TaffyJustifyContent::FlexStart,
        Justify::Center => TaffyJustifyContent::Center,
        Justify::FlexEnd => TaffyJustifyContent::FlexEnd,
        Justify::SpaceBetween => TaffyJustifyContent::SpaceBetween,
        Justify::SpaceAround => TaffyJustifyContent::SpaceAround,
    })
}

/// alignItems / alignSelf. Distribution keywords have no item meaning and
/// behave like `auto`.
fn to_taffy_align_items(align: Align) -> Option<TaffyAlignItems> {
    match align {
        Align::Auto | Align::SpaceBetween | Align::SpaceAround => None,
        Align::FlexStart => Some(TaffyAlignItems::FlexStart),
        Align::Center => Some(TaffyAlignItems::Center),
        Align::FlexEnd => Some(TaffyAlignItems::FlexEnd),
        Align::Stretch => Some(TaffyAlignItems::Stretch),
        Align::Baseline => Some(TaffyAlignItems::Baseline),
    }
}

fn to_taffy_align_content(align: Align) -> Option<TaffyAlignContent> {
    Some(match align {
        Align::Auto | Align::FlexStart | Align::Baseline => TaffyAlignContent::FlexStart,
        Align::Center => TaffyAlignContent::Center,
        Align::FlexEnd => TaffyAlignContent::FlexEnd,
        Align::Stretch => TaffyAlignContent::Stretch,
        Align::SpaceBetween => TaffyAlignContent::SpaceBetween,
        Align::SpaceAround => TaffyAlignContent::SpaceAround,
    })
}

fn to_taffy_overflow(overflow: Overflow) -> TaffyOverflow {
    match overflow {
        Overflow::Visible => TaffyOverflow::Visible,
        Overflow::Hidden => TaffyOverflow::Hidden,
        Overflow::Scroll => TaffyOverflow::Scroll,
    }
}

// =============================================================================
// Application
// =============================================================================

/// Write one property onto a Taffy style.
///
/// `Direction` has no engine counterpart; it is cached by the caller only.
pub fn apply_style_property(style: &mut Style, property: StyleProperty, value: &StyleValue) {
    let base = base_style();

    match property {
        StyleProperty::FlexDirection => {
            style.flex_direction =
                to_taffy_flex_direction(resolve_keyword::<FlexDirection>(property, value));
        }
        StyleProperty::JustifyContent => {
            style.justify_content =
                to_taffy_justify_content(resolve_keyword::<Justify>(property, value));
        }
        StyleProperty::AlignItems => {
            style.align_items = to_taffy_align_items(resolve_keyword::<Align>(property, value));
        }
        StyleProperty::AlignSelf => {
            style.align_self = to_taffy_align_items(resolve_keyword::<Align>(property, value));
        }
        StyleProperty::AlignContent => {
            style.align_content = to_taffy_align_content(resolve_keyword::<Align>(property, value));
        }
        StyleProperty::FlexWrap => {
            style.flex_wrap = match resolve_keyword::<FlexWrap>(property, value) {
                FlexWrap::NoWrap => TaffyFlexWrap::NoWrap,
                FlexWrap::Wrap => TaffyFlexWrap::Wrap,
            };
        }
        StyleProperty::Display => {
            style.display = match resolve_keyword::<Display>(property, value) {
                Display::Flex => TaffyDisplay::Flex,
                Display::None => TaffyDisplay::None,
            };
        }
        StyleProperty::Overflow => {
            let overflow = to_taffy_overflow(resolve_keyword::<Overflow>(property, value));
            style.overflow = taffy::Point { x: overflow, y: overflow };
        }
        StyleProperty::Position => {
            style.position = match resolve_keyword::<PositionType>(property, value) {
                PositionType::Relative => TaffyPosition::Relative,
                PositionType::Absolute => TaffyPosition::Absolute,
            };
        }
        StyleProperty::Direction => {}

        StyleProperty::Width => style.size.width = to_dimension(value, base.size.width),
        StyleProperty::Height => style.size.height = to_dimension(value, base.size.height),
        StyleProperty::MinWidth => style.min_size.width = to_dimension(value, base.min_size.width),
        StyleProperty::MaxWidth => style.max_size.width = to_dimension(value, base.max_size.width),
        StyleProperty::MinHeight => {
            style.min_size.height = to_dimension(value, base.min_size.height)
        }
        StyleProperty::MaxHeight => {
            style.max_size.height = to_dimension(value, base.max_size.height)
        }

        StyleProperty::Margin => {
            let margin = to_lpa(value, LengthPercentageAuto::Length(0.0));
            style.margin.top = margin;
            style.margin.right = margin;
            style.margin.bottom = margin;
            style.margin.left = margin;
        }
        StyleProperty::MarginTop => style.margin.top = to_lpa(value, base.margin.top),
        StyleProperty::MarginRight => style.margin.right = to_lpa(value, base.margin.right),
        StyleProperty::MarginBottom => style.margin.bottom = to_lpa(value, base.margin.bottom),
        StyleProperty::MarginLeft => style.margin.left = to_lpa(value, base.margin.left),
        StyleProperty::MarginHorizontal => {
            let margin = to_lpa(value, LengthPercentageAuto::Length(0.0));
            style.margin.left = margin;
            style.margin.right = margin;
        }
        StyleProperty::MarginVertical => {
            let margin = to_lpa(value, LengthPercentageAuto::Length(0.0));
            style.margin.top = margin;
            style.margin.bottom = margin;
        }

        StyleProperty::Padding => {
            let padding = to_lp(value);
            style.padding.top = padding;
            style.padding.right = padding;
            style.padding.bottom = padding;
            style.padding.left = padding;
        }
        StyleProperty::PaddingTop => style.padding.top = to_lp(value),
        StyleProperty::PaddingRight => style.padding.right = to_lp(value),
        StyleProperty::PaddingBottom => style.padding.bottom = to_lp(value),
        StyleProperty::PaddingLeft => style.padding.left = to_lp(value),
        StyleProperty::PaddingHorizontal => {
            let padding = to_lp(value);
            style.padding.left = padding;
            style.padding.right = padding;
        }
        StyleProperty::PaddingVertical => {
            let padding = to_lp(value);
            style.padding.top = padding;
            style.padding.bottom = padding;
        }

        StyleProperty::BorderWidth => {
            let border = to_lp(value);
            style.border.top = border;
            style.border.right = border;
            style.border.bottom = border;
            style.border.left = border;
        }
        StyleProperty::BorderTopWidth => style.border.top = to_lp(value),
        StyleProperty::BorderRightWidth => style.border.right = to_lp(value),
        StyleProperty::BorderBottomWidth => style.border.bottom = to_lp(value),
        StyleProperty::BorderLeftWidth => style.border.left = to_lp(value),

        StyleProperty::Flex => apply_flex_shorthand(style, value.as_number()),
        StyleProperty::FlexGrow => style.flex_grow = value.as_number().unwrap_or(base.flex_grow),
        StyleProperty::FlexShrink => {
            style.flex_shrink = value.as_number().unwrap_or(base.flex_shrink)
        }
        StyleProperty::FlexBasis => style.flex_basis = to_dimension(value, base.flex_basis),
        StyleProperty::AspectRatio => style.aspect_ratio = value.as_number(),

        StyleProperty::Top => style.inset.top = to_lpa(value, base.inset.top),
        StyleProperty::Right => style.inset.right = to_lpa(value, base.inset.right),
        StyleProperty::Bottom => style.inset.bottom = to_lpa(value, base.inset.bottom),
        StyleProperty::Left => style.inset.left = to_lpa(value, base.inset.left),
    }
}

/// `flex: n` expands to grow/shrink/basis.
///
/// - `n > 0`: grow `n`, shrink 0, basis 0
/// - `n < 0`: grow 0, shrink `-n`, basis auto
/// - `0` or unset: grow 0, shrink 0, basis auto
fn apply_flex_shorthand(style: &mut Style, flex: Option<f32>) {
    match flex {
        Some(n) if n > 0.0 => {
            style.flex_grow = n;
            style.flex_shrink = 0.0;
            style.flex_basis = TaffyDimension::Length(0.0);
        }
        Some(n) if n < 0.0 => {
            style.flex_grow = 0.0;
            style.flex_shrink = -n;
            style.flex_basis = TaffyDimension::Auto;
        }
        _ => {
            style.flex_grow = 0.0;
            style.flex_shrink = 0.0;
            style.flex_basis = TaffyDimension::Auto;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_names() {
        assert_eq!(StyleProperty::from_name("flexDirection"), Some(StyleProperty::FlexDirection));
        assert_eq!(StyleProperty::from_name("borderLeftWidth"), Some(StyleProperty::BorderLeftWidth));
        assert_eq!(StyleProperty::from_name("backgroundColor"), None);
        assert!(StyleProperty::Overflow.is_keyword());
        assert!(!StyleProperty::Width.is_keyword());
    }

    #[test]
    fn test_value_normalization() {
        assert_eq!(StyleValue::from_json(&json!(12)), StyleValue::Points(12.0));
        assert_eq!(StyleValue::from_json(&json!("50%")), StyleValue::Percent(50.0));
        assert_eq!(StyleValue::from_json(&json!("auto")), StyleValue::Auto);
        assert_eq!(StyleValue::from_json(&json!("row")), StyleValue::keyword("row"));
        assert_eq!(StyleValue::from_json(&Value::Null), StyleValue::Undefined);
    }

    #[test]
    fn test_keyword_application() {
        let mut style = base_style();

        apply_style_property(&mut style, StyleProperty::FlexDirection, &"row".into());
        assert_eq!(style.flex_direction, TaffyFlexDirection::Row);

        apply_style_property(&mut style, StyleProperty::JustifyContent, &"space-between".into());
        assert_eq!(style.justify_content, Some(TaffyJustifyContent::SpaceBetween));

        apply_style_property(&mut style, StyleProperty::AlignItems, &"center".into());
        assert_eq!(style.align_items, Some(TaffyAlignItems::Center));

        apply_style_property(&mut style, StyleProperty::Overflow, &"hidden".into());
        assert_eq!(style.overflow.x, TaffyOverflow::Hidden);

        apply_style_property(&mut style, StyleProperty::Position, &"absolute".into());
        assert_eq!(style.position, TaffyPosition::Absolute);

        apply_style_property(&mut style, StyleProperty::Display, &"none".into());
        assert_eq!(style.display, TaffyDisplay::None);
    }

    #[test]
    fn test_unknown_keyword_uses_zero_value() {
        let mut style = base_style();
        apply_style_property(&mut style, StyleProperty::FlexDirection, &"row".into());
        apply_style_property(&mut style, StyleProperty::FlexDirection, &"diagonal".into());
        assert_eq!(style.flex_direction, TaffyFlexDirection::Column);

        apply_style_property(&mut style, StyleProperty::Overflow, &"hidde".into());
        assert_eq!(style.overflow.x, TaffyOverflow::Visible);
    }

    #[test]
    fn test_edges() {
        let mut style = base_style();
        apply_style_property(&mut style, StyleProperty::Margin, &StyleValue::Points(4.0));
        apply_style_property(&mut style, StyleProperty::MarginLeft, &StyleValue::Points(9.0));
        assert_eq!(style.margin.top, LengthPercentageAuto::Length(4.0));
        assert_eq!(style.margin.left, LengthPercentageAuto::Length(9.0));

        apply_style_property(&mut style, StyleProperty::PaddingVertical, &StyleValue::Percent(10.0));
        assert_eq!(style.padding.top, LengthPercentage::Percent(0.1));
        assert_eq!(style.padding.left, LengthPercentage::Length(0.0));
    }

    #[test]
    fn test_dimension_reset() {
        let mut style = base_style();
        apply_style_property(&mut style, StyleProperty::Width, &StyleValue::Points(40.0));
        assert_eq!(style.size.width, TaffyDimension::Length(40.0));

        apply_style_property(&mut style, StyleProperty::Width, &StyleValue::Undefined);
        assert_eq!(style.size.width, TaffyDimension::Auto);
    }

    #[test]
    fn test_flex_shorthand() {
        let mut style = base_style();
        apply_style_property(&mut style, StyleProperty::Flex, &StyleValue::Points(2.0));
        assert_eq!(style.flex_grow, 2.0);
        assert_eq!(style.flex_shrink, 0.0);
        assert_eq!(style.flex_basis, TaffyDimension::Length(0.0));

        apply_style_property(&mut style, StyleProperty::Flex, &StyleValue::Points(-1.0));
        assert_eq!(style.flex_grow, 0.0);
        assert_eq!(style.flex_shrink, 1.0);
        assert_eq!(style.flex_basis, TaffyDimension::Auto);
    }
}
