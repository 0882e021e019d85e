//! Text leaf view.
//!
//! Text elements share a [`TextBlock`] with their layout node's measure
//! closure, so prop updates are seen by the next layout pass.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::bridge::NativeModule;
use crate::element::{Element, ElementId, ElementTree};
use crate::error::{LayoutError, LayoutResult};
use crate::layout::{LayoutTree, TextBlock};
use crate::types::json_f32;

use super::{PropertyOutcome, ViewConfig};

/// Manager for `RCTText`.
#[derive(Debug, Default)]
pub struct TextManager;

impl TextManager {
    pub fn new() -> Self {
        Self
    }
}

impl NativeModule for TextManager {
    fn module_name(&self) -> &str {
        "RCTTextManager"
    }
}

impl super::ViewManager for TextManager {
    fn view_config(&self) -> ViewConfig {
        ViewConfig {
            native_props: vec![
                ("text", "string"),
                ("fontSize", "number"),
                ("lineHeight", "number"),
                ("color", "color"),
            ],
            ..Default::default()
        }
    }

    fn create(&self, tag: crate::types::Tag, view_type: &str) -> Option<Element> {
        let mut element = Element::new(tag, view_type, self.module_name());
        element.text = Some(Rc::new(RefCell::new(TextBlock::default())));
        Some(element)
    }

    fn configure(
        &self,
        element: ElementId,
        elements: &mut ElementTree,
        layout: &mut LayoutTree,
    ) -> LayoutResult<()> {
        install_text_measure(element, elements, layout)
    }

    fn apply_property(&self, element: &mut Element, name: &str, value: &Value) -> PropertyOutcome {
        apply_text_property(element, name, value)
    }
}

/// Route the element's layout node measurement through its text block.
pub(super) fn install_text_measure(
    element: ElementId,
    elements: &ElementTree,
    layout: &mut LayoutTree,
) -> LayoutResult<()> {
    let Some(block) = elements.get(element).and_then(|e| e.text.clone()) else {
        return Ok(());
    };
    let node = layout.find_for_element(element).ok_or(LayoutError::UnknownNode)?;
    layout.set_measure_function(node, move |known, available| {
        block.borrow().measure(known, available)
    })
}

/// Shared handling of text-affecting props.
pub(super) fn apply_text_property(element: &mut Element, name: &str, value: &Value) -> PropertyOutcome {
    let Some(block) = element.text.as_ref() else {
        return PropertyOutcome::Unhandled;
    };
    let mut block = block.borrow_mut();

    match name {
        "text" | "title" => {
            block.content = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            PropertyOutcome::NeedsMeasure
        }
        "fontSize" => {
            block.font_size = json_f32(value).unwrap_or(TextBlock::default().font_size);
            PropertyOutcome::NeedsMeasure
        }
        "lineHeight" => {
            block.line_height = json_f32(value);
            PropertyOutcome::NeedsMeasure
        }
        "color" => PropertyOutcome::Applied,
        _ => PropertyOutcome::Unhandled,
    }
}
