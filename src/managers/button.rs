//! Push button.
//!
//! Buttons are laid out at their implicit size (title plus padding) unless
//! the script gives them an explicit width or height.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::bridge::{arg_tag, ExportBuilder, NativeModule};
use crate::element::{Element, ElementFlags, ElementId, ElementTree};
use crate::error::LayoutResult;
use crate::layout::{LayoutTree, TextBlock};
use crate::types::Tag;

use super::text::{apply_text_property, install_text_measure};
use super::{normalize_event_name, PropertyOutcome, ViewConfig};

const PRESS_EVENT: &str = "onPress";

/// Space between the title and the button edge, horizontal and vertical.
const BUTTON_INSET: (f32, f32) = (8.0, 6.0);

/// Manager for `RCTButtonView`.
#[derive(Debug, Default)]
pub struct ButtonManager;

impl ButtonManager {
    pub fn new() -> Self {
        Self
    }
}

impl NativeModule for ButtonManager {
    fn module_name(&self) -> &str {
        "RCTButtonViewManager"
    }

    fn declare_exports(&self, exports: &mut ExportBuilder) {
        // press(tag): emit the press event as if the user clicked
        exports.method("press", |ctx, args| {
            let tag = arg_tag(args, 0)?;
            ctx.enqueue_js_call(
                "RCTEventEmitter",
                "receiveEvent",
                vec![json!(tag), json!(normalize_event_name(PRESS_EVENT)), json!({})],
            );
            Ok(())
        });
    }
}

impl super::ViewManager for ButtonManager {
    fn view_config(&self) -> ViewConfig {
        ViewConfig {
            native_props: vec![("title", "string"), ("disabled", "bool"), ("color", "color")],
            direct_events: vec![normalize_event_name(PRESS_EVENT)],
            ..Default::default()
        }
    }

    fn create(&self, tag: Tag, view_type: &str) -> Option<Element> {
        let mut element = Element::new(tag, view_type, self.module_name());
        element.text = Some(Rc::new(RefCell::new(TextBlock {
            inset: BUTTON_INSET,
            ..Default::default()
        })));
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
        match name {
            "disabled" => {
                element
                    .flags
                    .set(ElementFlags::DISABLED, value.as_bool().unwrap_or(false));
                PropertyOutcome::Applied
            }
            "text" => PropertyOutcome::Unhandled,
            _ => apply_text_property(element, name, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{JsCall, MethodContext, ModuleDescriptor};
    use crate::managers::ViewManager as _;

    #[test]
    fn test_press_command() {
        let descriptor = ModuleDescriptor::build(0, &ButtonManager::new());
        let id = descriptor.method_id("press").unwrap();
        let mut ctx = MethodContext::new();

        descriptor.invoke(id, &mut ctx, &[json!(42)]).unwrap();

        assert_eq!(
            ctx.js_calls,
            vec![JsCall::new(
                "RCTEventEmitter",
                "receiveEvent",
                vec![json!(42), json!("topPress"), json!({})]
            )]
        );
    }

    #[test]
    fn test_press_requires_tag() {
        let descriptor = ModuleDescriptor::build(0, &ButtonManager::new());
        let mut ctx = MethodContext::new();
        assert!(descriptor.invoke(0, &mut ctx, &[]).is_err());
        assert!(ctx.js_calls.is_empty());
    }

    #[test]
    fn test_view_config() {
        let config = ButtonManager::new().view_config();
        assert_eq!(config.direct_events, vec!["topPress".to_string()]);
    }

    #[test]
    fn test_title_and_disabled() {
        let manager = ButtonManager::new();
        let mut element = manager.create(5, "RCTButtonView").unwrap();

        assert_eq!(
            manager.apply_property(&mut element, "title", &json!("OK")),
            PropertyOutcome::NeedsMeasure
        );
        manager.apply_property(&mut element, "disabled", &json!(true));

        assert!(element.is_disabled());
        let block = element.text.as_ref().unwrap().borrow();
        assert_eq!(block.content, "OK");
        assert_eq!(block.inset, BUTTON_INSET);
    }
}
