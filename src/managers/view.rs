//! Plain container view.

use serde_json::Value;

use crate::bridge::NativeModule;
use crate::element::{Element, ElementFlags};

use super::{PropertyOutcome, ViewConfig};

/// Manager for `RCTView`.
#[derive(Debug, Default)]
pub struct ContainerViewManager;

impl ContainerViewManager {
    pub fn new() -> Self {
        Self
    }
}

impl NativeModule for ContainerViewManager {
    fn module_name(&self) -> &str {
        "RCTViewManager"
    }
}

impl super::ViewManager for ContainerViewManager {
    fn view_config(&self) -> ViewConfig {
        ViewConfig {
            native_props: vec![
                ("backgroundColor", "color"),
                ("opacity", "number"),
                ("pointerEvents", "string"),
                ("testID", "string"),
            ],
            ..Default::default()
        }
    }

    fn apply_property(&self, element: &mut Element, name: &str, value: &Value) -> PropertyOutcome {
        match name {
            "pointerEvents" => {
                let disabled = value.as_str() == Some("none");
                element.flags.set(ElementFlags::DISABLED, disabled);
                PropertyOutcome::Applied
            }
            "backgroundColor" | "opacity" | "testID" => PropertyOutcome::Applied,
            _ => PropertyOutcome::Unhandled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::ViewManager as _;
    use serde_json::json;

    #[test]
    fn test_pointer_events() {
        let manager = ContainerViewManager::new();
        let mut element = manager.create(7, "RCTView").unwrap();
        assert_eq!(element.module_name, "RCTViewManager");

        let outcome = manager.apply_property(&mut element, "pointerEvents", &json!("none"));
        assert_eq!(outcome, PropertyOutcome::Applied);
        assert!(element.is_disabled());

        manager.apply_property(&mut element, "pointerEvents", &json!("auto"));
        assert!(!element.is_disabled());
    }

    #[test]
    fn test_unhandled_prop() {
        let manager = ContainerViewManager::new();
        let mut element = manager.create(7, "RCTView").unwrap();
        assert_eq!(
            manager.apply_property(&mut element, "fancy", &json!(1)),
            PropertyOutcome::Unhandled
        );
    }
}
