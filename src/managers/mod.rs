//! View managers - one per family of visual elements.
//!
//! A view manager is a native module that can also build, configure and
//! populate elements. The UI Manager looks managers up by component name,
//! which is the module name with its `Manager` suffix removed
//! (`RCTViewManager` → `RCTView`).

mod button;
mod text;
mod view;

pub use button::ButtonManager;
pub use text::TextManager;
pub use view::ContainerViewManager;

use std::rc::Rc;

use serde_json::Value;

use crate::bridge::NativeModule;
use crate::element::{Element, ElementId, ElementTree};
use crate::error::LayoutResult;
use crate::layout::LayoutTree;
use crate::types::Tag;

/// Result of offering a prop to a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOutcome {
    /// Not a prop this manager knows.
    Unhandled,
    Applied,
    /// Applied, and the element's intrinsic size may have changed.
    NeedsMeasure,
}

/// Props and events a component exposes to the script side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewConfig {
    /// Prop name → type name.
    pub native_props: Vec<(&'static str, &'static str)>,
    /// Direct event names, e.g. `"topPress"`.
    pub direct_events: Vec<String>,
    /// Bubbling event names.
    pub bubbling_events: Vec<String>,
}

/// Builds and configures one family of elements.
pub trait ViewManager: NativeModule {
    /// Whether elements get a layout node.
    fn should_layout(&self) -> bool {
        true
    }

    fn view_config(&self) -> ViewConfig {
        ViewConfig::default()
    }

    /// Instantiate an element. `None` means creation failed.
    fn create(&self, tag: Tag, view_type: &str) -> Option<Element> {
        Some(Element::new(tag, view_type, self.module_name()))
    }

    /// Hook run once after the element and its layout node exist.
    fn configure(
        &self,
        _element: ElementId,
        _elements: &mut ElementTree,
        _layout: &mut LayoutTree,
    ) -> LayoutResult<()> {
        Ok(())
    }

    /// Apply a non-style prop.
    fn apply_property(&self, _element: &mut Element, _name: &str, _value: &Value) -> PropertyOutcome {
        PropertyOutcome::Unhandled
    }

    /// Reparent `child` under `container` in the visual tree.
    fn add_child(&self, elements: &mut ElementTree, container: ElementId, child: ElementId, index: usize) {
        elements.insert_child(container, child, index);
    }
}

/// Component name for a manager's module name.
pub fn component_name(module_name: &str) -> &str {
    match module_name.find("Manager") {
        Some(pos) => &module_name[..pos],
        None => module_name,
    }
}

/// A registered view manager, keyed by component name.
#[derive(Clone)]
pub struct ComponentData {
    pub name: String,
    pub module_id: usize,
    pub manager: Rc<dyn ViewManager>,
}

impl ComponentData {
    pub fn new(module_id: usize, manager: Rc<dyn ViewManager>) -> Self {
        Self {
            name: component_name(manager.module_name()).to_string(),
            module_id,
            manager,
        }
    }
}

impl std::fmt::Debug for ComponentData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentData")
            .field("name", &self.name)
            .field("module_id", &self.module_id)
            .finish()
    }
}

/// Script event name for a prop-style handler name: `onPress` → `topPress`.
pub fn normalize_event_name(name: &str) -> String {
    match name.strip_prefix("on") {
        Some(rest) => format!("top{rest}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_name() {
        assert_eq!(component_name("RCTViewManager"), "RCTView");
        assert_eq!(component_name("RCTButtonViewManager"), "RCTButtonView");
        assert_eq!(component_name("RCTText"), "RCTText");
    }

    #[test]
    fn test_normalize_event_name() {
        assert_eq!(normalize_event_name("onPress"), "topPress");
        assert_eq!(normalize_event_name("topChange"), "topChange");
    }

    #[test]
    fn test_component_data() {
        let data = ComponentData::new(4, Rc::new(TextManager::new()));
        assert_eq!(data.name, "RCTText");
        assert_eq!(data.module_id, 4);
    }
}
