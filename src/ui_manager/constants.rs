//! Constants the UI Manager exports to the script side.

use serde_json::{json, Map, Value};

use crate::config::WindowConfig;
use crate::managers::ComponentData;
use crate::types::PropMap;

/// Registration name for an event: `topPress` → `onPress`.
fn registration_name(event: &str) -> String {
    format!("on{}", event.get(3..).unwrap_or(event))
}

/// Per-component manager info, event registration tables and window metrics.
pub fn ui_constants<'a>(components: impl IntoIterator<Item = &'a ComponentData>, window: &WindowConfig) -> PropMap {
    let mut constants = PropMap::new();
    let mut direct_events = Map::new();
    let mut bubbling_events = Map::new();

    for component in components {
        let config = component.manager.view_config();

        let mut info = Map::new();
        info.insert("Manager".into(), json!(component.manager.module_name()));
        if !config.native_props.is_empty() {
            let props: Map<String, Value> = config
                .native_props
                .iter()
                .map(|(name, kind)| (name.to_string(), json!(kind)))
                .collect();
            info.insert("NativeProps".into(), Value::Object(props));
        }

        for event in &config.direct_events {
            direct_events
                .entry(event.clone())
                .or_insert_with(|| json!({ "registrationName": registration_name(event) }));
        }

        for event in &config.bubbling_events {
            bubbling_events.entry(event.clone()).or_insert_with(|| {
                let name = registration_name(event);
                json!({
                    "phasedRegistrationNames": {
                        "bubbled": name,
                        "captured": format!("{name}Capture"),
                    }
                })
            });
        }

        constants.insert(component.name.clone(), Value::Object(info));
    }

    let fullscreen = json!({ "width": window.width, "height": window.height });
    constants.insert("customBubblingEventTypes".into(), Value::Object(bubbling_events));
    constants.insert("customDirectEventTypes".into(), Value::Object(direct_events));
    constants.insert(
        "Dimensions".into(),
        json!({
            "window": { "width": window.width, "height": window.height, "scale": window.scale },
            "modalFullscreenView": fullscreen.clone(),
        }),
    );
    constants.insert("modalFullscreenView".into(), fullscreen);
    constants
}
