//! Script-side command surface of the UI Manager.
//!
//! Commands arrive by name with positional JSON arguments. Results that the
//! script side waits for come back as [`CallbackInvocation`]s naming the
//! callback id the script passed in.

use serde_json::{json, Value};

use crate::bridge::{arg_tag, ModuleRegistry};
use crate::error::{BridgeError, BridgeResult, UiResult};
use crate::types::{json_f32, Point, PropMap, Tag};

use super::UIManager;

/// Exported command names, in method-id order.
pub const COMMANDS: &[&str] = &[
    "createView",
    "updateView",
    "manageChildren",
    "setChildren",
    "removeSubviewsFromContainerWithID",
    "replaceExistingNonRootView",
    "measure",
    "measureLayout",
    "measureLayoutRelativeToParent",
    "findSubviewIn",
    "dispatchViewManagerCommand",
    "takeSnapshot",
    "setJSResponder",
    "clearJSResponder",
    "blur",
];

/// A script callback to run with `args`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackInvocation {
    pub id: i64,
    pub args: Vec<Value>,
}

impl CallbackInvocation {
    pub fn new(id: i64, args: Vec<Value>) -> Self {
        Self { id, args }
    }
}

fn arg_str(args: &[Value], index: usize) -> BridgeResult<&str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| BridgeError::InvalidArgument(format!("expected string at argument {index}")))
}

fn arg_bool(args: &[Value], index: usize) -> bool {
    args.get(index).and_then(Value::as_bool).unwrap_or(false)
}

/// Integer list; a missing or null argument is an empty list.
fn arg_list<T: TryFrom<i64>>(args: &[Value], index: usize) -> BridgeResult<Vec<T>> {
    let invalid = || BridgeError::InvalidArgument(format!("expected integer list at argument {index}"));
    match args.get(index) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_i64().and_then(|n| T::try_from(n).ok()).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// Prop map; a missing or null argument is an empty map.
fn arg_props(args: &[Value], index: usize) -> BridgeResult<PropMap> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(PropMap::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(BridgeError::InvalidArgument(format!("expected map at argument {index}"))),
    }
}

fn arg_point(args: &[Value], index: usize) -> BridgeResult<Point> {
    let coords = args.get(index).and_then(Value::as_array);
    match coords.map(|c| (c.first().and_then(json_f32), c.get(1).and_then(json_f32))) {
        Some((Some(x), Some(y))) => Ok(Point::new(x, y)),
        _ => Err(BridgeError::InvalidArgument(format!("expected [x, y] at argument {index}"))),
    }
}

/// Snapshot target: `"window"` or a tag, given as number or string.
fn arg_target(args: &[Value], index: usize) -> BridgeResult<String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(BridgeError::InvalidArgument(format!("expected snapshot target at argument {index}"))),
    }
}

fn numbers(values: &[f32]) -> Vec<Value> {
    values.iter().map(|&v| json!(v)).collect()
}

impl UIManager {
    /// Run the command `name` with script-side arguments.
    pub fn call_command(
        &mut self,
        registry: &ModuleRegistry,
        name: &str,
        args: &[Value],
    ) -> UiResult<Vec<CallbackInvocation>> {
        tracing::trace!(target: "ui_manager", command = name, "command");
        let mut callbacks = Vec::new();

        match name {
            "createView" => {
                let props = arg_props(args, 3)?;
                self.create_view(arg_tag(args, 0)?, arg_str(args, 1)?, arg_tag(args, 2)?, &props)?;
            }
            "updateView" => {
                let props = arg_props(args, 2)?;
                self.update_view(arg_tag(args, 0)?, arg_str(args, 1).unwrap_or_default(), &props)?;
            }
            "manageChildren" => {
                self.manage_children(
                    arg_tag(args, 0)?,
                    &arg_list::<usize>(args, 1)?,
                    &arg_list::<usize>(args, 2)?,
                    &arg_list::<Tag>(args, 3)?,
                    &arg_list::<usize>(args, 4)?,
                    &arg_list::<usize>(args, 5)?,
                )?;
            }
            "setChildren" => {
                self.set_children(arg_tag(args, 0)?, &arg_list::<Tag>(args, 1)?)?;
            }
            "removeSubviewsFromContainerWithID" => {
                self.remove_subviews_from_container_with_id(arg_tag(args, 0)?)?;
            }
            "replaceExistingNonRootView" => {
                self.replace_existing_non_root_view(arg_tag(args, 0)?, arg_tag(args, 1)?)?;
            }
            "measure" => {
                let values = self.measure(arg_tag(args, 0)?);
                callbacks.push(CallbackInvocation::new(arg_tag(args, 1)?, numbers(&values)));
            }
            "measureLayout" => {
                let (error_cb, cb) = (arg_tag(args, 2)?, arg_tag(args, 3)?);
                callbacks.push(match self.measure_layout(arg_tag(args, 0)?, arg_tag(args, 1)?) {
                    Ok(values) => CallbackInvocation::new(cb, numbers(&values)),
                    Err(err) => CallbackInvocation::new(error_cb, vec![json!({ "error": err.to_string() })]),
                });
            }
            "measureLayoutRelativeToParent" => {
                let (error_cb, cb) = (arg_tag(args, 1)?, arg_tag(args, 2)?);
                callbacks.push(match self.measure_layout_relative_to_parent(arg_tag(args, 0)?) {
                    Ok(values) => CallbackInvocation::new(cb, numbers(&values)),
                    Err(err) => CallbackInvocation::new(error_cb, vec![json!({ "error": err.to_string() })]),
                });
            }
            "findSubviewIn" => {
                let hit = self.find_subview_in(arg_tag(args, 0)?, arg_point(args, 1)?);
                let values = match hit {
                    Some((tag, frame)) => vec![
                        json!(tag),
                        json!(frame.x),
                        json!(frame.y),
                        json!(frame.width),
                        json!(frame.height),
                    ],
                    None => Vec::new(),
                };
                callbacks.push(CallbackInvocation::new(arg_tag(args, 2)?, values));
            }
            "dispatchViewManagerCommand" => {
                let command_id = args
                    .get(1)
                    .and_then(Value::as_u64)
                    .and_then(|id| usize::try_from(id).ok())
                    .ok_or_else(|| BridgeError::InvalidArgument("expected command id at argument 1".into()))?;
                let command_args = args.get(2).and_then(Value::as_array).cloned().unwrap_or_default();
                self.dispatch_view_manager_command(registry, arg_tag(args, 0)?, command_id, &command_args)?;
            }
            "takeSnapshot" => {
                let target = arg_target(args, 0)?;
                let options = arg_props(args, 1)?;
                let (resolve, reject) = (arg_tag(args, 2)?, arg_tag(args, 3)?);
                callbacks.push(match self.take_snapshot(&target, &options) {
                    Ok(url) => CallbackInvocation::new(resolve, vec![url]),
                    Err(payload) => CallbackInvocation::new(reject, vec![payload]),
                });
            }
            "setJSResponder" => self.set_js_responder(arg_tag(args, 0)?, arg_bool(args, 1)),
            "clearJSResponder" => self.clear_js_responder(),
            "blur" => self.blur(arg_tag(args, 0)?),
            other => {
                tracing::warn!(target: "ui_manager", command = other, "unknown command");
                return Err(BridgeError::InvalidArgument(format!("unknown UIManager command {other}")).into());
            }
        }
        Ok(callbacks)
    }
}
