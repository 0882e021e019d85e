//! Host - one script-driven UI.
//!
//! Wires the [`ModuleRegistry`], the [`UIManager`] and an [`Executor`]
//! together and runs the call cycle:
//!
//! ```text
//! native ──callFunctionReturnFlushedQueue──▶ script
//! native ◀──────── [[modules], [methods], [params]] ──── script
//!   run each call, lay out, send callbacks and events back
//! ```
//!
//! Every call into the script side is answered by a batch of native calls,
//! so replies are collected by the transport callbacks and processed in
//! arrival order from [`Host::poll`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::bridge::{Connection, Executor, JsCall, MethodContext, ModuleRegistry, ReplyCallback};
use crate::config::HostConfig;
use crate::error::{HostError, HostResult, TransportResult};
use crate::types::Tag;
use crate::ui_manager::{CallbackInvocation, UIManager};

/// Global the module table is injected under.
const BRIDGE_CONFIG: &str = "__fbBatchedBridgeConfig";

const INVOKE_CALLBACK: &str = "invokeCallbackAndReturnFlushedQueue";

pub struct Host<C: Connection> {
    registry: ModuleRegistry,
    ui: UIManager,
    ui_module: usize,
    executor: Executor<C>,
    batches: Rc<RefCell<VecDeque<Value>>>,
    loaded: Rc<Cell<bool>>,
}

impl<C: Connection> Host<C> {
    /// Host with the built-in view managers.
    pub fn new(connection: C, config: &HostConfig) -> Self {
        Self::with_registry(connection, config, ModuleRegistry::with_default_view_managers())
    }

    /// Host over a registry that may carry extra modules. The UI Manager is
    /// registered last.
    pub fn with_registry(connection: C, config: &HostConfig, mut registry: ModuleRegistry) -> Self {
        let ui = UIManager::new(registry.view_managers(), config);
        let ui_module = registry.register(&ui);

        Self {
            registry,
            ui,
            ui_module,
            executor: Executor::new(connection),
            batches: Rc::new(RefCell::new(VecDeque::new())),
            loaded: Rc::new(Cell::new(false)),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn ui(&self) -> &UIManager {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UIManager {
        &mut self.ui
    }

    pub fn executor(&self) -> &Executor<C> {
        &self.executor
    }

    /// Whether the application script has finished evaluating.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    /// Create the root view, connect, publish the module table and load
    /// `script`. Returns the root tag.
    pub fn start(&mut self, script: &[u8]) -> HostResult<Tag> {
        let root = self.ui.allocate_root_tag();
        self.ui.register_root_view(root)?;

        self.executor.init();
        self.executor
            .inject_json(BRIDGE_CONFIG, &self.registry.module_config())?;

        let loaded = self.loaded.clone();
        self.executor
            .execute_application_script(script, move || loaded.set(true))?;

        tracing::info!(target: "transport", root, modules = self.registry.modules().len(), "host started");
        Ok(root)
    }

    /// Ask the script side to render `app_name` into the root view.
    pub fn run_application(&mut self, app_name: &str, initial_props: Value) -> HostResult<()> {
        let root = self.ui.root_tag().ok_or(HostError::NotStarted)?;
        let call = JsCall::new(
            "AppRegistry",
            "runApplication",
            vec![
                json!(app_name),
                json!({ "rootTag": root, "initialProps": initial_props }),
            ],
        );
        self.send_js_call(&call)?;
        Ok(())
    }

    fn batch_callback(&self) -> ReplyCallback {
        let batches = self.batches.clone();
        Box::new(move |reply| batches.borrow_mut().push_back(reply))
    }

    fn send_js_call(&mut self, call: &JsCall) -> TransportResult<()> {
        let callback = self.batch_callback();
        self.executor.enqueue_js_call(call, Some(callback))
    }

    fn invoke_callback(&mut self, invocation: CallbackInvocation) -> TransportResult<()> {
        let callback = self.batch_callback();
        self.executor.execute_js_call(
            INVOKE_CALLBACK,
            &[json!(invocation.id), Value::Array(invocation.args)],
            Some(callback),
        )
    }

    fn next_batch(&self) -> Option<Value> {
        self.batches.borrow_mut().pop_front()
    }

    /// Read one reply from the connection and run every batch received.
    /// Returns the number of native calls made.
    pub fn poll(&mut self) -> HostResult<usize> {
        self.executor.poll();

        let mut calls = 0;
        while let Some(batch) = self.next_batch() {
            calls += self.process_batch(&batch)?;
        }
        Ok(calls)
    }

    /// Run one `[[moduleIds], [methodIds], [params]]` batch, then lay out and
    /// answer. A `null` batch is an empty queue.
    pub fn process_batch(&mut self, batch: &Value) -> HostResult<usize> {
        let columns = (
            batch.get(0).and_then(Value::as_array),
            batch.get(1).and_then(Value::as_array),
            batch.get(2).and_then(Value::as_array),
        );
        let (Some(modules), Some(methods), Some(params)) = columns else {
            if !batch.is_null() {
                tracing::debug!(target: "modules", "reply is not a call batch");
            }
            return Ok(0);
        };

        let mut ctx = MethodContext::new();
        let mut callbacks = Vec::new();
        let mut calls = 0;

        for ((module, method), args) in modules.iter().zip(methods).zip(params) {
            let ids = (
                module.as_u64().and_then(|id| usize::try_from(id).ok()),
                method.as_u64().and_then(|id| usize::try_from(id).ok()),
            );
            let (Some(module_id), Some(method_id)) = ids else {
                tracing::warn!(target: "modules", %module, %method, "malformed call ids");
                continue;
            };
            let args = args.as_array().map(Vec::as_slice).unwrap_or_default();
            calls += 1;

            if module_id == self.ui_module {
                let name = self
                    .registry
                    .descriptor(module_id)
                    .and_then(|d| d.method(method_id))
                    .map(|m| m.name.clone());
                let Some(name) = name else {
                    tracing::warn!(target: "modules", method_id, "unknown UIManager method");
                    continue;
                };
                match self.ui.call_command(&self.registry, &name, args) {
                    Ok(invocations) => callbacks.extend(invocations),
                    Err(err) => {
                        tracing::warn!(target: "ui_manager", command = %name, error = %err, "command failed")
                    }
                }
            } else if let Err(err) = self.registry.invoke(module_id, method_id, &mut ctx, args) {
                tracing::warn!(target: "modules", module_id, method_id, error = %err, "native call failed");
            }
        }

        self.ui.on_batch_complete()?;

        for invocation in callbacks {
            self.invoke_callback(invocation)?;
        }
        let mut js_calls = ctx.js_calls;
        js_calls.extend(self.ui.drain_js_calls());
        for call in &js_calls {
            self.send_js_call(call)?;
        }

        tracing::trace!(target: "modules", calls, "batch complete");
        Ok(calls)
    }
}
