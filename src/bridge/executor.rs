//! Executor - script calls encoded as requests on the transport.

use serde_json::Value;

use crate::error::TransportResult;

use super::module::JsCall;
use super::transport::{Connection, ReplyCallback, Transport};

/// Global object on the script side that receives calls.
const BATCHED_BRIDGE: &str = "__fbBatchedBridge";

/// Entry point for native → script calls.
const CALL_FUNCTION: &str = "callFunctionReturnFlushedQueue";

/// Render one argument: lists and maps as compact JSON, anything else as a
/// quoted string.
fn encode_arg(arg: &Value) -> String {
    match arg {
        Value::Array(_) | Value::Object(_) => arg.to_string(),
        Value::String(s) => format!("\"{s}\""),
        Value::Null => "\"\"".to_string(),
        other => format!("\"{other}\""),
    }
}

/// `__fbBatchedBridge.<method>(<args>);`
pub fn encode_js_call(method: &str, args: &[Value]) -> String {
    let args: Vec<String> = args.iter().map(encode_arg).collect();
    format!("{BATCHED_BRIDGE}.{method}({});", args.join(","))
}

/// Script executor over a [`Transport`].
pub struct Executor<C: Connection> {
    transport: Transport<C>,
}

impl<C: Connection> Executor<C> {
    pub fn new(connection: C) -> Self {
        Self {
            transport: Transport::new(connection),
        }
    }

    pub fn transport(&self) -> &Transport<C> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<C> {
        &mut self.transport
    }

    /// Connect the transport.
    pub fn init(&mut self) {
        self.transport.start();
    }

    /// Call `method` on the batched bridge.
    pub fn execute_js_call(
        &mut self,
        method: &str,
        args: &[Value],
        callback: Option<ReplyCallback>,
    ) -> TransportResult<()> {
        let request = encode_js_call(method, args);
        tracing::trace!(target: "transport", %request, "execute js call");
        self.transport.process_request(request.into_bytes(), callback)
    }

    /// Define a global `name` holding `data`.
    pub fn inject_json(&mut self, name: &str, data: &Value) -> TransportResult<()> {
        let request = format!("{name}={data}");
        self.transport.process_request(request.into_bytes(), None)
    }

    /// Evaluate the application bundle; `on_done` runs once the engine replies.
    pub fn execute_application_script(
        &mut self,
        script: &[u8],
        on_done: impl FnOnce() + 'static,
    ) -> TransportResult<()> {
        tracing::debug!(target: "transport", bytes = script.len(), "executing application script");
        self.transport
            .process_request(script.to_vec(), Some(Box::new(move |_| on_done())))
    }

    /// Deliver a native → script module call.
    pub fn enqueue_js_call(&mut self, call: &JsCall, callback: Option<ReplyCallback>) -> TransportResult<()> {
        let args = [
            Value::String(call.module.clone()),
            Value::String(call.method.clone()),
            Value::Array(call.args.clone()),
        ];
        self.execute_js_call(CALL_FUNCTION, &args, callback)
    }

    /// Read and dispatch whatever replies have arrived.
    pub fn poll(&mut self) {
        self.transport.poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::transport::tests::MemoryConnection;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn ready_executor() -> (Executor<MemoryConnection>, MemoryConnection) {
        let conn = MemoryConnection::default();
        let mut executor = Executor::new(conn.clone());
        executor.init();
        (executor, conn)
    }

    #[test]
    fn test_encode_js_call() {
        assert_eq!(
            encode_js_call("callFunctionReturnFlushedQueue", &[json!("AppRegistry"), json!("run"), json!([1, {"a": 2}])]),
            r#"__fbBatchedBridge.callFunctionReturnFlushedQueue("AppRegistry","run",[1,{"a":2}]);"#
        );
        assert_eq!(encode_js_call("flushedQueue", &[]), "__fbBatchedBridge.flushedQueue();");
        assert_eq!(
            encode_js_call("invokeCallbackAndReturnFlushedQueue", &[json!(7), json!(true)]),
            r#"__fbBatchedBridge.invokeCallbackAndReturnFlushedQueue("7","true");"#
        );
    }

    #[test]
    fn test_inject_json() {
        let (mut executor, conn) = ready_executor();
        executor
            .inject_json("__fbBatchedBridgeConfig", &json!({"remoteModuleConfig": []}))
            .unwrap();
        assert_eq!(conn.payloads(), vec![r#"__fbBatchedBridgeConfig={"remoteModuleConfig":[]}"#]);
    }

    #[test]
    fn test_enqueue_js_call() {
        let (mut executor, conn) = ready_executor();
        let call = JsCall::new("RCTEventEmitter", "receiveEvent", vec![json!(5), json!("topPress"), json!({})]);
        executor.enqueue_js_call(&call, None).unwrap();

        assert_eq!(
            conn.payloads(),
            vec![r#"__fbBatchedBridge.callFunctionReturnFlushedQueue("RCTEventEmitter","receiveEvent",[5,"topPress",{}]);"#]
        );
    }

    #[test]
    fn test_application_script_done() {
        let (mut executor, conn) = ready_executor();
        let done = Rc::new(Cell::new(false));
        let done_clone = done.clone();

        executor
            .execute_application_script(b"var x = 1;", move || done_clone.set(true))
            .unwrap();
        assert!(!done.get());

        conn.push_reply("null");
        executor.poll();
        assert!(done.get());
    }
}
