//! Native modules and their export tables.
//!
//! A module declares what it exposes to the script side explicitly:
//! a manual method list and constant map, plus anything it registers
//! through an [`ExportBuilder`]. [`ModuleDescriptor::build`] flattens both
//! into one immutable table, fixing method ids for the life of the bridge.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::error::{BridgeError, BridgeResult};
use crate::types::PropMap;

/// A call from native code into a script-side module.
#[derive(Debug, Clone, PartialEq)]
pub struct JsCall {
    pub module: String,
    pub method: String,
    pub args: Vec<Value>,
}

impl JsCall {
    pub fn new(module: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            module: module.into(),
            method: method.into(),
            args,
        }
    }
}

/// Side effects produced while a native method runs.
#[derive(Debug, Default)]
pub struct MethodContext {
    pub js_calls: Vec<JsCall>,
}

impl MethodContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a call into the script side.
    pub fn enqueue_js_call(&mut self, module: &str, method: &str, args: Vec<Value>) {
        self.js_calls.push(JsCall::new(module, method, args));
    }
}

pub type MethodHandler = Rc<dyn Fn(&mut MethodContext, &[Value]) -> BridgeResult<()>>;

/// One exported method.
#[derive(Clone)]
pub struct ModuleMethod {
    pub name: String,
    handler: MethodHandler,
}

impl ModuleMethod {
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(&mut MethodContext, &[Value]) -> BridgeResult<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            handler: Rc::new(handler),
        }
    }

    pub fn invoke(&self, ctx: &mut MethodContext, args: &[Value]) -> BridgeResult<()> {
        (self.handler)(ctx, args)
    }
}

impl fmt::Debug for ModuleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleMethod").field("name", &self.name).finish()
    }
}

/// Declarative export registration.
#[derive(Debug, Default)]
pub struct ExportBuilder {
    methods: Vec<ModuleMethod>,
    constants: PropMap,
    excluded: HashSet<String>,
}

impl ExportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a method.
    pub fn method(
        &mut self,
        name: &str,
        handler: impl Fn(&mut MethodContext, &[Value]) -> BridgeResult<()> + 'static,
    ) -> &mut Self {
        self.methods.push(ModuleMethod::new(name, handler));
        self
    }

    /// Export a constant fixed at construction. Overrides a manual constant
    /// of the same name.
    pub fn constant(&mut self, name: &str, value: Value) -> &mut Self {
        self.constants.insert(name.to_string(), value);
        self
    }

    /// Keep a registered method off the export table.
    pub fn exclude(&mut self, name: &str) -> &mut Self {
        self.excluded.insert(name.to_string());
        self
    }
}

/// A native object reachable from the script side.
pub trait NativeModule {
    /// Declared name, e.g. `"RCTUIManager"`.
    fn module_name(&self) -> &str;

    /// Manually listed methods. These come first in the method table.
    fn methods_to_export(&self) -> Vec<ModuleMethod> {
        Vec::new()
    }

    /// Manually listed constants.
    fn constants_to_export(&self) -> PropMap {
        PropMap::new()
    }

    /// Register further methods and constants.
    fn declare_exports(&self, _exports: &mut ExportBuilder) {}
}

/// Immutable export table of one module.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    id: usize,
    name: String,
    constants: PropMap,
    methods: Vec<ModuleMethod>,
}

impl ModuleDescriptor {
    /// Flatten a module's exports into a table.
    ///
    /// Methods: manual list, then declared methods not excluded. A name may
    /// appear twice; its id stays its position in the table. Constants:
    /// manual map, then declared constants overriding same-named entries.
    pub fn build<M: NativeModule + ?Sized>(id: usize, module: &M) -> Self {
        let mut exports = ExportBuilder::new();
        module.declare_exports(&mut exports);

        let mut methods = module.methods_to_export();
        for method in exports.methods {
            if exports.excluded.contains(&method.name) {
                continue;
            }
            methods.push(method);
        }

        let mut constants = module.constants_to_export();
        for (name, value) in exports.constants {
            constants.insert(name, value);
        }

        tracing::debug!(
            target: "modules",
            id,
            name = module.module_name(),
            methods = methods.len(),
            constants = constants.len(),
            "built module descriptor"
        );

        Self {
            id,
            name: module.module_name().to_string(),
            constants,
            methods,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as seen by the script side, without the `RCT` prefix.
    pub fn exported_name(&self) -> String {
        self.name.replace("RCT", "")
    }

    pub fn constants(&self) -> &PropMap {
        &self.constants
    }

    pub fn methods(&self) -> &[ModuleMethod] {
        &self.methods
    }

    pub fn method(&self, method_id: usize) -> Option<&ModuleMethod> {
        self.methods.get(method_id)
    }

    /// Index of the method called `name`.
    pub fn method_id(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }

    /// `[exportedName, constants or null, [methodNames]]`.
    pub fn info(&self) -> Value {
        let constants = if self.constants.is_empty() {
            Value::Null
        } else {
            Value::Object(self.constants.clone())
        };
        let names: Vec<&str> = self.methods.iter().map(|m| m.name.as_str()).collect();
        json!([self.exported_name(), constants, names])
    }

    pub fn invoke(&self, method_id: usize, ctx: &mut MethodContext, args: &[Value]) -> BridgeResult<()> {
        let method = self.method(method_id).ok_or_else(|| BridgeError::UnknownMethod {
            module: self.name.clone(),
            method_id,
        })?;
        method.invoke(ctx, args)
    }
}

/// Read an integer tag from a method argument.
pub fn arg_tag(args: &[Value], index: usize) -> BridgeResult<i64> {
    args.get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| BridgeError::InvalidArgument(format!("expected integer at argument {index}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock;

    impl NativeModule for Clock {
        fn module_name(&self) -> &str {
            "RCTClock"
        }

        fn methods_to_export(&self) -> Vec<ModuleMethod> {
            vec![ModuleMethod::new("now", |ctx, _| {
                ctx.enqueue_js_call("Clock", "tick", vec![json!(1)]);
                Ok(())
            })]
        }

        fn constants_to_export(&self) -> PropMap {
            let mut constants = PropMap::new();
            constants.insert("resolution".into(), json!("ms"));
            constants.insert("epoch".into(), json!(0));
            constants
        }

        fn declare_exports(&self, exports: &mut ExportBuilder) {
            exports
                .method("start", |_, _| Ok(()))
                .method("now", |_, _| Ok(()))
                .method("debugDump", |_, _| Ok(()))
                .exclude("debugDump")
                .constant("epoch", json!(1970));
        }
    }

    struct Empty;

    impl NativeModule for Empty {
        fn module_name(&self) -> &str {
            "RCTEmpty"
        }
    }

    #[test]
    fn test_method_table_order() {
        let descriptor = ModuleDescriptor::build(3, &Clock);
        let names: Vec<&str> = descriptor.methods().iter().map(|m| m.name.as_str()).collect();

        assert_eq!(names, vec!["now", "start", "now"]);
        assert_eq!(descriptor.method_id("start"), Some(1));
        assert_eq!(descriptor.id(), 3);
    }

    #[test]
    fn test_repeated_name_keeps_both_ids() {
        let descriptor = ModuleDescriptor::build(0, &Clock);
        let mut ctx = MethodContext::new();

        assert_eq!(descriptor.method_id("now"), Some(0));
        descriptor.invoke(2, &mut ctx, &[]).unwrap();
        assert!(ctx.js_calls.is_empty());
        descriptor.invoke(0, &mut ctx, &[]).unwrap();
        assert_eq!(ctx.js_calls.len(), 1);
    }

    #[test]
    fn test_declared_constants_override() {
        let descriptor = ModuleDescriptor::build(0, &Clock);
        assert_eq!(descriptor.constants()["epoch"], json!(1970));
        assert_eq!(descriptor.constants()["resolution"], json!("ms"));
    }

    #[test]
    fn test_info() {
        let descriptor = ModuleDescriptor::build(0, &Clock);
        let info = descriptor.info();
        assert_eq!(info[0], json!("Clock"));
        assert_eq!(info[1]["epoch"], json!(1970));
        assert_eq!(info[2], json!(["now", "start", "now"]));

        let empty = ModuleDescriptor::build(1, &Empty);
        assert_eq!(empty.info(), json!(["Empty", null, []]));
    }

    #[test]
    fn test_invoke_by_index() {
        let descriptor = ModuleDescriptor::build(0, &Clock);
        let mut ctx = MethodContext::new();

        descriptor.invoke(0, &mut ctx, &[]).unwrap();
        assert_eq!(ctx.js_calls, vec![JsCall::new("Clock", "tick", vec![json!(1)])]);

        let err = descriptor.invoke(7, &mut ctx, &[]).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownMethod { method_id: 7, .. }));
    }

    #[test]
    fn test_arg_tag() {
        let args = [json!(12), json!("x")];
        assert_eq!(arg_tag(&args, 0).unwrap(), 12);
        assert!(arg_tag(&args, 1).is_err());
        assert!(arg_tag(&args, 2).is_err());
    }
}
