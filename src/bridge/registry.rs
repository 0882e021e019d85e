//! Module Registry - export tables for every native module.
//!
//! Module ids are assigned in registration order and never renumbered.
//! View managers are registered as ordinary modules and additionally kept
//! by component name for the UI Manager.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::error::{BridgeError, BridgeResult};
use crate::managers::{ButtonManager, ComponentData, ContainerViewManager, TextManager, ViewManager};

use super::module::{MethodContext, ModuleDescriptor, NativeModule};

/// All registered modules of one bridge.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
    by_name: HashMap<String, usize>,
    components: Vec<ComponentData>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in view managers.
    pub fn with_default_view_managers() -> Self {
        let mut registry = Self::new();
        registry.register_view_manager(Rc::new(ContainerViewManager::new()));
        registry.register_view_manager(Rc::new(TextManager::new()));
        registry.register_view_manager(Rc::new(ButtonManager::new()));
        registry
    }

    /// Register a module and return its id.
    pub fn register<M: NativeModule + ?Sized>(&mut self, module: &M) -> usize {
        let id = self.modules.len();
        let descriptor = ModuleDescriptor::build(id, module);
        if self.by_name.insert(descriptor.name().to_string(), id).is_some() {
            tracing::warn!(target: "modules", name = descriptor.name(), "module registered twice, later one wins lookup");
        }
        self.modules.push(descriptor);
        id
    }

    /// Register a view manager and return its module id.
    pub fn register_view_manager(&mut self, manager: Rc<dyn ViewManager>) -> usize {
        let id = self.register(manager.as_ref());
        self.components.push(ComponentData::new(id, manager));
        id
    }

    pub fn descriptor(&self, id: usize) -> Option<&ModuleDescriptor> {
        self.modules.get(id)
    }

    /// Find a module by declared or exported name.
    pub fn find(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.by_name
            .get(name)
            .or_else(|| self.by_name.get(&format!("RCT{name}")))
            .and_then(|&id| self.modules.get(id))
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn view_managers(&self) -> &[ComponentData] {
        &self.components
    }

    /// Configuration injected into the script side at startup.
    pub fn module_config(&self) -> Value {
        let infos: Vec<Value> = self.modules.iter().map(ModuleDescriptor::info).collect();
        json!({ "remoteModuleConfig": infos })
    }

    /// Invoke `method_id` on module `module_id`.
    pub fn invoke(
        &self,
        module_id: usize,
        method_id: usize,
        ctx: &mut MethodContext,
        args: &[Value],
    ) -> BridgeResult<()> {
        let module = self
            .descriptor(module_id)
            .ok_or_else(|| BridgeError::UnknownModule(module_id.to_string()))?;
        tracing::trace!(target: "modules", module = module.name(), method_id, "invoke");
        module.invoke(method_id, ctx, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ModuleMethod;

    struct Timing;

    impl NativeModule for Timing {
        fn module_name(&self) -> &str {
            "RCTTiming"
        }

        fn methods_to_export(&self) -> Vec<ModuleMethod> {
            vec![ModuleMethod::new("createTimer", |_, _| Ok(()))]
        }
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let mut registry = ModuleRegistry::with_default_view_managers();
        let id = registry.register(&Timing);

        assert_eq!(id, 3);
        assert_eq!(registry.descriptor(0).unwrap().name(), "RCTViewManager");
        assert_eq!(registry.find("RCTTiming").unwrap().id(), 3);
        assert_eq!(registry.find("Timing").unwrap().id(), 3);
        assert!(registry.find("Nope").is_none());
    }

    #[test]
    fn test_view_managers() {
        let registry = ModuleRegistry::with_default_view_managers();
        let names: Vec<&str> = registry.view_managers().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["RCTView", "RCTText", "RCTButtonView"]);
    }

    #[test]
    fn test_module_config() {
        let mut registry = ModuleRegistry::new();
        registry.register(&Timing);

        assert_eq!(
            registry.module_config(),
            json!({ "remoteModuleConfig": [["Timing", null, ["createTimer"]]] })
        );
    }

    #[test]
    fn test_invoke_unknown_module() {
        let registry = ModuleRegistry::new();
        let mut ctx = MethodContext::new();
        assert!(matches!(
            registry.invoke(9, 0, &mut ctx, &[]),
            Err(BridgeError::UnknownModule(_))
        ));
    }
}
