//! Writer configuration.

use std::fmt;
use std::sync::Arc;

use weft_core::{BoxError, Graph, MemberDesc, ServiceContext, Value};

use crate::{NameResolver, SharedNameScope};

/// Notifications fired at well-defined points of an object's construction.
///
/// Every method has a no-op default. Errors abort the build.
pub trait LifecycleHooks {
    /// An object opened by `StartObject` has an instance, and none of its
    /// members has been applied yet.
    fn before_properties(
        &mut self,
        _ctx: &dyn ServiceContext,
        _instance: &Value,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// All members of an engine-created object have been applied.
    fn after_properties(
        &mut self,
        _ctx: &dyn ServiceContext,
        _instance: &Value,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Begin-init ran on an instance.
    fn after_begin_init(
        &mut self,
        _ctx: &dyn ServiceContext,
        _instance: &Value,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// End-init ran on an instance.
    fn after_end_init(
        &mut self,
        _ctx: &dyn ServiceContext,
        _instance: &Value,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// A member is about to be assigned. Return `true` to mark the assignment
    /// as handled, skipping the invoker.
    fn set_value(
        &mut self,
        _ctx: &mut dyn ServiceContext,
        _instance: &Value,
        _member: &MemberDesc,
        _value: &Value,
    ) -> Result<bool, BoxError> {
        Ok(false)
    }
}

/// Options for an [`ObjectWriter`](crate::ObjectWriter) build.
pub struct WriterSettings {
    pub(crate) external_name_scope: Option<SharedNameScope>,
    pub(crate) register_names_on_external_scope: bool,
    pub(crate) root_object_instance: Option<Value>,
    pub(crate) hooks: Option<Box<dyn LifecycleHooks>>,
    pub(crate) name_resolver: Option<Arc<dyn NameResolver>>,
    pub(crate) graph: Option<Graph>,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            external_name_scope: None,
            register_names_on_external_scope: true,
            root_object_instance: None,
            hooks: None,
            name_resolver: None,
            graph: None,
        }
    }
}

impl fmt::Debug for WriterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSettings")
            .field("external_name_scope", &self.external_name_scope.is_some())
            .field(
                "register_names_on_external_scope",
                &self.register_names_on_external_scope,
            )
            .field("root_object_instance", &self.root_object_instance)
            .field("hooks", &self.hooks.is_some())
            .field("name_resolver", &self.name_resolver.is_some())
            .finish_non_exhaustive()
    }
}

impl WriterSettings {
    /// Default settings: a private name scope, no root instance, no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look names up in `scope`. Names defined by the stream are registered
    /// into it too, unless turned off with
    /// [`register_names_on_external_scope`](Self::register_names_on_external_scope).
    pub fn external_name_scope(mut self, scope: SharedNameScope) -> Self {
        self.external_name_scope = Some(scope);
        self
    }

    /// Whether names go into the external scope (`true`, the default) or
    /// into a private scope chained to it.
    pub fn register_names_on_external_scope(mut self, register: bool) -> Self {
        self.register_names_on_external_scope = register;
        self
    }

    /// Populate `instance` as the root object instead of constructing one.
    pub fn root_object_instance(mut self, instance: Value) -> Self {
        self.root_object_instance = Some(instance);
        self
    }

    /// Receive lifecycle notifications.
    pub fn hooks(mut self, hooks: Box<dyn LifecycleHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Resolve forward references the name scope can't.
    pub fn name_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.name_resolver = Some(resolver);
        self
    }

    /// Build into an existing graph, e.g. the one holding the root instance.
    pub fn graph(mut self, graph: Graph) -> Self {
        self.graph = Some(graph);
        self
    }
}
