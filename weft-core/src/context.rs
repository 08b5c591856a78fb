//! The services capabilities are handed while they run.

use indexmap::IndexMap;

use crate::{Graph, SchemaContext, TypeName, TypeNameError, TypeRef, Value};

/// Ambient services available to invokers, converters, markup extensions and
/// deferring loaders.
pub trait ServiceContext {
    /// The type registry.
    fn schema(&self) -> &SchemaContext;

    /// The object arena.
    fn graph(&self) -> &Graph;

    /// The object arena, mutably.
    fn graph_mut(&mut self) -> &mut Graph;

    /// The namespace bound to `prefix` in the current scope.
    fn lookup_namespace(&self, prefix: &str) -> Option<String>;

    /// The object registered under `name`, if it exists yet.
    fn find_name(&self, name: &str) -> Option<Value>;

    /// Resolve a `prefix:Name` type name. A bare name whose default prefix
    /// isn't bound is looked up by local name alone.
    fn resolve_type(&self, qualified: &str) -> Option<TypeRef> {
        match TypeName::parse(qualified, |prefix| self.lookup_namespace(prefix)) {
            Ok(name) => self.schema().resolve(&name),
            Err(TypeNameError::UnknownPrefix(prefix)) if prefix.is_empty() => {
                self.schema().find_unqualified(qualified.trim())
            }
            Err(_) => None,
        }
    }
}

/// A [`ServiceContext`] over borrowed parts, for driving capabilities outside
/// of a writer.
pub struct StandaloneContext<'a> {
    schema: &'a SchemaContext,
    graph: &'a mut Graph,
    namespaces: IndexMap<String, String>,
    names: IndexMap<String, Value>,
}

impl<'a> StandaloneContext<'a> {
    /// A context with no namespace bindings and no names.
    pub fn new(schema: &'a SchemaContext, graph: &'a mut Graph) -> Self {
        Self {
            schema,
            graph,
            namespaces: IndexMap::new(),
            names: IndexMap::new(),
        }
    }

    /// Bind `prefix` to `namespace`.
    pub fn with_namespace(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), namespace.into());
        self
    }

    /// Make `value` findable as `name`.
    pub fn register_name(&mut self, name: impl Into<String>, value: Value) {
        self.names.insert(name.into(), value);
    }
}

impl ServiceContext for StandaloneContext<'_> {
    fn schema(&self) -> &SchemaContext {
        self.schema
    }

    fn graph(&self) -> &Graph {
        self.graph
    }

    fn graph_mut(&mut self) -> &mut Graph {
        self.graph
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<String> {
        self.namespaces.get(prefix).cloned()
    }

    fn find_name(&self, name: &str) -> Option<Value> {
        self.names.get(name).cloned()
    }
}
