//! Name scopes and the forward references waiting on them.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use weft_core::{MemberRef, TypeRef, Value};

/// A name scope that can be shared between a writer and its caller.
pub type SharedNameScope = Arc<Mutex<NameScope>>;

/// Mapping from names to the objects registered under them.
///
/// Each name can be registered once. Lookups that miss fall through to the
/// parent scope, if there is one.
#[derive(Debug, Default)]
pub struct NameScope {
    names: IndexMap<String, Value>,
    parent: Option<SharedNameScope>,
}

impl NameScope {
    /// An empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty scope whose lookups fall through to `parent`.
    pub fn with_parent(parent: SharedNameScope) -> Self {
        Self {
            names: IndexMap::new(),
            parent: Some(parent),
        }
    }

    /// Wrap this scope for sharing.
    pub fn shared(self) -> SharedNameScope {
        Arc::new(Mutex::new(self))
    }

    /// Register `value` under `name`. Returns `false`, leaving the scope
    /// unchanged, if the name is taken in this scope.
    pub fn register(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if self.names.contains_key(&name) {
            return false;
        }
        self.names.insert(name, value);
        true
    }

    /// The value registered under `name` here or in a parent scope.
    pub fn find(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.names.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lock().find(name))
    }

    /// Whether `name` is registered in this scope itself.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Names registered in this scope, in registration order.
    pub fn names(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of names registered in this scope.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether this scope has no names of its own.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolves names that were never registered in the writer's scope, e.g.
/// names defined by a host document.
pub trait NameResolver: Send + Sync {
    /// The object known as `name`, if any.
    fn resolve(&self, name: &str) -> Option<Value>;
}

impl<F> NameResolver for F
where
    F: Fn(&str) -> Option<Value> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

/// Where a resolved forward reference has to be stored.
#[derive(Debug, Clone)]
pub(crate) struct FixupTarget {
    pub parent_type: TypeRef,
    pub member: MemberRef,
    pub instance: Value,
    pub key: Option<Value>,
}

/// A forward reference waiting for the root to complete.
#[derive(Debug, Clone)]
pub(crate) struct NameFixup {
    pub names: Vec<String>,
    pub target: FixupTarget,
}
