//! Arena holding the objects of a materialized graph.
//!
//! Objects are addressed by [`ObjectId`] handles rather than pointers, so
//! members can refer to objects created later (forward references) and
//! cycles need no shared ownership.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::{TypeRef, Value};

/// Handle to an object in a [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Position of the object in its arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an object is in the begin-init / end-init protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitState {
    /// Not initializing, or the type doesn't take part in the protocol.
    #[default]
    Idle,
    /// Between begin-init and end-init.
    Initializing,
    /// End-init has run.
    Initialized,
}

/// An instance stored in the graph.
#[derive(Clone, Debug)]
pub struct Object {
    ty: TypeRef,
    members: IndexMap<String, Value>,
    items: Vec<Value>,
    entries: Vec<(Value, Value)>,
    init_state: InitState,
}

impl Object {
    /// An empty instance of `ty`.
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            members: IndexMap::new(),
            items: Vec::new(),
            entries: Vec::new(),
            init_state: InitState::Idle,
        }
    }

    /// The instance's type.
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Value of a member, if it was ever set.
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// Members in assignment order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Assign a member, keeping its original position when reassigned.
    pub fn set_member(&mut self, name: impl Into<String>, value: Value) {
        self.members.insert(name.into(), value);
    }

    /// Collection items.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Append a collection item.
    pub fn push_item(&mut self, item: Value) {
        self.items.push(item);
    }

    /// Dictionary entries in insertion order.
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    /// The entry stored under `key`.
    pub fn entry(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Add an entry. Returns `false` and leaves the dictionary unchanged if the
    /// key is already present.
    pub fn insert_entry(&mut self, key: Value, item: Value) -> bool {
        if self.entry(&key).is_some() {
            return false;
        }
        self.entries.push((key, item));
        true
    }

    /// Progress through begin-init / end-init.
    pub fn init_state(&self) -> InitState {
        self.init_state
    }

    /// Record progress through begin-init / end-init.
    pub fn set_init_state(&mut self, state: InitState) {
        self.init_state = state;
    }
}

/// Arena of objects.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    objects: Vec<Object>,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, returning its handle.
    pub fn alloc(&mut self, object: Object) -> ObjectId {
        let idx = self.objects.len();
        assert!(idx < u32::MAX as usize, "graph exceeded maximum capacity");
        self.objects.push(object);
        ObjectId(idx as u32)
    }

    /// Borrow an object by handle.
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.index())
    }

    /// Mutably borrow an object by handle.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.index())
    }

    /// Borrow the object a value refers to.
    pub fn object(&self, value: &Value) -> Option<&Object> {
        value.as_object().and_then(|id| self.get(id))
    }

    /// Mutably borrow the object a value refers to.
    pub fn object_mut(&mut self, value: &Value) -> Option<&mut Object> {
        value.as_object().and_then(|id| self.get_mut(id))
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the graph holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(idx, obj)| (ObjectId(idx as u32), obj))
    }

    /// Compare the value `a` in this graph with `b` in `other` by content:
    /// same types, same members, items and entries, recursively. Handles may
    /// differ. Cycles are followed once.
    pub fn content_eq(&self, a: &Value, other: &Graph, b: &Value) -> bool {
        let mut seen = HashSet::new();
        self.content_eq_inner(a, other, b, &mut seen)
    }

    fn content_eq_inner(
        &self,
        a: &Value,
        other: &Graph,
        b: &Value,
        seen: &mut HashSet<(ObjectId, ObjectId)>,
    ) -> bool {
        let (Value::Object(x), Value::Object(y)) = (a, b) else {
            return a == b;
        };
        if !seen.insert((*x, *y)) {
            return true;
        }
        let (Some(ox), Some(oy)) = (self.get(*x), other.get(*y)) else {
            return false;
        };

        ox.ty == oy.ty
            && ox.members.len() == oy.members.len()
            && ox.members.iter().all(|(name, va)| {
                oy.members
                    .get(name)
                    .is_some_and(|vb| self.content_eq_inner(va, other, vb, seen))
            })
            && ox.items.len() == oy.items.len()
            && ox
                .items
                .iter()
                .zip(&oy.items)
                .all(|(va, vb)| self.content_eq_inner(va, other, vb, seen))
            && ox.entries.len() == oy.entries.len()
            && ox.entries.iter().zip(&oy.entries).all(|((ka, va), (kb, vb))| {
                self.content_eq_inner(ka, other, kb, seen)
                    && self.content_eq_inner(va, other, vb, seen)
            })
    }
}
