//! Dynamic values flowing through node streams and object members.

use std::fmt;
use std::sync::Arc;

use crate::{NodeList, ObjectId, TypeRef};

/// A value in the object graph.
///
/// Scalars are held inline; objects live in a [`Graph`](crate::Graph) and are
/// referred to by handle.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    String(String),
    /// A type descriptor.
    Type(TypeRef),
    /// Handle to an object in the graph arena.
    Object(ObjectId),
    /// Placeholder for objects that are named but not registered yet.
    ForwardRef(ForwardRef),
    /// A captured node list, replayable on demand.
    Template(Arc<NodeList>),
}

/// Placeholder standing in for "resolve these names later".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardRef {
    names: Vec<String>,
}

impl ForwardRef {
    /// Create a placeholder for `names`.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The names to resolve.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The number, if this is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The type descriptor, if this is one.
    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Value::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// The object handle, if this is one.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// The forward-reference placeholder, if this is one.
    pub fn as_forward_ref(&self) -> Option<&ForwardRef> {
        match self {
            Value::ForwardRef(r) => Some(r),
            _ => None,
        }
    }

    /// The captured node list, if this is a template.
    pub fn as_template(&self) -> Option<&Arc<NodeList>> {
        match self {
            Value::Template(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Type(ty) => write!(f, "{ty}"),
            Value::Object(id) => write!(f, "{id}"),
            Value::ForwardRef(r) => write!(f, "ref({})", r.names.join(", ")),
            Value::Template(nodes) => write!(f, "template({} nodes)", nodes.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

impl From<TypeRef> for Value {
    fn from(ty: TypeRef) -> Self {
        Value::Type(ty)
    }
}

impl From<ForwardRef> for Value {
    fn from(r: ForwardRef) -> Self {
        Value::ForwardRef(r)
    }
}
