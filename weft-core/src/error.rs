//! Errors raised by the capability seams: invokers, converters, node lists and
//! type-name parsing.

use std::error::Error;
use std::fmt;

/// Boxed error for failures raised by user-supplied capabilities
/// (markup extensions, deferring loaders, lifecycle hooks).
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Failure of an [`Invoker`](crate::Invoker) operation.
#[derive(Debug)]
#[non_exhaustive]
pub enum InvokeError {
    /// No constructor takes the given number of arguments.
    NoConstructor {
        /// The type being constructed.
        ty: String,
        /// Number of arguments supplied.
        arity: usize,
    },
    /// No static factory method matches by name and arity.
    NoFactoryMethod {
        /// The declaring type.
        ty: String,
        /// Requested method name.
        name: String,
        /// Number of arguments supplied.
        arity: usize,
    },
    /// Abstract types cannot be instantiated.
    AbstractType {
        /// The abstract type.
        ty: String,
    },
    /// The target of a member access is not an object instance.
    NotAnObject {
        /// Textual form of the target value.
        value: String,
    },
    /// The target does not accept collection items.
    NotACollection {
        /// The target's type.
        ty: String,
    },
    /// The target does not accept dictionary entries.
    NotADictionary {
        /// The target's type.
        ty: String,
    },
    /// The dictionary already holds an entry for this key.
    DuplicateKey {
        /// The dictionary's type.
        ty: String,
        /// Textual form of the key.
        key: String,
    },
    /// Failure raised by a custom invoker or factory.
    Custom(BoxError),
}

impl InvokeError {
    /// Wrap an arbitrary error raised by a custom invoker.
    pub fn custom(err: impl Into<BoxError>) -> Self {
        InvokeError::Custom(err.into())
    }
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::NoConstructor { ty, arity } => {
                write!(f, "type '{ty}' has no constructor taking {arity} argument(s)")
            }
            InvokeError::NoFactoryMethod { ty, name, arity } => write!(
                f,
                "type '{ty}' has no static factory method '{name}' taking {arity} argument(s)"
            ),
            InvokeError::AbstractType { ty } => {
                write!(f, "cannot create an instance of abstract type '{ty}'")
            }
            InvokeError::NotAnObject { value } => write!(f, "'{value}' is not an object instance"),
            InvokeError::NotACollection { ty } => write!(f, "type '{ty}' is not a collection"),
            InvokeError::NotADictionary { ty } => write!(f, "type '{ty}' is not a dictionary"),
            InvokeError::DuplicateKey { ty, key } => {
                write!(f, "dictionary '{ty}' already contains key '{key}'")
            }
            InvokeError::Custom(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InvokeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InvokeError::Custom(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// A value converter could not convert its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    /// Create a conversion error with a human-readable reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The reason the conversion failed.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ConvertError {}

/// Misuse of a [`NodeList`](crate::NodeList).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    /// A node was written after the list was closed.
    Closed,
    /// A reader was requested before the list was closed.
    NotClosed,
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Closed => f.write_str("node list is closed and cannot be written to"),
            NodeError::NotClosed => f.write_str("node list must be closed before it is read"),
        }
    }
}

impl Error for NodeError {}

/// A qualified type name could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNameError {
    /// The name (or its local part) is empty.
    Empty,
    /// The prefix is not bound to any namespace.
    UnknownPrefix(String),
}

impl fmt::Display for TypeNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNameError::Empty => f.write_str("type name is empty"),
            TypeNameError::UnknownPrefix(prefix) => {
                write!(f, "namespace prefix '{prefix}' is not declared")
            }
        }
    }
}

impl Error for TypeNameError {}
