//! Error types for object graph materialization.

use std::{
    error::Error,
    fmt::{self, Display},
};

use weft_core::{BoxError, ConvertError, InvokeError};

/// Error raised while materializing a node stream. Every error is fatal for
/// the build it occurred in.
#[derive(Debug)]
pub struct WriterError {
    /// The specific kind of error
    pub(crate) kind: WriterErrorKind,
}

impl WriterError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &WriterErrorKind {
        &self.kind
    }

    /// The broad class of failure.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Stable identifier of the error kind.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub(crate) fn new(kind: impl Into<WriterErrorKind>) -> Self {
        WriterError { kind: kind.into() }
    }
}

impl Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "{kind}")
    }
}

impl Error for WriterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

impl<K: Into<WriterErrorKind>> From<K> for WriterError {
    fn from(value: K) -> Self {
        WriterError::new(value)
    }
}

/// Broad classes of materialization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The node stream broke the event grammar.
    GrammarViolation,
    /// An object could not be constructed.
    ConstructionFailure,
    /// A value could not be converted to the type it was stored as.
    CoercionFailure,
    /// A forward reference named an object that never appeared.
    UnresolvedReferenceFailure,
    /// An invoker, hook, provider or loader raised an error.
    InvokerFailure,
}

/// Detailed classification of materialization errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum WriterErrorKind {
    /// An event arrived in a state that doesn't accept it.
    UnexpectedEvent {
        /// The offending event.
        event: &'static str,
        /// What the writer was doing at the time.
        reason: &'static str,
    },
    /// A member was written twice on the same object.
    DuplicateMember {
        /// The member.
        member: String,
        /// The object's type.
        ty: String,
    },
    /// `GetObject` found no existing value in the open member.
    NullGetObject {
        /// The member that was read.
        member: String,
    },
    /// A previous error aborted this build.
    Aborted,

    /// The supplied root instance can't stand in for the root type.
    RootTypeMismatch {
        /// Declared root type.
        expected: String,
        /// Type of the supplied instance.
        actual: String,
    },
    /// The invoker failed to create an instance.
    Construction {
        /// The type being constructed.
        ty: String,
        /// The invoker's error.
        source: InvokeError,
    },
    /// None of the constructors is satisfied by the members written so far.
    NoMatchingConstructor {
        /// The type being constructed.
        ty: String,
    },
    /// The named factory method doesn't exist with that many arguments.
    NoFactoryMethod {
        /// The declaring type.
        ty: String,
        /// Requested factory name.
        name: String,
        /// Number of arguments supplied.
        arity: usize,
    },
    /// A read-only constructor-argument member wasn't used by the chosen
    /// constructor, so its value can't be applied.
    UnusedConstructorArgument {
        /// The member.
        member: String,
    },

    /// A value couldn't be coerced to its target type.
    Coercion {
        /// Textual form of the value.
        value: String,
        /// The value's type, or `(null)` when it has none.
        source_type: String,
        /// The target type.
        target: String,
        /// Why the converter rejected the value, if one was tried.
        reason: Option<ConvertError>,
    },

    /// A forward reference could not be resolved once the root completed.
    UnresolvedReference {
        /// The missing name.
        name: String,
    },

    /// A member operation failed in the invoker.
    Invoker {
        /// What was being done, e.g. `set`.
        operation: &'static str,
        /// Member or type the operation targeted.
        target: String,
        /// The invoker's error.
        source: InvokeError,
    },
    /// A name was registered twice in the same scope.
    DuplicateName {
        /// The name.
        name: String,
    },
    /// A markup extension failed to provide its value.
    ProvideValue {
        /// The markup extension's type.
        ty: String,
        /// The provider's error.
        source: BoxError,
    },
    /// A lifecycle hook failed.
    Hook {
        /// The hook that failed.
        hook: &'static str,
        /// The hook's error.
        source: BoxError,
    },
    /// A deferring loader failed on a captured subtree.
    DeferredLoad {
        /// The deferring member.
        member: String,
        /// The loader's error.
        source: BoxError,
    },
}

impl WriterErrorKind {
    /// The broad class of failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WriterErrorKind::UnexpectedEvent { .. }
            | WriterErrorKind::DuplicateMember { .. }
            | WriterErrorKind::NullGetObject { .. }
            | WriterErrorKind::Aborted => ErrorCategory::GrammarViolation,
            WriterErrorKind::Construction {
                source: InvokeError::Custom(_),
                ..
            } => ErrorCategory::InvokerFailure,
            WriterErrorKind::RootTypeMismatch { .. }
            | WriterErrorKind::Construction { .. }
            | WriterErrorKind::NoMatchingConstructor { .. }
            | WriterErrorKind::NoFactoryMethod { .. }
            | WriterErrorKind::UnusedConstructorArgument { .. } => {
                ErrorCategory::ConstructionFailure
            }
            WriterErrorKind::Coercion { .. } => ErrorCategory::CoercionFailure,
            WriterErrorKind::UnresolvedReference { .. } => {
                ErrorCategory::UnresolvedReferenceFailure
            }
            WriterErrorKind::Invoker { .. }
            | WriterErrorKind::DuplicateName { .. }
            | WriterErrorKind::ProvideValue { .. }
            | WriterErrorKind::Hook { .. }
            | WriterErrorKind::DeferredLoad { .. } => ErrorCategory::InvokerFailure,
        }
    }

    /// Returns an error code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            WriterErrorKind::UnexpectedEvent { .. } => "weft::unexpected_event",
            WriterErrorKind::DuplicateMember { .. } => "weft::duplicate_member",
            WriterErrorKind::NullGetObject { .. } => "weft::null_get_object",
            WriterErrorKind::Aborted => "weft::aborted",
            WriterErrorKind::RootTypeMismatch { .. } => "weft::root_type_mismatch",
            WriterErrorKind::Construction { .. } => "weft::construction",
            WriterErrorKind::NoMatchingConstructor { .. } => "weft::no_matching_constructor",
            WriterErrorKind::NoFactoryMethod { .. } => "weft::no_factory_method",
            WriterErrorKind::UnusedConstructorArgument { .. } => "weft::unused_constructor_argument",
            WriterErrorKind::Coercion { .. } => "weft::coercion",
            WriterErrorKind::UnresolvedReference { .. } => "weft::unresolved_reference",
            WriterErrorKind::Invoker { .. } => "weft::invoker",
            WriterErrorKind::DuplicateName { .. } => "weft::duplicate_name",
            WriterErrorKind::ProvideValue { .. } => "weft::provide_value",
            WriterErrorKind::Hook { .. } => "weft::hook",
            WriterErrorKind::DeferredLoad { .. } => "weft::deferred_load",
        }
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriterErrorKind::Construction { source, .. } | WriterErrorKind::Invoker { source, .. } => {
                Some(source)
            }
            WriterErrorKind::Coercion {
                reason: Some(reason),
                ..
            } => Some(reason),
            WriterErrorKind::ProvideValue { source, .. }
            | WriterErrorKind::Hook { source, .. }
            | WriterErrorKind::DeferredLoad { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Display for WriterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterErrorKind::UnexpectedEvent { event, reason } => {
                write!(f, "unexpected {event}: {reason}")
            }
            WriterErrorKind::DuplicateMember { member, ty } => {
                write!(f, "member '{member}' is already written to current type '{ty}'")
            }
            WriterErrorKind::NullGetObject { member } => {
                write!(f, "the value for member '{member}' is null")
            }
            WriterErrorKind::Aborted => {
                f.write_str("the build was aborted by an earlier error")
            }
            WriterErrorKind::RootTypeMismatch { expected, actual } => {
                write!(f, "root object instance of type '{actual}' is not assignable to '{expected}'")
            }
            WriterErrorKind::Construction { ty, source } => {
                write!(f, "could not create an instance of '{ty}': {source}")
            }
            WriterErrorKind::NoMatchingConstructor { ty } => {
                write!(f, "could not find a constructor for '{ty}' based on the supplied members")
            }
            WriterErrorKind::NoFactoryMethod { ty, name, arity } => write!(
                f,
                "factory method '{name}' taking {arity} argument(s) was not found on type '{ty}'"
            ),
            WriterErrorKind::UnusedConstructorArgument { member } => {
                write!(f, "member '{member}' is read-only and not used by any constructor")
            }
            WriterErrorKind::Coercion {
                value,
                source_type,
                target,
                reason,
            } => {
                write!(
                    f,
                    "value '{value}' (of type {source_type}) is not of or convertible to type {target}"
                )?;
                if let Some(reason) = reason {
                    write!(f, ": {reason}")?;
                }
                Ok(())
            }
            WriterErrorKind::UnresolvedReference { name } => {
                write!(f, "unresolved object reference '{name}'")
            }
            WriterErrorKind::Invoker {
                operation,
                target,
                source,
            } => write!(f, "{operation} on '{target}' failed: {source}"),
            WriterErrorKind::DuplicateName { name } => {
                write!(f, "name '{name}' is already registered in this name scope")
            }
            WriterErrorKind::ProvideValue { ty, source } => {
                write!(f, "markup extension '{ty}' failed to provide a value: {source}")
            }
            WriterErrorKind::Hook { hook, source } => write!(f, "{hook} hook failed: {source}"),
            WriterErrorKind::DeferredLoad { member, source } => {
                write!(f, "deferred content of member '{member}' failed to load: {source}")
            }
        }
    }
}
