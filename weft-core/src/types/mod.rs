//! Type and member descriptors.
//!
//! A [`TypeDesc`] is everything the materialization engine needs to know about
//! a type: how to construct it, which members it has, whether it is a
//! collection, dictionary, content value or markup extension, and which
//! [`Invoker`] performs the actual instance operations.

mod builder;
mod member;
mod name;

pub use builder::TypeBuilder;
pub use member::{Directive, MemberBuilder, MemberDesc, MemberFlags, MemberRef};
pub use name::TypeName;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{InvokeError, Invoker, MarkupExtension, ServiceContext, Value, ValueConverter};

bitflags::bitflags! {
    /// Classification flags of a type.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u16 {
        /// A missing value coerces to null rather than a default instance.
        const NULLABLE = 1 << 0;
        /// The type cannot be instantiated.
        const ABSTRACT = 1 << 1;
        /// Instances accept items.
        const COLLECTION = 1 << 2;
        /// Instances accept key/item entries.
        const DICTIONARY = 1 << 3;
        /// Instances provide a replacement value once populated.
        const MARKUP_EXTENSION = 1 << 4;
        /// Values are created directly from a single scalar.
        const CONTENT_VALUE = 1 << 5;
        /// Instances take part in the begin-init / end-init protocol.
        const SUPPORTS_INITIALIZE = 1 << 6;
    }
}

/// One constructor parameter, bound to the member whose value feeds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDesc {
    /// Name of the member supplying the argument.
    pub member: String,
    /// Declared parameter type.
    pub ty: TypeName,
}

impl ParamDesc {
    /// Create a parameter fed by `member`.
    pub fn new(member: impl Into<String>, ty: TypeName) -> Self {
        Self {
            member: member.into(),
            ty,
        }
    }
}

/// A constructor signature, parameters in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstructorDesc {
    /// Parameters in call order.
    pub params: Vec<ParamDesc>,
}

impl ConstructorDesc {
    /// Create a constructor with the given parameters.
    pub fn new(params: impl IntoIterator<Item = ParamDesc>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

type FactoryFn =
    dyn Fn(&mut dyn ServiceContext, Vec<Value>) -> Result<Value, InvokeError> + Send + Sync;

/// A static factory method usable in place of a constructor.
#[derive(Clone)]
pub struct FactoryMethod {
    name: String,
    arity: usize,
    func: Arc<FactoryFn>,
}

impl FactoryMethod {
    /// Declare a factory taking exactly `arity` arguments.
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        func: impl Fn(&mut dyn ServiceContext, Vec<Value>) -> Result<Value, InvokeError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Call the factory.
    pub fn invoke(
        &self,
        ctx: &mut dyn ServiceContext,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        (self.func)(ctx, args)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FactoryMethod({}/{})", self.name, self.arity)
    }
}

/// Shared handle to a type descriptor.
pub type TypeRef = Arc<TypeDesc>;

/// Metadata about a type. Built with [`TypeBuilder`], registered in a
/// [`SchemaContext`](crate::SchemaContext).
///
/// Types compare equal by name.
pub struct TypeDesc {
    name: TypeName,
    flags: TypeFlags,
    base: Option<TypeName>,
    members: Vec<MemberRef>,
    constructors: Vec<ConstructorDesc>,
    factory_methods: Vec<FactoryMethod>,
    key_type: Option<TypeName>,
    item_type: Option<TypeName>,
    converter: Option<Arc<dyn ValueConverter>>,
    markup_extension: Option<Arc<dyn MarkupExtension>>,
    return_type: Option<TypeName>,
    name_member: Option<String>,
    invoker: Arc<dyn Invoker>,
}

impl TypeDesc {
    /// Start building a type.
    pub fn builder(name: TypeName) -> TypeBuilder {
        TypeBuilder::new(name)
    }

    /// Qualified name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Classification flags.
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Whether a missing value coerces to null.
    pub fn is_nullable(&self) -> bool {
        self.flags.contains(TypeFlags::NULLABLE)
    }

    /// Whether the type cannot be instantiated.
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// Whether instances accept items.
    pub fn is_collection(&self) -> bool {
        self.flags.contains(TypeFlags::COLLECTION)
    }

    /// Whether instances accept key/item entries.
    pub fn is_dictionary(&self) -> bool {
        self.flags.contains(TypeFlags::DICTIONARY)
    }

    /// Whether instances provide a replacement value once populated.
    pub fn is_markup_extension(&self) -> bool {
        self.flags.contains(TypeFlags::MARKUP_EXTENSION)
    }

    /// Whether values are created directly from a single scalar.
    pub fn is_content_value(&self) -> bool {
        self.flags.contains(TypeFlags::CONTENT_VALUE)
    }

    /// Whether instances take part in the begin-init / end-init protocol.
    pub fn supports_initialize(&self) -> bool {
        self.flags.contains(TypeFlags::SUPPORTS_INITIALIZE)
    }

    /// Base type, if any. Every type implicitly derives from `Object`.
    pub fn base(&self) -> Option<&TypeName> {
        self.base.as_ref()
    }

    /// Declared members.
    pub fn members(&self) -> &[MemberRef] {
        &self.members
    }

    /// Look up a declared member by name.
    pub fn member(&self, name: &str) -> Option<&MemberRef> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Declared constructors.
    pub fn constructors(&self) -> &[ConstructorDesc] {
        &self.constructors
    }

    /// The constructor taking exactly `arity` arguments.
    pub fn constructor_with_arity(&self, arity: usize) -> Option<&ConstructorDesc> {
        self.constructors.iter().find(|c| c.arity() == arity)
    }

    /// Whether the type lacks a parameterless constructor.
    pub fn construction_requires_arguments(&self) -> bool {
        !self.is_abstract() && !self.constructors.iter().any(|c| c.arity() == 0)
    }

    /// Whether the type can be constructed from positional parameters.
    pub fn has_positional_parameters(&self) -> bool {
        self.is_markup_extension() && self.constructors.iter().any(|c| c.arity() > 0)
    }

    /// Whether `x:FactoryMethod` or `x:Arguments` could pick something other
    /// than the parameterless constructor.
    pub fn has_construction_directives(&self) -> bool {
        !self.factory_methods.is_empty() || self.constructors.iter().any(|c| c.arity() > 0)
    }

    /// Pick the widest constructor whose every parameter is supplied by one of
    /// the `written` constructor-argument members, returning the matching
    /// pairs in parameter order.
    pub fn sorted_constructor_arguments<'a>(
        &self,
        written: &'a [(MemberRef, Value)],
    ) -> Option<(&ConstructorDesc, Vec<&'a (MemberRef, Value)>)> {
        self.constructors
            .iter()
            .filter(|ctor| ctor.arity() > 0)
            .filter_map(|ctor| {
                let args = ctor
                    .params
                    .iter()
                    .map(|param| {
                        written.iter().find(|(member, _)| {
                            member.is_constructor_argument() && member.name() == param.member
                        })
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some((ctor, args))
            })
            .max_by_key(|(ctor, _)| ctor.arity())
    }

    /// Declared factory methods.
    pub fn factory_methods(&self) -> &[FactoryMethod] {
        &self.factory_methods
    }

    /// Find a factory method by name and argument count.
    pub fn factory_method(&self, name: &str, arity: usize) -> Option<&FactoryMethod> {
        self.factory_methods
            .iter()
            .find(|m| m.name == name && m.arity == arity)
    }

    /// Key type of a dictionary.
    pub fn key_type(&self) -> Option<&TypeName> {
        self.key_type.as_ref()
    }

    /// Item type of a collection or dictionary.
    pub fn item_type(&self) -> Option<&TypeName> {
        self.item_type.as_ref()
    }

    /// Converter creating values of this type from other values.
    pub fn converter(&self) -> Option<&Arc<dyn ValueConverter>> {
        self.converter.as_ref()
    }

    /// Provider of a markup extension's value.
    pub fn markup_extension(&self) -> Option<&Arc<dyn MarkupExtension>> {
        self.markup_extension.as_ref()
    }

    /// Type of the value a markup extension provides.
    pub fn return_type(&self) -> Option<&TypeName> {
        self.return_type.as_ref()
    }

    /// The member aliasing the `Name` directive.
    pub fn aliased_name_member(&self) -> Option<&MemberRef> {
        self.name_member
            .as_deref()
            .and_then(|name| self.member(name))
    }

    /// Instance operations for this type.
    pub fn invoker(&self) -> &Arc<dyn Invoker> {
        &self.invoker
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDesc {}

impl Hash for TypeDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDesc")
            .field("name", &format_args!("{}", self.name))
            .field("flags", &self.flags)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}
