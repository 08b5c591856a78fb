use std::fmt;
use std::sync::Arc;

use crate::{DeferringLoader, TypeName, ValueConverter};

bitflags::bitflags! {
    /// Capability flags of a member.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        /// The member has no setter. Read-only collection members are
        /// populated in place instead of assigned.
        const READ_ONLY = 1 << 0;
        /// The member's value feeds a constructor parameter.
        const CONSTRUCTOR_ARGUMENT = 1 << 1;
    }
}

/// Members defined by the markup language itself rather than by a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Collection items or dictionary entries of the current object.
    Items,
    /// Constructor arguments given positionally.
    PositionalParameters,
    /// Arguments for a constructor or factory method.
    Arguments,
    /// The whole value of the object, given as content.
    Initialization,
    /// Dictionary key of the current object.
    Key,
    /// Name registered in the name scope.
    Name,
    /// Name of a static factory method used instead of a constructor.
    FactoryMethod,
    /// Base URI of the document fragment.
    Base,
    /// Unique identifier for localization; ignored by materialization.
    Uid,
}

impl Directive {
    /// Every directive, in declaration order.
    pub const ALL: [Directive; 9] = [
        Directive::Items,
        Directive::PositionalParameters,
        Directive::Arguments,
        Directive::Initialization,
        Directive::Key,
        Directive::Name,
        Directive::FactoryMethod,
        Directive::Base,
        Directive::Uid,
    ];

    /// The directive's member name.
    pub const fn name(self) -> &'static str {
        match self {
            Directive::Items => "_Items",
            Directive::PositionalParameters => "_PositionalParameters",
            Directive::Arguments => "Arguments",
            Directive::Initialization => "_Initialization",
            Directive::Key => "Key",
            Directive::Name => "Name",
            Directive::FactoryMethod => "FactoryMethod",
            Directive::Base => "Base",
            Directive::Uid => "Uid",
        }
    }

    /// Local name of the intrinsic type of the directive's value.
    pub(crate) const fn value_type(self) -> &'static str {
        match self {
            Directive::Items | Directive::PositionalParameters | Directive::Arguments => "List",
            Directive::Initialization | Directive::Key => "Object",
            Directive::Name | Directive::FactoryMethod | Directive::Base | Directive::Uid => {
                "String"
            }
        }
    }
}

/// Shared handle to a member descriptor.
pub type MemberRef = Arc<MemberDesc>;

/// Metadata about one member (property, attribute, or directive).
///
/// Members compare equal when they have the same name, declaring type and
/// directive tag.
pub struct MemberDesc {
    name: String,
    declaring_type: Option<TypeName>,
    value_type: TypeName,
    flags: MemberFlags,
    directive: Option<Directive>,
    converter: Option<Arc<dyn ValueConverter>>,
    deferring_loader: Option<Arc<dyn DeferringLoader>>,
}

impl MemberDesc {
    /// Start building a member holding values of `value_type`.
    pub fn builder(name: impl Into<String>, value_type: TypeName) -> MemberBuilder {
        MemberBuilder {
            member: MemberDesc {
                name: name.into(),
                declaring_type: None,
                value_type,
                flags: MemberFlags::empty(),
                directive: None,
                converter: None,
                deferring_loader: None,
            },
        }
    }

    pub(crate) fn for_directive(directive: Directive, value_type: TypeName) -> Self {
        MemberDesc {
            directive: Some(directive),
            ..MemberDesc::builder(directive.name(), value_type).member
        }
    }

    pub(crate) fn set_declaring_type(&mut self, ty: TypeName) {
        self.declaring_type = Some(ty);
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type declaring this member; `None` for directives.
    pub fn declaring_type(&self) -> Option<&TypeName> {
        self.declaring_type.as_ref()
    }

    /// Type of the member's value.
    pub fn value_type(&self) -> &TypeName {
        &self.value_type
    }

    /// Capability flags.
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Whether the member has no setter.
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(MemberFlags::READ_ONLY)
    }

    /// Whether the member feeds a constructor parameter.
    pub fn is_constructor_argument(&self) -> bool {
        self.flags.contains(MemberFlags::CONSTRUCTOR_ARGUMENT)
    }

    /// The directive this member stands for, if any.
    pub fn directive(&self) -> Option<Directive> {
        self.directive
    }

    /// Whether this member is a language directive.
    pub fn is_directive(&self) -> bool {
        self.directive.is_some()
    }

    /// Whether this member is the given directive.
    pub fn is(&self, directive: Directive) -> bool {
        self.directive == Some(directive)
    }

    /// Member-specific converter, taking precedence over the value type's.
    pub fn converter(&self) -> Option<&Arc<dyn ValueConverter>> {
        self.converter.as_ref()
    }

    /// Loader that materializes this member's content lazily.
    pub fn deferring_loader(&self) -> Option<&Arc<dyn DeferringLoader>> {
        self.deferring_loader.as_ref()
    }
}

impl PartialEq for MemberDesc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.declaring_type == other.declaring_type
            && self.directive == other.directive
    }
}

impl Eq for MemberDesc {}

impl fmt::Display for MemberDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.directive, &self.declaring_type) {
            (Some(_), _) => write!(f, "x:{}", self.name),
            (None, Some(ty)) => write!(f, "{}.{}", ty.name, self.name),
            (None, None) => f.write_str(&self.name),
        }
    }
}

impl fmt::Debug for MemberDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDesc")
            .field("member", &format_args!("{self}"))
            .field("value_type", &format_args!("{}", self.value_type))
            .field("flags", &self.flags)
            .field("deferred", &self.deferring_loader.is_some())
            .finish()
    }
}

/// Builder for [`MemberDesc`].
pub struct MemberBuilder {
    member: MemberDesc,
}

impl MemberBuilder {
    /// Mark the member as having no setter.
    pub fn read_only(mut self) -> Self {
        self.member.flags |= MemberFlags::READ_ONLY;
        self
    }

    /// Mark the member as feeding a constructor parameter.
    pub fn constructor_argument(mut self) -> Self {
        self.member.flags |= MemberFlags::CONSTRUCTOR_ARGUMENT;
        self
    }

    /// Use `converter` for values written to this member.
    pub fn converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.member.converter = Some(converter);
        self
    }

    /// Capture this member's content and hand it to `loader` instead of
    /// materializing it.
    pub fn deferring_loader(mut self, loader: Arc<dyn DeferringLoader>) -> Self {
        self.member.deferring_loader = Some(loader);
        self
    }

    /// Finish the member. Its declaring type is filled in when it is added to
    /// a [`TypeBuilder`](crate::TypeBuilder).
    pub fn build(self) -> MemberDesc {
        self.member
    }
}
