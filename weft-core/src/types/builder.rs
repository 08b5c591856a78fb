use std::sync::Arc;

use super::{ConstructorDesc, FactoryMethod, MemberDesc, ParamDesc, TypeDesc, TypeFlags, TypeName};
use crate::{DynamicInvoker, Invoker, MarkupExtension, ValueConverter};

/// Builder for [`TypeDesc`].
///
/// Types start with a parameterless constructor and the
/// [`DynamicInvoker`], which keeps instances in the object graph arena:
///
/// ```
/// use weft_core::{MemberDesc, TypeDesc, TypeName, language};
///
/// let person = TypeDesc::builder(TypeName::new("urn:people", "Person"))
///     .member(MemberDesc::builder("Name", language::name("String")).build())
///     .name_member("Name")
///     .build();
/// assert!(person.aliased_name_member().is_some());
/// ```
pub struct TypeBuilder {
    desc: TypeDesc,
}

impl TypeBuilder {
    pub(crate) fn new(name: TypeName) -> Self {
        Self {
            desc: TypeDesc {
                name,
                flags: TypeFlags::empty(),
                base: None,
                members: Vec::new(),
                constructors: vec![ConstructorDesc::default()],
                factory_methods: Vec::new(),
                key_type: None,
                item_type: None,
                converter: None,
                markup_extension: None,
                return_type: None,
                name_member: None,
                invoker: Arc::new(DynamicInvoker),
            },
        }
    }

    /// Add classification flags.
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.desc.flags |= flags;
        self
    }

    /// Derive from `base`.
    pub fn base(mut self, base: TypeName) -> Self {
        self.desc.base = Some(base);
        self
    }

    /// Declare a member; this type becomes its declaring type.
    pub fn member(mut self, mut member: MemberDesc) -> Self {
        member.set_declaring_type(self.desc.name.clone());
        self.desc.members.push(Arc::new(member));
        self
    }

    /// Declare a constructor taking `params` in order.
    pub fn constructor(mut self, params: impl IntoIterator<Item = ParamDesc>) -> Self {
        let ctor = ConstructorDesc::new(params);
        if !self.desc.constructors.contains(&ctor) {
            self.desc.constructors.push(ctor);
        }
        self
    }

    /// Remove the parameterless constructor.
    pub fn without_default_constructor(mut self) -> Self {
        self.desc.constructors.retain(|c| c.arity() > 0);
        self
    }

    /// Declare a static factory method.
    pub fn factory_method(mut self, method: FactoryMethod) -> Self {
        self.desc.factory_methods.push(method);
        self
    }

    /// Make this a collection of `item` values.
    pub fn collection_of(mut self, item: TypeName) -> Self {
        self.desc.flags |= TypeFlags::COLLECTION;
        self.desc.item_type = Some(item);
        self
    }

    /// Make this a dictionary from `key` to `item` values.
    pub fn dictionary_of(mut self, key: TypeName, item: TypeName) -> Self {
        self.desc.flags |= TypeFlags::DICTIONARY;
        self.desc.key_type = Some(key);
        self.desc.item_type = Some(item);
        self
    }

    /// Convert other values into this type with `converter`. The type becomes
    /// a content value.
    pub fn converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.desc.flags |= TypeFlags::CONTENT_VALUE;
        self.desc.converter = Some(converter);
        self
    }

    /// Make this a markup extension providing values of `returns`.
    pub fn markup_extension(mut self, provider: Arc<dyn MarkupExtension>, returns: TypeName) -> Self {
        self.desc.flags |= TypeFlags::MARKUP_EXTENSION;
        self.desc.markup_extension = Some(provider);
        self.desc.return_type = Some(returns);
        self
    }

    /// Alias the `Name` directive to the member called `member`.
    pub fn name_member(mut self, member: impl Into<String>) -> Self {
        self.desc.name_member = Some(member.into());
        self
    }

    /// Perform instance operations through `invoker`.
    pub fn invoker(mut self, invoker: Arc<dyn Invoker>) -> Self {
        self.desc.invoker = invoker;
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> TypeDesc {
        self.desc
    }
}
