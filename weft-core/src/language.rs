//! Types and directives defined by the markup language itself.

use std::sync::Arc;

use crate::{
    BooleanConverter, Directive, DoubleConverter, IntegerConverter, MemberDesc, MemberRef,
    NullExtensionProvider, ParamDesc, ReferenceProvider, ScalarInvoker, StringConverter,
    TypeDesc, TypeExtensionProvider, TypeFlags, TypeName, Value,
};

/// Namespace of the intrinsic types.
pub const LANGUAGE_NAMESPACE: &str = "urn:weft:language";

/// Qualified name of an intrinsic type.
pub fn name(local: &str) -> TypeName {
    TypeName::new(LANGUAGE_NAMESPACE, local)
}

pub(crate) fn intrinsic_types() -> Vec<TypeDesc> {
    let object = name("Object");
    let scalar = |local: &str, default: Value| {
        TypeDesc::builder(name(local)).invoker(Arc::new(ScalarInvoker::new(default)))
    };

    vec![
        TypeDesc::builder(object.clone())
            .flags(TypeFlags::NULLABLE)
            .build(),
        scalar("String", Value::String(String::new()))
            .flags(TypeFlags::NULLABLE)
            .converter(Arc::new(StringConverter))
            .build(),
        scalar("Integer", Value::Int(0))
            .converter(Arc::new(IntegerConverter))
            .build(),
        scalar("Double", Value::Float(0.0))
            .converter(Arc::new(DoubleConverter))
            .build(),
        scalar("Boolean", Value::Bool(false))
            .converter(Arc::new(BooleanConverter))
            .build(),
        scalar("Type", Value::Null)
            .flags(TypeFlags::NULLABLE)
            .build(),
        scalar("Template", Value::Null)
            .flags(TypeFlags::NULLABLE)
            .build(),
        TypeDesc::builder(name("List"))
            .flags(TypeFlags::NULLABLE)
            .collection_of(object.clone())
            .build(),
        TypeDesc::builder(name("TypeExtension"))
            .member(
                MemberDesc::builder("TypeName", object.clone())
                    .constructor_argument()
                    .build(),
            )
            .constructor([ParamDesc::new("TypeName", object.clone())])
            .markup_extension(Arc::new(TypeExtensionProvider), name("Type"))
            .build(),
        TypeDesc::builder(name("NullExtension"))
            .markup_extension(Arc::new(NullExtensionProvider), object.clone())
            .build(),
        TypeDesc::builder(name("Reference"))
            .member(
                MemberDesc::builder("Name", name("String"))
                    .constructor_argument()
                    .build(),
            )
            .constructor([ParamDesc::new("Name", name("String"))])
            .markup_extension(Arc::new(ReferenceProvider), object)
            .build(),
    ]
}

pub(crate) fn directive_members() -> Vec<MemberRef> {
    Directive::ALL
        .iter()
        .map(|&directive| Arc::new(MemberDesc::for_directive(directive, name(directive.value_type()))))
        .collect()
}
