//! Type registry, assignability and the built-in capabilities.

use std::sync::Arc;

use weft_core::{
    DynamicInvoker, Graph, InitState, InvokeError, Invoker, MemberDesc, ParamDesc, SchemaContext,
    ServiceContext, StandaloneContext, TypeDesc, TypeFlags, TypeName, Value, create_instance,
    language,
};
use weft_testhelpers::test;

const NS: &str = "urn:zoo";

fn zoo() -> SchemaContext {
    let mut schema = SchemaContext::new();
    schema.register(
        TypeDesc::builder(TypeName::new(NS, "Animal"))
            .flags(TypeFlags::ABSTRACT)
            .build(),
    );
    schema.register(
        TypeDesc::builder(TypeName::new(NS, "Cat"))
            .base(TypeName::new(NS, "Animal"))
            .member(MemberDesc::builder("Lives", language::name("Integer")).build())
            .build(),
    );
    schema.register(
        TypeDesc::builder(TypeName::new(NS, "Cats"))
            .collection_of(TypeName::new(NS, "Cat"))
            .build(),
    );
    schema.register(
        TypeDesc::builder(TypeName::new(NS, "Keeper"))
            .flags(TypeFlags::SUPPORTS_INITIALIZE)
            .member(
                MemberDesc::builder("Name", language::name("String"))
                    .constructor_argument()
                    .build(),
            )
            .member(
                MemberDesc::builder("Cats", TypeName::new(NS, "Cats"))
                    .read_only()
                    .build(),
            )
            .constructor([ParamDesc::new("Name", language::name("String"))])
            .without_default_constructor()
            .build(),
    );
    schema
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn intrinsics_are_preregistered() {
    let schema = SchemaContext::new();
    for local in ["Object", "String", "Integer", "Double", "Boolean", "Type", "List"] {
        assert!(
            schema.get(language::LANGUAGE_NAMESPACE, local).is_some(),
            "{local} missing"
        );
    }
    assert!(schema.string_type().is_content_value());
    assert!(schema.string_type().is_nullable());
    assert!(!schema.integer_type().is_nullable());
}

#[test]
fn assignability_follows_base_chain() {
    let schema = zoo();
    let cat = schema.get(NS, "Cat").unwrap();
    let animal = schema.get(NS, "Animal").unwrap();
    let keeper = schema.get(NS, "Keeper").unwrap();

    assert!(schema.can_assign(&cat, &animal));
    assert!(!schema.can_assign(&animal, &cat));
    assert!(!schema.can_assign(&cat, &keeper));
    assert!(schema.can_assign(&keeper, schema.object_type()));
}

#[test]
fn type_of_scalars() {
    let schema = SchemaContext::new();
    let graph = Graph::new();
    assert_eq!(
        schema.type_of(&Value::from(3), &graph).as_ref(),
        Some(schema.integer_type())
    );
    assert_eq!(schema.type_of(&Value::Null, &graph), None);
    assert!(schema.is_assignable(&Value::from("x"), &graph, schema.object_type()));
    assert!(!schema.is_assignable(&Value::from("x"), &graph, schema.integer_type()));
}

#[test]
fn construction_directive_queries() {
    let schema = zoo();
    let cat = schema.get(NS, "Cat").unwrap();
    let keeper = schema.get(NS, "Keeper").unwrap();

    assert!(!cat.construction_requires_arguments());
    assert!(!cat.has_construction_directives());
    assert!(keeper.construction_requires_arguments());
    assert!(keeper.has_construction_directives());
    assert!(schema.type_extension_type().has_positional_parameters());
    assert!(schema.type_extension_type().has_construction_directives());
}

#[test]
fn unqualified_names_fall_back_to_local_lookup() {
    let schema = zoo();
    let mut graph = Graph::new();
    let ctx = StandaloneContext::new(&schema, &mut graph).with_namespace("z", NS);

    assert_eq!(ctx.resolve_type("z:Cat").unwrap().name().name, "Cat");
    assert_eq!(ctx.resolve_type("Keeper").unwrap().name().namespace, NS);
    assert!(ctx.resolve_type("q:Cat").is_none());
}

// ============================================================================
// DynamicInvoker
// ============================================================================

#[test]
fn constructor_arguments_land_in_members() {
    let schema = zoo();
    let keeper = schema.get(NS, "Keeper").unwrap();
    let mut graph = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut graph);

    let instance = create_instance(&mut ctx, &keeper, vec![Value::from("Ann")]).unwrap();
    let object = ctx.graph().object(&instance).unwrap();
    assert_eq!(object.member("Name"), Some(&Value::from("Ann")));

    // the read-only collection exists already
    let cats = object.member("Cats").cloned().unwrap();
    assert_eq!(ctx.graph().object(&cats).unwrap().ty().name().name, "Cats");
}

#[test]
fn missing_constructor_and_abstract_types_fail() {
    let schema = zoo();
    let mut graph = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut graph);

    let keeper = schema.get(NS, "Keeper").unwrap();
    let err = create_instance(&mut ctx, &keeper, vec![]).unwrap_err();
    insta::assert_snapshot!(err, @"type '{urn:zoo}Keeper' has no constructor taking 0 argument(s)");

    let animal = schema.get(NS, "Animal").unwrap();
    assert!(matches!(
        create_instance(&mut ctx, &animal, vec![]),
        Err(InvokeError::AbstractType { .. })
    ));
}

#[test]
fn collections_and_dictionaries() {
    let mut schema = zoo();
    let registry = schema.register(
        TypeDesc::builder(TypeName::new(NS, "Registry"))
            .dictionary_of(language::name("String"), TypeName::new(NS, "Cat"))
            .build(),
    );
    let cats = schema.get(NS, "Cats").unwrap();
    let mut graph = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut graph);

    let list = create_instance(&mut ctx, &cats, vec![]).unwrap();
    DynamicInvoker
        .add_to_collection(&mut ctx, &list, Value::from(1))
        .unwrap();
    assert!(matches!(
        DynamicInvoker.add_to_dictionary(&mut ctx, &list, Value::from("a"), Value::Null),
        Err(InvokeError::NotADictionary { .. })
    ));

    let dict = create_instance(&mut ctx, &registry, vec![]).unwrap();
    DynamicInvoker
        .add_to_dictionary(&mut ctx, &dict, Value::from("tom"), Value::from(1))
        .unwrap();
    let err = DynamicInvoker
        .add_to_dictionary(&mut ctx, &dict, Value::from("tom"), Value::from(2))
        .unwrap_err();
    assert!(matches!(err, InvokeError::DuplicateKey { ref key, .. } if key == "tom"));

    let object = ctx.graph().object(&dict).unwrap();
    assert_eq!(object.entry(&Value::from("tom")), Some(&Value::from(1)));
    assert_eq!(ctx.graph().object(&list).unwrap().items(), &[Value::from(1)]);
}

#[test]
fn init_state_is_tracked_for_supporting_types() {
    let schema = zoo();
    let keeper = schema.get(NS, "Keeper").unwrap();
    let mut graph = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut graph);

    let instance = create_instance(&mut ctx, &keeper, vec![Value::from("Bo")]).unwrap();
    let invoker = keeper.invoker().clone();
    invoker.begin_init(&mut ctx, &instance).unwrap();
    assert_eq!(
        ctx.graph().object(&instance).unwrap().init_state(),
        InitState::Initializing
    );
    invoker.end_init(&mut ctx, &instance).unwrap();
    assert_eq!(
        ctx.graph().object(&instance).unwrap().init_state(),
        InitState::Initialized
    );
}

#[test]
fn content_eq_ignores_handles() {
    let schema = zoo();
    let cat = schema.get(NS, "Cat").unwrap();

    let mut left = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut left);
    let _padding = create_instance(&mut ctx, &cat, vec![]).unwrap();
    let a = create_instance(&mut ctx, &cat, vec![]).unwrap();
    let lives = cat.member("Lives").unwrap().clone();
    DynamicInvoker.set_value(&mut ctx, &a, &lives, Value::from(9)).unwrap();

    let mut right = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut right);
    let b = create_instance(&mut ctx, &cat, vec![]).unwrap();
    DynamicInvoker.set_value(&mut ctx, &b, &lives, Value::from(9)).unwrap();

    assert_ne!(a, b);
    assert!(left.content_eq(&a, &right, &b));

    let mut ctx = StandaloneContext::new(&schema, &mut right);
    DynamicInvoker.set_value(&mut ctx, &b, &lives, Value::from(8)).unwrap();
    assert!(!left.content_eq(&a, &right, &b));
}

// ============================================================================
// Converters and markup extensions
// ============================================================================

#[test]
fn builtin_converters() {
    let schema = SchemaContext::new();
    let mut graph = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut graph);

    let convert = |ctx: &mut StandaloneContext<'_>, ty: &Arc<TypeDesc>, v: Value| {
        let converter = ty.converter().unwrap().clone();
        assert!(converter.can_convert_from(&v));
        converter.convert_from(ctx, &v)
    };

    assert_eq!(
        convert(&mut ctx, &schema.integer_type().clone(), Value::from(" 42 ")),
        Ok(Value::Int(42))
    );
    assert_eq!(
        convert(&mut ctx, &schema.double_type().clone(), Value::from(2)),
        Ok(Value::Float(2.0))
    );
    assert_eq!(
        convert(&mut ctx, &schema.boolean_type().clone(), Value::from("TRUE")),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        convert(&mut ctx, &schema.string_type().clone(), Value::from(1.5)),
        Ok(Value::from("1.5"))
    );
    let err = convert(&mut ctx, &schema.integer_type().clone(), Value::from("x")).unwrap_err();
    insta::assert_snapshot!(err, @"'x' is not an integer: invalid digit found in string");
}

#[test]
fn markup_extension_providers() {
    let schema = zoo();
    let mut graph = Graph::new();
    let mut ctx = StandaloneContext::new(&schema, &mut graph).with_namespace("z", NS);

    let type_ext = schema.type_extension_type().clone();
    let ext = create_instance(&mut ctx, &type_ext, vec![Value::from("z:Cat")]).unwrap();
    let provided = type_ext
        .markup_extension()
        .unwrap()
        .provide_value(&mut ctx, &ext)
        .unwrap();
    assert_eq!(provided, Value::Type(schema.get(NS, "Cat").unwrap()));

    let reference = schema.get(language::LANGUAGE_NAMESPACE, "Reference").unwrap();
    let r = create_instance(&mut ctx, &reference, vec![Value::from("tom")]).unwrap();
    let provider = reference.markup_extension().unwrap().clone();
    assert_eq!(
        provider.provide_value(&mut ctx, &r).unwrap(),
        Value::ForwardRef(weft_core::ForwardRef::new(["tom"]))
    );

    ctx.register_name("tom", Value::from(7));
    assert_eq!(provider.provide_value(&mut ctx, &r).unwrap(), Value::from(7));
}
