//! Lifecycle hooks, initialization and deferred member content.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Stream, shape, shapes};
use parking_lot::Mutex;
use weft_core::{
    BoxError, DeferringLoader, Directive, InitState, MemberDesc, NodeList, ServiceContext,
    TemplateLoader, TypeDesc, Value, language,
};
use weft_testhelpers::test;
use weft_writer::{ErrorCategory, LifecycleHooks, WriterSettings, materialize};

// ============================================================================
// Hooks
// ============================================================================

#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
    intercept: Option<&'static str>,
}

impl Recorder {
    fn record(&self, event: &str, ctx: &dyn ServiceContext, instance: &Value) {
        let what = ctx
            .graph()
            .object(instance)
            .map(|object| object.ty().name().name.clone())
            .unwrap_or_else(|| instance.to_string());
        self.log.lock().push(format!("{event} {what}"));
    }
}

impl LifecycleHooks for Recorder {
    fn before_properties(&mut self, ctx: &dyn ServiceContext, instance: &Value) -> Result<(), BoxError> {
        self.record("before properties", ctx, instance);
        Ok(())
    }

    fn after_properties(&mut self, ctx: &dyn ServiceContext, instance: &Value) -> Result<(), BoxError> {
        self.record("after properties", ctx, instance);
        Ok(())
    }

    fn after_begin_init(&mut self, ctx: &dyn ServiceContext, instance: &Value) -> Result<(), BoxError> {
        self.record("after begin-init", ctx, instance);
        Ok(())
    }

    fn after_end_init(&mut self, ctx: &dyn ServiceContext, instance: &Value) -> Result<(), BoxError> {
        self.record("after end-init", ctx, instance);
        Ok(())
    }

    fn set_value(
        &mut self,
        _ctx: &mut dyn ServiceContext,
        _instance: &Value,
        member: &MemberDesc,
        value: &Value,
    ) -> Result<bool, BoxError> {
        self.log.lock().push(format!("set {}={value}", member.name()));
        Ok(self.intercept == Some(member.name()))
    }
}

#[test]
fn hooks_fire_in_construction_order() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema)
        .start("Panel")
        .member("Panel", "Children")
        .get_object()
        .directive(Directive::Items)
        .start("Person")
        .set("Person", "Name", "Ann")
        .end()
        .end_member()
        .end()
        .end_member()
        .end();

    let recorder = Recorder::default();
    let settings = WriterSettings::new().hooks(Box::new(recorder.clone()));
    let built = materialize(schema, stream.events(), settings).unwrap();

    let log = recorder.log.lock().clone();
    insta::assert_debug_snapshot!(log, @r#"
    [
        "after begin-init Panel",
        "before properties Panel",
        "before properties Person",
        "set Name=Ann",
        "after properties Person",
        "after properties Panel",
        "after end-init Panel",
    ]
    "#);
    let panel = built.graph.object(&built.root).unwrap();
    assert_eq!(panel.init_state(), InitState::Initialized);
}

#[test]
fn set_value_hook_can_take_over_assignment() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema)
        .start("Person")
        .set("Person", "Name", "Ann")
        .set("Person", "Age", 5)
        .end();

    let recorder = Recorder {
        intercept: Some("Age"),
        ..Recorder::default()
    };
    let settings = WriterSettings::new().hooks(Box::new(recorder.clone()));
    let built = materialize(schema, stream.events(), settings).unwrap();

    let person = built.graph.object(&built.root).unwrap();
    assert_eq!(person.member("Name"), Some(&Value::from("Ann")));
    assert_eq!(person.member("Age"), None);
    assert!(recorder.log.lock().contains(&"set Age=5".to_string()));
}

#[test]
fn failing_hook_aborts() {
    struct Grumpy;

    impl LifecycleHooks for Grumpy {
        fn after_properties(&mut self, _ctx: &dyn ServiceContext, _instance: &Value) -> Result<(), BoxError> {
            Err("not today".into())
        }
    }

    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema).start("Person").end();
    let settings = WriterSettings::new().hooks(Box::new(Grumpy));

    let err = materialize(schema, stream.events(), settings).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvokerFailure);
    insta::assert_snapshot!(err, @"after properties hook failed: not today");
}

#[test]
fn failing_markup_extension_aborts() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema)
        .start("Slot")
        .member("Slot", "Kind")
        .start("TypeExtension")
        .directive(Directive::PositionalParameters)
        .value(5)
        .end_member()
        .end()
        .end_member()
        .end();

    let err = materialize(schema, stream.events(), WriterSettings::new()).unwrap_err();
    assert_eq!(err.code(), "weft::provide_value");
    insta::assert_snapshot!(err, @"markup extension '{urn:weft:language}TypeExtension' failed to provide a value: '5' does not name a type");
}

// ============================================================================
// Deferred content
// ============================================================================

#[derive(Default)]
struct CountingLoader {
    calls: AtomicUsize,
}

impl DeferringLoader for CountingLoader {
    fn load(&self, nodes: NodeList, ctx: &mut dyn ServiceContext) -> Result<Value, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TemplateLoader.load(nodes, ctx)
    }
}

struct FailingLoader;

impl DeferringLoader for FailingLoader {
    fn load(&self, _nodes: NodeList, _ctx: &mut dyn ServiceContext) -> Result<Value, BoxError> {
        Err("boom".into())
    }
}

fn lazy_schema(loader: Arc<dyn DeferringLoader>) -> Arc<weft_core::SchemaContext> {
    let mut schema = shapes();
    schema.register(
        TypeDesc::builder(shape("Lazy"))
            .member(
                MemberDesc::builder("Body", language::name("Template"))
                    .deferring_loader(loader)
                    .build(),
            )
            .build(),
    );
    Arc::new(schema)
}

fn lazy_person(schema: &Arc<weft_core::SchemaContext>) -> Stream {
    Stream::new(schema)
        .start("Lazy")
        .member("Lazy", "Body")
        .start("Person")
        .set("Person", "Name", "Inner")
        .member("Person", "Tags")
        .get_object()
        .directive(Directive::Items)
        .value("x")
        .end_member()
        .end()
        .end_member()
        .end()
        .end_member()
        .end()
}

#[test]
fn deferred_content_is_captured_not_materialized() {
    let loader = Arc::new(CountingLoader::default());
    let schema = lazy_schema(loader.clone());

    let built = materialize(
        schema.clone(),
        lazy_person(&schema).events(),
        WriterSettings::new(),
    )
    .unwrap();
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

    // nothing inside the member was built or named
    assert!(
        built
            .graph
            .iter()
            .all(|(_, object)| object.ty().name() != &shape("Person"))
    );
    assert!(built.names.lock().find("Inner").is_none());

    let lazy = built.graph.object(&built.root).unwrap();
    let template = lazy.member("Body").and_then(Value::as_template).unwrap();
    assert!(template.is_closed());
    assert_eq!(template.len(), 12);
}

#[test]
fn captured_content_replays_into_fresh_builds() {
    let schema = lazy_schema(Arc::new(TemplateLoader));
    let built = materialize(
        schema.clone(),
        lazy_person(&schema).events(),
        WriterSettings::new(),
    )
    .unwrap();
    let lazy = built.graph.object(&built.root).unwrap();
    let template = lazy.member("Body").and_then(Value::as_template).unwrap();

    for _ in 0..2 {
        let replayed =
            materialize(schema.clone(), template.reader().unwrap(), WriterSettings::new()).unwrap();
        let person = replayed.graph.object(&replayed.root).unwrap();
        assert_eq!(person.member("Name"), Some(&Value::from("Inner")));
        let tags = replayed.graph.object(person.member("Tags").unwrap()).unwrap();
        assert_eq!(tags.items(), &[Value::from("x")]);
    }
}

#[test]
fn failing_loader_aborts() {
    let schema = lazy_schema(Arc::new(FailingLoader));
    let err = materialize(
        schema.clone(),
        lazy_person(&schema).events(),
        WriterSettings::new(),
    )
    .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvokerFailure);
    insta::assert_snapshot!(err, @"deferred content of member 'Lazy.Body' failed to load: boom");
}

#[test]
fn unbalanced_deferred_content_fails() {
    let schema = lazy_schema(Arc::new(TemplateLoader));
    let stream = Stream::new(&schema).start("Lazy").member("Lazy", "Body").end();

    let err = materialize(schema, stream.events(), WriterSettings::new()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);
    insta::assert_snapshot!(err, @"unexpected EndObject: unbalanced deferred content");
}
