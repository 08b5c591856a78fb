//! Event grammar, closing and root instances.

mod common;

use std::sync::Arc;

use common::{Stream, lookup, shapes};
use weft_core::{
    Directive, Graph, NodeWriter, SchemaContext, StandaloneContext, Value, create_instance,
};
use weft_testhelpers::test;
use weft_writer::{
    ErrorCategory, ObjectWriter, WriterError, WriterErrorKind, WriterSettings, materialize,
};

fn writer(schema: &Arc<SchemaContext>) -> ObjectWriter {
    ObjectWriter::new(schema.clone(), WriterSettings::new())
}

fn run(schema: &Arc<SchemaContext>, stream: Stream) -> WriterError {
    materialize(schema.clone(), stream.events(), WriterSettings::new()).unwrap_err()
}

// ============================================================================
// Grammar violations
// ============================================================================

#[test]
fn events_need_an_open_object() {
    let schema = Arc::new(shapes());

    let err = writer(&schema).write_value(Value::from(1)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);
    insta::assert_snapshot!(err, @"unexpected Value: no object is open");

    let err = writer(&schema).write_end_member().unwrap_err();
    insta::assert_snapshot!(err, @"unexpected EndMember: no object is open");

    let err = writer(&schema).write_get_object().unwrap_err();
    insta::assert_snapshot!(err, @"unexpected GetObject: no object is open");
}

#[test]
fn objects_need_an_open_member() {
    let schema = Arc::new(shapes());
    let err = run(&schema, Stream::new(&schema).start("Person").start("Person"));
    assert_eq!(err.code(), "weft::unexpected_event");
    insta::assert_snapshot!(err, @"unexpected StartObject: no member is open on the current object");
}

#[test]
fn members_do_not_nest() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema)
        .start("Person")
        .member("Person", "Name")
        .member("Person", "Age");
    insta::assert_snapshot!(run(&schema, stream), @"unexpected StartMember: a member is already open");
}

#[test]
fn end_object_with_open_member_fails() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema).start("Person").member("Person", "Name").end();
    insta::assert_snapshot!(run(&schema, stream), @"unexpected EndObject: a member is still open");
}

#[test]
fn only_one_root() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema).start("Person").end().start("Person");
    insta::assert_snapshot!(run(&schema, stream), @"unexpected StartObject: the root object is already complete");
}

#[test]
fn member_written_twice_fails() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema)
        .start("Person")
        .set("Person", "Age", 1)
        .set("Person", "Age", 2)
        .end();

    let err = run(&schema, stream);
    assert!(matches!(err.kind(), WriterErrorKind::DuplicateMember { .. }));
    insta::assert_snapshot!(err, @"member 'Person.Age' is already written to current type '{urn:shapes}Person'");
}

#[test]
fn second_value_for_a_member_fails() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema)
        .start("Person")
        .member("Person", "Age")
        .value(1)
        .value(2);
    assert_eq!(run(&schema, stream).code(), "weft::duplicate_member");
}

#[test]
fn object_in_a_member_that_has_a_value_fails() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema)
        .start("Person")
        .member("Person", "Friend")
        .reference("Bob")
        .start("Person");
    assert_eq!(run(&schema, stream).code(), "weft::duplicate_member");
}

#[test]
fn second_value_for_an_instantiated_object_fails() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema).start("String").value("a").value("b");
    insta::assert_snapshot!(run(&schema, stream), @"unexpected Value: the current object already has a value");
}

// ============================================================================
// Closing and failure
// ============================================================================

#[test]
fn close_ends_open_members_and_objects() {
    let schema = Arc::new(shapes());
    let mut writer = writer(&schema);
    writer.write_start_object(lookup(&schema, "Person")).unwrap();
    writer
        .write_start_member(lookup(&schema, "Person").member("Name").unwrap().clone())
        .unwrap();
    writer.write_value(Value::from("Ann")).unwrap();
    assert!(writer.result().is_none());

    writer.close().unwrap();
    assert!(writer.is_closed());
    let root = writer.result().cloned().unwrap();
    let person = writer.graph().object(&root).unwrap();
    assert_eq!(person.member("Name"), Some(&Value::from("Ann")));

    // closing again is harmless, writing is not
    writer.close().unwrap();
    let err = writer.write_end_object().unwrap_err();
    insta::assert_snapshot!(err, @"unexpected EndObject: the writer is closed");
}

#[test]
fn close_ends_open_deferred_capture() {
    let schema = Arc::new(shapes());
    let mut writer = writer(&schema);
    for event in Stream::new(&schema)
        .start("Panel")
        .member("Panel", "Template")
        .start("Person")
        .member("Person", "Name")
        .events()
    {
        writer.write_node(event).unwrap();
    }
    writer.close().unwrap();

    let root = writer.result().cloned().unwrap();
    let panel = writer.graph().object(&root).unwrap();
    let template = panel.member("Template").and_then(Value::as_template).unwrap();
    assert_eq!(template.len(), 4);
}

#[test]
fn first_error_aborts_the_build() {
    let schema = Arc::new(shapes());
    let mut writer = writer(&schema);
    writer.write_start_object(lookup(&schema, "Person")).unwrap();
    assert!(writer.write_end_member().is_err());

    let err = writer.write_end_object().unwrap_err();
    assert!(matches!(err.kind(), WriterErrorKind::Aborted));
    // closing a failed writer does nothing
    writer.close().unwrap();
    assert!(!writer.is_closed());
    assert!(writer.result().is_none());
}

#[test]
fn finish_without_root_fails() {
    let schema = Arc::new(shapes());
    let err = writer(&schema).finish().unwrap_err();
    insta::assert_snapshot!(err, @"unexpected close: no root object was written");
}

#[test]
fn namespace_declarations_are_accepted_anywhere() {
    let schema = Arc::new(shapes());
    let mut writer = writer(&schema);
    writer
        .write_namespace(weft_core::NamespaceDeclaration::new("s", common::NS))
        .unwrap();
    writer.write_start_object(lookup(&schema, "List")).unwrap();
    writer
        .write_namespace(weft_core::NamespaceDeclaration::new("t", common::NS))
        .unwrap();
    writer
        .write_start_member(schema.directive(Directive::Items).clone())
        .unwrap();
    writer.write_value(Value::from(1)).unwrap();
    let built = writer.finish().unwrap();
    assert_eq!(built.graph.object(&built.root).unwrap().items(), &[Value::Int(1)]);
}

// ============================================================================
// Root object instance
// ============================================================================

#[test]
fn root_instance_is_populated_in_place() {
    let schema = Arc::new(shapes());
    let mut graph = Graph::new();
    let existing = {
        let mut ctx = StandaloneContext::new(&schema, &mut graph);
        create_instance(&mut ctx, &lookup(&schema, "Person"), vec![]).unwrap()
    };

    let stream = Stream::new(&schema)
        .start("Person")
        .set("Person", "Age", 7)
        .end();
    let settings = WriterSettings::new()
        .graph(graph)
        .root_object_instance(existing.clone());
    let built = materialize(schema, stream.events(), settings).unwrap();

    assert_eq!(built.root, existing);
    let person = built.graph.object(&existing).unwrap();
    assert_eq!(person.member("Age"), Some(&Value::Int(7)));
}

#[test]
fn root_instance_of_wrong_type_fails() {
    let schema = Arc::new(shapes());
    let stream = Stream::new(&schema).start("Person").end();
    let settings = WriterSettings::new().root_object_instance(Value::from(5));

    let err = materialize(schema, stream.events(), settings).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::ConstructionFailure);
    insta::assert_snapshot!(err, @"root object instance of type '{urn:weft:language}Integer' is not assignable to '{urn:shapes}Person'");
}
