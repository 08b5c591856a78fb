//! Schema and stream builder shared by the writer tests.

#![allow(dead_code)]

use std::sync::Arc;

use weft_core::{
    Directive, FactoryMethod, ForwardRef, InvokeError, MemberDesc, NodeEvent, Object, ParamDesc,
    SchemaContext, ServiceContext, TemplateLoader, TypeDesc, TypeFlags, TypeName, TypeRef, Value,
    language,
};

pub const NS: &str = "urn:shapes";

pub fn shape(local: &str) -> TypeName {
    TypeName::new(NS, local)
}

fn make_color(ctx: &mut dyn ServiceContext, args: Vec<Value>) -> Result<Value, InvokeError> {
    let ty = ctx.schema().get(NS, "Color").expect("Color is registered");
    let mut object = Object::new(ty);
    for (channel, value) in ["R", "G", "B"].into_iter().zip(args) {
        object.set_member(channel, value);
    }
    Ok(Value::Object(ctx.graph_mut().alloc(object)))
}

fn make_gadget(ctx: &mut dyn ServiceContext, args: Vec<Value>) -> Result<Value, InvokeError> {
    let ty = ctx.schema().get(NS, "Gadget").expect("Gadget is registered");
    let made = args.into_iter().next().unwrap_or_else(|| Value::from("factory"));
    let mut object = Object::new(ty);
    object.set_member("Made", made);
    Ok(Value::Object(ctx.graph_mut().alloc(object)))
}

pub fn shapes() -> SchemaContext {
    let mut schema = SchemaContext::new();
    let integer = || language::name("Integer");
    let string = || language::name("String");

    schema.register(
        TypeDesc::builder(shape("Person"))
            .member(MemberDesc::builder("Name", string()).build())
            .member(MemberDesc::builder("Age", integer()).build())
            .member(MemberDesc::builder("Friend", shape("Person")).build())
            .member(
                MemberDesc::builder("Tags", language::name("List"))
                    .read_only()
                    .build(),
            )
            .name_member("Name")
            .build(),
    );
    schema.register(
        TypeDesc::builder(shape("Point"))
            .member(MemberDesc::builder("X", integer()).constructor_argument().build())
            .member(MemberDesc::builder("Y", integer()).constructor_argument().build())
            .member(
                MemberDesc::builder("Z", integer())
                    .read_only()
                    .constructor_argument()
                    .build(),
            )
            .member(MemberDesc::builder("Label", string()).build())
            .member(MemberDesc::builder("Anchor", language::name("Object")).build())
            .constructor([ParamDesc::new("X", integer()), ParamDesc::new("Y", integer())])
            .without_default_constructor()
            .build(),
    );
    schema.register(
        TypeDesc::builder(shape("Registry"))
            .dictionary_of(string(), language::name("Object"))
            .build(),
    );
    schema.register(
        TypeDesc::builder(shape("Color"))
            .member(MemberDesc::builder("R", integer()).build())
            .member(MemberDesc::builder("G", integer()).build())
            .member(MemberDesc::builder("B", integer()).build())
            .without_default_constructor()
            .factory_method(FactoryMethod::new("FromRgb", 3, make_color))
            .factory_method(FactoryMethod::new("Black", 0, make_color))
            .build(),
    );
    schema.register(
        TypeDesc::builder(shape("Gadget"))
            .member(MemberDesc::builder("Made", string()).build())
            .factory_method(FactoryMethod::new("Make", 0, make_gadget))
            .factory_method(FactoryMethod::new("Sized", 1, make_gadget))
            .build(),
    );
    schema.register(
        TypeDesc::builder(shape("Children"))
            .collection_of(language::name("Object"))
            .build(),
    );
    schema.register(
        TypeDesc::builder(shape("Panel"))
            .flags(TypeFlags::SUPPORTS_INITIALIZE)
            .member(
                MemberDesc::builder("Children", shape("Children"))
                    .read_only()
                    .build(),
            )
            .member(
                MemberDesc::builder("Template", language::name("Template"))
                    .deferring_loader(Arc::new(TemplateLoader))
                    .build(),
            )
            .build(),
    );
    schema.register(
        TypeDesc::builder(shape("Slot"))
            .member(MemberDesc::builder("Kind", language::name("Type")).build())
            .member(MemberDesc::builder("Target", language::name("Object")).build())
            .build(),
    );
    schema
}

/// Look a type up in the test namespace first, then among the intrinsics.
pub fn lookup(schema: &SchemaContext, local: &str) -> TypeRef {
    schema
        .get(NS, local)
        .or_else(|| schema.get(language::LANGUAGE_NAMESPACE, local))
        .unwrap_or_else(|| panic!("unknown type {local}"))
}

/// Builds node streams without spelling out every event.
pub struct Stream {
    schema: Arc<SchemaContext>,
    events: Vec<NodeEvent>,
}

impl Stream {
    pub fn new(schema: &Arc<SchemaContext>) -> Self {
        Self {
            schema: schema.clone(),
            events: Vec::new(),
        }
    }

    pub fn start(mut self, ty: &str) -> Self {
        let ty = lookup(&self.schema, ty);
        self.events.push(NodeEvent::StartObject(ty));
        self
    }

    pub fn member(mut self, ty: &str, name: &str) -> Self {
        let member = lookup(&self.schema, ty)
            .member(name)
            .cloned()
            .unwrap_or_else(|| panic!("unknown member {ty}.{name}"));
        self.events.push(NodeEvent::StartMember(member));
        self
    }

    pub fn directive(mut self, directive: Directive) -> Self {
        let member = self.schema.directive(directive).clone();
        self.events.push(NodeEvent::StartMember(member));
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.events.push(NodeEvent::Value(value.into()));
        self
    }

    pub fn reference(self, name: &str) -> Self {
        self.value(ForwardRef::new([name]))
    }

    pub fn get_object(mut self) -> Self {
        self.events.push(NodeEvent::GetObject);
        self
    }

    pub fn end_member(mut self) -> Self {
        self.events.push(NodeEvent::EndMember);
        self
    }

    pub fn end(mut self) -> Self {
        self.events.push(NodeEvent::EndObject);
        self
    }

    /// A whole member holding a single value.
    pub fn set(self, ty: &str, name: &str, value: impl Into<Value>) -> Self {
        self.member(ty, name).value(value).end_member()
    }

    pub fn events(self) -> Vec<NodeEvent> {
        self.events
    }
}
