//! The frame-stack state machine that turns node events into objects.

use std::mem;
use std::sync::Arc;

use indexmap::IndexMap;
use weft_core::{
    BoxError, Directive, Graph, MemberDesc, MemberRef, NamespaceDeclaration, SchemaContext,
    ServiceContext, TypeName, TypeRef, Value, create_instance, invoker_for,
};

use crate::coerce::coerce;
use crate::frame::{FrameFlags, FrameValue, MemberFrame, ObjectFrame};
use crate::name_scope::{FixupTarget, NameFixup};
use crate::tracing_macros::{debug, trace, trace_span};
use crate::{
    LifecycleHooks, NameResolver, NameScope, SharedNameScope, WriterError, WriterErrorKind,
    WriterSettings,
};

/// The [`ServiceContext`] the engine hands to capabilities.
pub(crate) struct Services {
    schema: Arc<SchemaContext>,
    graph: Graph,
    namespaces: IndexMap<String, String>,
    scope: SharedNameScope,
}

impl ServiceContext for Services {
    fn schema(&self) -> &SchemaContext {
        &self.schema
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<String> {
        self.namespaces.get(prefix).cloned()
    }

    fn find_name(&self, name: &str) -> Option<Value> {
        self.scope.lock().find(name)
    }
}

fn unexpected(event: &'static str, reason: &'static str) -> WriterError {
    WriterErrorKind::UnexpectedEvent { event, reason }.into()
}

fn is_item_directive(member: &MemberDesc) -> bool {
    member.is(Directive::Items)
        || member.is(Directive::PositionalParameters)
        || member.is(Directive::Arguments)
}

pub(crate) struct Engine {
    services: Services,
    frames: Vec<ObjectFrame>,
    fixups: Vec<NameFixup>,
    hooks: Option<Box<dyn LifecycleHooks>>,
    resolver: Option<Arc<dyn NameResolver>>,
    root_instance: Option<Value>,
    result: Option<Value>,
}

impl Engine {
    pub fn new(schema: Arc<SchemaContext>, settings: WriterSettings) -> Self {
        let scope = match settings.external_name_scope {
            Some(external) if settings.register_names_on_external_scope => external,
            Some(external) => NameScope::with_parent(external).shared(),
            None => NameScope::new().shared(),
        };
        Self {
            services: Services {
                schema,
                graph: settings.graph.unwrap_or_default(),
                namespaces: IndexMap::new(),
                scope,
            },
            frames: Vec::new(),
            fixups: Vec::new(),
            hooks: settings.hooks,
            resolver: settings.name_resolver,
            root_instance: settings.root_object_instance,
            result: None,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn has_open_member(&self) -> bool {
        self.frames.last().is_some_and(|frame| frame.member.is_some())
    }

    pub fn graph(&self) -> &Graph {
        &self.services.graph
    }

    pub fn scope(&self) -> &SharedNameScope {
        &self.services.scope
    }

    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    pub fn into_parts(self) -> (Graph, Option<Value>, SharedNameScope) {
        (self.services.graph, self.result, self.services.scope)
    }

    fn top(&self, event: &'static str) -> Result<&ObjectFrame, WriterError> {
        match self.frames.last() {
            Some(frame) => Ok(frame),
            None if self.is_complete() => Err(unexpected(event, "the root object is already complete")),
            None => Err(unexpected(event, "no object is open")),
        }
    }

    fn top_mut(&mut self, event: &'static str) -> Result<&mut ObjectFrame, WriterError> {
        let complete = self.is_complete();
        match self.frames.last_mut() {
            Some(frame) => Ok(frame),
            None if complete => Err(unexpected(event, "the root object is already complete")),
            None => Err(unexpected(event, "no object is open")),
        }
    }

    fn open_member_mut(&mut self, event: &'static str) -> Result<&mut MemberFrame, WriterError> {
        self.top_mut(event)?
            .member
            .as_mut()
            .ok_or_else(|| unexpected(event, "no member is open"))
    }

    fn resolve(&self, name: Option<&TypeName>) -> Option<TypeRef> {
        name.and_then(|name| self.services.schema.resolve(name))
    }

    fn coerce_to(
        &mut self,
        member: Option<&MemberDesc>,
        target: Option<&TypeName>,
        value: Value,
    ) -> Result<Value, WriterError> {
        let target = self.resolve(target);
        coerce(&mut self.services, member, target.as_ref(), value)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn start_object(&mut self, ty: TypeRef) -> Result<(), WriterError> {
        trace_span!("start_object", ty = %ty.name());
        trace!(depth = self.frames.len(), "StartObject");

        let mut frame = ObjectFrame::new(ty.clone(), FrameFlags::STARTED | FrameFlags::ENGINE_CREATED);
        match self.frames.last() {
            Some(parent) => match &parent.member {
                None => return Err(unexpected("StartObject", "no member is open on the current object")),
                Some(open) if open.has_value() => {
                    return Err(WriterErrorKind::DuplicateMember {
                        member: open.member.to_string(),
                        ty: parent.ty.name().to_string(),
                    }
                    .into());
                }
                Some(_) => {}
            },
            None if self.is_complete() => {
                return Err(unexpected("StartObject", "the root object is already complete"));
            }
            None => {
                if let Some(instance) = self.root_instance.take() {
                    let schema = &self.services.schema;
                    if !schema.is_assignable(&instance, &self.services.graph, &ty) {
                        let actual = schema
                            .type_of(&instance, &self.services.graph)
                            .map(|t| t.name().to_string())
                            .unwrap_or_else(|| "(null)".to_string());
                        return Err(WriterErrorKind::RootTypeMismatch {
                            expected: ty.name().to_string(),
                            actual,
                        }
                        .into());
                    }
                    debug!(%instance, "adopting root object instance");
                    frame.flags.remove(FrameFlags::ENGINE_CREATED);
                    frame.set_instance(instance);
                }
            }
        }
        self.frames.push(frame);

        if !ty.is_content_value() {
            self.instantiate("StartObject", true, false)?;
        }
        self.notify_instance("StartObject")
    }

    pub fn get_object(&mut self) -> Result<(), WriterError> {
        trace!(depth = self.frames.len(), "GetObject");

        let parent = self.top("GetObject")?;
        let member = match &parent.member {
            None => return Err(unexpected("GetObject", "no member is open on the current object")),
            Some(open) if open.has_value() => {
                return Err(WriterErrorKind::DuplicateMember {
                    member: open.member.to_string(),
                    ty: parent.ty.name().to_string(),
                }
                .into());
            }
            Some(open) => open.member.clone(),
        };
        self.instantiate("GetObject", false, true)?;

        let parent = self.top("GetObject")?;
        let (parent_ty, parent_instance) = (parent.ty.clone(), parent.instance());
        let invoker = invoker_for(&self.services, &parent_instance, &parent_ty);
        let value = invoker
            .get_value(&self.services, &parent_instance, &member)
            .map_err(|source| WriterErrorKind::Invoker {
                operation: "get",
                target: member.to_string(),
                source,
            })?;
        if value.is_null() {
            return Err(WriterErrorKind::NullGetObject {
                member: member.to_string(),
            }
            .into());
        }

        let ty = self
            .services
            .schema
            .type_of(&value, &self.services.graph)
            .or_else(|| self.resolve(Some(member.value_type())))
            .unwrap_or_else(|| self.services.schema.object_type().clone());
        let mut frame = ObjectFrame::new(ty, FrameFlags::empty());
        frame.set_instance(value);
        self.frames.push(frame);
        Ok(())
    }

    pub fn start_member(&mut self, member: MemberRef) -> Result<(), WriterError> {
        trace!(member = %member, "StartMember");

        let frame = self.top_mut("StartMember")?;
        if frame.member.is_some() {
            return Err(unexpected("StartMember", "a member is already open"));
        }
        if frame.seen.contains(&member) {
            return Err(WriterErrorKind::DuplicateMember {
                member: member.to_string(),
                ty: frame.ty.name().to_string(),
            }
            .into());
        }
        frame.seen.push(member.clone());
        frame.member = Some(MemberFrame::new(member.clone()));

        if member.is(Directive::PositionalParameters) || member.is(Directive::Arguments) {
            let saved = mem::take(&mut frame.value);
            frame.value = FrameValue::Arguments {
                saved: Box::new(saved),
                args: Vec::new(),
            };
        } else if !member.is_directive() {
            self.instantiate("StartMember", false, false)?;
        }
        Ok(())
    }

    pub fn value(&mut self, value: Value) -> Result<(), WriterError> {
        trace!(%value, "Value");

        let frame = self.top("Value")?;
        match &frame.member {
            None => {
                if frame.is_instantiated() {
                    return Err(unexpected("Value", "the current object already has a value"));
                }
                let ty = frame.ty.clone();
                let value = coerce(&mut self.services, None, Some(&ty), value)?;
                self.top_mut("Value")?.set_instance(value);
                return self.notify_instance("Value");
            }
            Some(open) if open.has_value() => {
                return Err(WriterErrorKind::DuplicateMember {
                    member: open.member.to_string(),
                    ty: frame.ty.name().to_string(),
                }
                .into());
            }
            Some(_) => {}
        }

        match value {
            Value::ForwardRef(reference) => {
                self.defer_reference("Value", reference.names().to_vec(), None)
            }
            value => self.store_typed_value("Value", value, None),
        }
    }

    pub fn end_member(&mut self) -> Result<(), WriterError> {
        let frame = self.top_mut("EndMember")?;
        let open = frame
            .member
            .take()
            .ok_or_else(|| unexpected("EndMember", "no member is open"))?;
        let ty = frame.ty.clone();
        let member = open.member;
        trace!(member = %member, "EndMember");

        match member.directive() {
            Some(directive @ (Directive::PositionalParameters | Directive::Arguments)) => {
                let FrameValue::Arguments { saved, args } = mem::take(&mut frame.value) else {
                    return Err(unexpected("EndMember", "argument list was not collected"));
                };
                frame.value = *saved;
                self.construct_from_arguments(args, directive == Directive::Arguments)
            }
            Some(Directive::FactoryMethod) => {
                frame.factory_method = open.value.as_ref().and_then(|v| v.as_str()).map(String::from);
                Ok(())
            }
            Some(Directive::Name) => {
                let Some(Value::String(name)) = open.value else {
                    return Ok(());
                };
                self.register_name(name.clone())?;
                match ty.aliased_name_member() {
                    Some(alias) => self.apply_member(alias.clone(), Value::String(name)),
                    None => Ok(()),
                }
            }
            // Initialization, Key, Base, Uid, Items: nothing left to do
            Some(_) => Ok(()),
            None => {
                let Some(value) = open.value else {
                    return Ok(());
                };
                if ty.aliased_name_member() == Some(&member) {
                    if let Some(name) = value.as_str() {
                        self.register_name(name.to_string())?;
                    }
                }
                self.apply_member(member, value)
            }
        }
    }

    pub fn end_object(&mut self) -> Result<(), WriterError> {
        let frame = self.top("EndObject")?;
        if frame.member.is_some() {
            return Err(unexpected("EndObject", "a member is still open"));
        }
        self.instantiate("EndObject", false, true)?;

        let Some(frame) = self.frames.pop() else {
            return Err(unexpected("EndObject", "no object is open"));
        };
        trace_span!("end_object", ty = %frame.ty.name());
        let instance = frame.instance();

        let mut value = instance.clone();
        if frame.ty.is_markup_extension() {
            if let Some(provider) = frame.ty.markup_extension().cloned() {
                value = provider
                    .provide_value(&mut self.services, &instance)
                    .map_err(|source| WriterErrorKind::ProvideValue {
                        ty: frame.ty.name().to_string(),
                        source,
                    })?;
                trace!(%value, "markup extension provided value");
            }
        }

        if frame.flags.contains(FrameFlags::ENGINE_CREATED) && !value.is_null() {
            self.notify("after properties", &value, |hooks, ctx, v| {
                hooks.after_properties(ctx, v)
            })?;
        }

        if !self.frames.is_empty() {
            match &value {
                Value::ForwardRef(reference) => {
                    let names = reference.names().to_vec();
                    self.defer_reference("EndObject", names, frame.key.clone())?;
                }
                _ => self.store_typed_value("EndObject", value.clone(), frame.key.clone())?,
            }
        }

        if frame.flags.contains(FrameFlags::INITIALIZING) {
            let invoker = invoker_for(&self.services, &instance, &frame.ty);
            invoker
                .end_init(&mut self.services, &instance)
                .map_err(|source| WriterErrorKind::Invoker {
                    operation: "end-init",
                    target: frame.ty.name().to_string(),
                    source,
                })?;
            self.notify("after end-init", &instance, |hooks, ctx, v| {
                hooks.after_end_init(ctx, v)
            })?;
        }

        if self.frames.is_empty() {
            // a failed fix-up leaves the build without a result
            self.resolve_fixups()?;
            debug!(result = %value, "root object complete");
            self.result = Some(value);
        }
        Ok(())
    }

    pub fn namespace(&mut self, decl: NamespaceDeclaration) {
        trace!(prefix = %decl.prefix, namespace = %decl.namespace, "NamespaceDeclaration");
        self.services.namespaces.insert(decl.prefix, decl.namespace);
    }

    /// Store a deferring loader's result as the open member's value.
    pub fn store_deferred(&mut self, value: Value) -> Result<(), WriterError> {
        self.open_member_mut("EndMember")?.value = Some(value);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Instantiation
    // ------------------------------------------------------------------

    /// Instantiate the current object unless it has to wait: for constructor
    /// arguments (unless `required`), or for `x:FactoryMethod` / `x:Arguments`
    /// (when `wait_for_directives`).
    fn instantiate(
        &mut self,
        event: &'static str,
        wait_for_directives: bool,
        required: bool,
    ) -> Result<(), WriterError> {
        let frame = self.top(event)?;
        if frame.is_instantiated() {
            return Ok(());
        }
        let ty = frame.ty.clone();
        if (ty.construction_requires_arguments() && !required)
            || (wait_for_directives && ty.has_construction_directives())
        {
            trace!(ty = %ty.name(), "instantiation deferred");
            return Ok(());
        }

        if let Some(factory) = frame.factory_method.clone() {
            let instance = self.call_factory(&ty, &factory, Vec::new())?;
            self.finish_instantiation(event, instance.clone())?;
            return self.apply_written(event, &ty, &instance, &[]);
        }

        if !ty.construction_requires_arguments() {
            let instance = self.construct(&ty, Vec::new())?;
            self.finish_instantiation(event, instance.clone())?;
            return self.apply_written(event, &ty, &instance, &[]);
        }

        let (args, consumed): (Vec<Value>, Vec<MemberRef>) = ty
            .sorted_constructor_arguments(&frame.written)
            .ok_or_else(|| WriterErrorKind::NoMatchingConstructor {
                ty: ty.name().to_string(),
            })?
            .1
            .into_iter()
            .map(|(member, value)| (value.clone(), member.clone()))
            .unzip();
        trace!(ty = %ty.name(), arity = args.len(), "constructing from written members");
        let instance = self.construct(&ty, args)?;
        self.finish_instantiation(event, instance.clone())?;
        self.apply_written(event, &ty, &instance, &consumed)
    }

    /// Assign the members written before the instance existed, skipping
    /// those `consumed` by its constructor.
    fn apply_written(
        &mut self,
        event: &'static str,
        ty: &TypeRef,
        instance: &Value,
        consumed: &[MemberRef],
    ) -> Result<(), WriterError> {
        let written = mem::take(&mut self.top_mut(event)?.written);
        for (member, value) in written {
            if consumed.contains(&member) {
                continue;
            }
            if member.is_read_only() {
                if member.is_constructor_argument() {
                    return Err(WriterErrorKind::UnusedConstructorArgument {
                        member: member.to_string(),
                    }
                    .into());
                }
                continue;
            }
            self.set_member(ty, instance, &member, value)?;
        }
        Ok(())
    }

    fn construct(&mut self, ty: &TypeRef, args: Vec<Value>) -> Result<Value, WriterError> {
        trace!(ty = %ty.name(), arity = args.len(), "creating instance");
        create_instance(&mut self.services, ty, args).map_err(|source| {
            WriterErrorKind::Construction {
                ty: ty.name().to_string(),
                source,
            }
            .into()
        })
    }

    fn call_factory(
        &mut self,
        ty: &TypeRef,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, WriterError> {
        let method = ty.factory_method(name, args.len()).cloned().ok_or_else(|| {
            WriterErrorKind::NoFactoryMethod {
                ty: ty.name().to_string(),
                name: name.to_string(),
                arity: args.len(),
            }
        })?;
        trace!(ty = %ty.name(), factory = name, "calling factory method");
        method
            .invoke(&mut self.services, args)
            .map_err(|source| {
                WriterErrorKind::Construction {
                    ty: ty.name().to_string(),
                    source,
                }
                .into()
            })
    }

    fn construct_from_arguments(
        &mut self,
        args: Vec<Value>,
        allow_factory: bool,
    ) -> Result<(), WriterError> {
        let frame = self.top("EndMember")?;
        let ty = frame.ty.clone();
        let factory = frame.factory_method.clone().filter(|_| allow_factory);

        let instance = match factory {
            Some(name) => self.call_factory(&ty, &name, args)?,
            None => {
                let ctor = ty.constructor_with_arity(args.len()).cloned().ok_or_else(|| {
                    WriterErrorKind::Construction {
                        ty: ty.name().to_string(),
                        source: weft_core::InvokeError::NoConstructor {
                            ty: ty.name().to_string(),
                            arity: args.len(),
                        },
                    }
                })?;
                let mut typed = Vec::with_capacity(args.len());
                for (param, arg) in ctor.params.iter().zip(args) {
                    let member = ty.member(&param.member).cloned();
                    typed.push(self.coerce_to(member.as_deref(), Some(&param.ty), arg)?);
                }
                self.construct(&ty, typed)?
            }
        };
        self.finish_instantiation("EndMember", instance.clone())?;
        self.apply_written("EndMember", &ty, &instance, &[])
    }

    /// Record the new instance, run begin-init, and fire whatever
    /// notifications are now due.
    fn finish_instantiation(
        &mut self,
        event: &'static str,
        instance: Value,
    ) -> Result<(), WriterError> {
        let frame = self.top_mut(event)?;
        frame.set_instance(instance.clone());
        let ty = frame.ty.clone();

        if ty.supports_initialize() {
            let invoker = invoker_for(&self.services, &instance, &ty);
            invoker
                .begin_init(&mut self.services, &instance)
                .map_err(|source| WriterErrorKind::Invoker {
                    operation: "begin-init",
                    target: ty.name().to_string(),
                    source,
                })?;
            self.top_mut(event)?.flags |= FrameFlags::INITIALIZING;
            self.notify("after begin-init", &instance, |hooks, ctx, v| {
                hooks.after_begin_init(ctx, v)
            })?;
        }
        self.notify_instance(event)
    }

    /// Fire `before_properties`, bind waiting fix-ups and register a pending
    /// name, once the current object has an instance.
    fn notify_instance(&mut self, event: &'static str) -> Result<(), WriterError> {
        let frame = self.top_mut(event)?;
        if !frame.is_instantiated() {
            return Ok(());
        }
        let instance = frame.instance();
        let pending_name = frame.pending_name.take();
        let pending_fixups = mem::take(&mut frame.pending_fixups);
        let due = frame.flags.contains(FrameFlags::STARTED)
            && !frame.flags.contains(FrameFlags::PROPERTIES_BEGUN);
        if due {
            frame.flags |= FrameFlags::PROPERTIES_BEGUN;
            self.notify("before properties", &instance, |hooks, ctx, v| {
                hooks.before_properties(ctx, v)
            })?;
        }
        for index in pending_fixups {
            if let Some(fixup) = self.fixups.get_mut(index) {
                fixup.target.instance = instance.clone();
            }
        }
        if let Some(name) = pending_name {
            self.register(name, instance)?;
        }
        Ok(())
    }

    fn notify(
        &mut self,
        hook: &'static str,
        instance: &Value,
        f: impl FnOnce(&mut dyn LifecycleHooks, &dyn ServiceContext, &Value) -> Result<(), BoxError>,
    ) -> Result<(), WriterError> {
        let Some(hooks) = self.hooks.as_mut() else {
            return Ok(());
        };
        f(&mut **hooks, &self.services, instance)
            .map_err(|source| WriterErrorKind::Hook { hook, source }.into())
    }

    // ------------------------------------------------------------------
    // Storing values
    // ------------------------------------------------------------------

    /// Route `value` into the open member of the current object.
    fn store_typed_value(
        &mut self,
        event: &'static str,
        value: Value,
        key: Option<Value>,
    ) -> Result<(), WriterError> {
        let frame = self.top(event)?;
        let ty = frame.ty.clone();
        let member = frame
            .member
            .as_ref()
            .map(|open| open.member.clone())
            .ok_or_else(|| unexpected(event, "no member is open"))?;

        match member.directive() {
            Some(Directive::Initialization) => {
                let value = coerce(&mut self.services, None, Some(&ty), value)?;
                self.top_mut(event)?.set_instance(value);
                self.notify_instance(event)
            }
            // coerced to the parent dictionary's key type when the entry is added
            Some(Directive::Key) => {
                self.top_mut(event)?.key = Some(value);
                Ok(())
            }
            Some(Directive::Items | Directive::PositionalParameters | Directive::Arguments) => {
                self.add_item(event, value, key)
            }
            Some(_) => {
                let value = self.coerce_to(Some(&member), Some(member.value_type()), value)?;
                self.open_member_mut(event)?.value = Some(value);
                Ok(())
            }
            None if !member.is_read_only() || member.is_constructor_argument() => {
                let target = if ty.aliased_name_member() == Some(&member) {
                    self.services.schema.string_type().name().clone()
                } else {
                    member.value_type().clone()
                };
                let value = self.coerce_to(Some(&member), Some(&target), value)?;
                self.open_member_mut(event)?.value = Some(value);
                Ok(())
            }
            None => self.merge_into_read_only(event, &member, value),
        }
    }

    fn add_item(
        &mut self,
        event: &'static str,
        value: Value,
        key: Option<Value>,
    ) -> Result<(), WriterError> {
        if let FrameValue::Arguments { args, .. } = &mut self.top_mut(event)?.value {
            args.push(value);
            return Ok(());
        }
        self.instantiate(event, false, true)?;
        let frame = self.top(event)?;
        let (ty, instance) = (frame.ty.clone(), frame.instance());
        self.add_to(&ty, &instance, value, key)
    }

    /// Add `value` to a collection, or under `key` to a dictionary.
    fn add_to(
        &mut self,
        ty: &TypeRef,
        instance: &Value,
        value: Value,
        key: Option<Value>,
    ) -> Result<(), WriterError> {
        let invoker = invoker_for(&self.services, instance, ty);
        if ty.is_dictionary() {
            let key = self.coerce_to(None, ty.key_type(), key.unwrap_or_default())?;
            let item = self.coerce_to(None, ty.item_type(), value)?;
            trace!(%key, %item, "adding dictionary entry");
            invoker
                .add_to_dictionary(&mut self.services, instance, key, item)
                .map_err(|source| {
                    WriterErrorKind::Invoker {
                        operation: "add to dictionary",
                        target: ty.name().to_string(),
                        source,
                    }
                    .into()
                })
        } else {
            let item = self.coerce_to(None, ty.item_type(), value)?;
            trace!(%item, "adding collection item");
            invoker
                .add_to_collection(&mut self.services, instance, item)
                .map_err(|source| {
                    WriterErrorKind::Invoker {
                        operation: "add to collection",
                        target: ty.name().to_string(),
                        source,
                    }
                    .into()
                })
        }
    }

    /// Values written to a read-only member go into the collection or
    /// dictionary it already holds.
    fn merge_into_read_only(
        &mut self,
        event: &'static str,
        member: &MemberRef,
        value: Value,
    ) -> Result<(), WriterError> {
        self.instantiate(event, false, true)?;
        let frame = self.top(event)?;
        let (ty, instance) = (frame.ty.clone(), frame.instance());
        let invoker = invoker_for(&self.services, &instance, &ty);
        let existing = invoker
            .get_value(&self.services, &instance, member)
            .map_err(|source| WriterErrorKind::Invoker {
                operation: "get",
                target: member.to_string(),
                source,
            })?;
        if existing == value {
            return Ok(());
        }
        match self.services.schema.type_of(&existing, &self.services.graph) {
            Some(existing_ty) if existing_ty.is_collection() || existing_ty.is_dictionary() => {
                self.add_to(&existing_ty, &existing, value, None)
            }
            _ => {
                trace!(member = %member, "ignoring value for read-only member");
                Ok(())
            }
        }
    }

    /// Assign a finished member value, or keep it until the instance exists.
    fn apply_member(&mut self, member: MemberRef, value: Value) -> Result<(), WriterError> {
        let frame = self.top_mut("EndMember")?;
        if !frame.is_instantiated() {
            frame.written.push((member, value));
            return Ok(());
        }
        if member.is_read_only() {
            return Ok(());
        }
        let (ty, instance) = (frame.ty.clone(), frame.instance());
        self.set_member(&ty, &instance, &member, value)
    }

    fn set_member(
        &mut self,
        ty: &TypeRef,
        instance: &Value,
        member: &MemberDesc,
        value: Value,
    ) -> Result<(), WriterError> {
        if let Some(hooks) = self.hooks.as_mut() {
            let handled = hooks
                .set_value(&mut self.services, instance, member, &value)
                .map_err(|source| WriterErrorKind::Hook {
                    hook: "set value",
                    source,
                })?;
            if handled {
                trace!(member = %member, "assignment handled by hook");
                return Ok(());
            }
        }
        let invoker = invoker_for(&self.services, instance, ty);
        invoker
            .set_value(&mut self.services, instance, member, value)
            .map_err(|source| {
                WriterErrorKind::Invoker {
                    operation: "set",
                    target: member.to_string(),
                    source,
                }
                .into()
            })
    }

    // ------------------------------------------------------------------
    // Names and forward references
    // ------------------------------------------------------------------

    fn register_name(&mut self, name: String) -> Result<(), WriterError> {
        let frame = self.top_mut("EndMember")?;
        if !frame.is_instantiated() {
            trace!(%name, "name waits for the instance");
            frame.pending_name = Some(name);
            return Ok(());
        }
        let instance = frame.instance();
        self.register(name, instance)
    }

    fn register(&mut self, name: String, instance: Value) -> Result<(), WriterError> {
        trace!(%name, %instance, "registering name");
        if self.services.scope.lock().register(name.clone(), instance) {
            Ok(())
        } else {
            Err(WriterErrorKind::DuplicateName { name }.into())
        }
    }

    /// Remember that the open member of the current object is waiting for
    /// `names`. Objects still collecting constructor arguments stay
    /// unconstructed; the fix-up is bound to the instance once it exists.
    fn defer_reference(
        &mut self,
        event: &'static str,
        names: Vec<String>,
        key: Option<Value>,
    ) -> Result<(), WriterError> {
        let frame = self.top(event)?;
        if matches!(frame.value, FrameValue::Arguments { .. }) {
            let placeholder = Value::ForwardRef(weft_core::ForwardRef::new(names));
            return self.add_item(event, placeholder, key);
        }
        let member = frame
            .member
            .as_ref()
            .map(|open| open.member.clone())
            .ok_or_else(|| unexpected(event, "no member is open"))?;
        let is_item = is_item_directive(&member);
        if is_item {
            self.instantiate(event, false, true)?;
        }

        let index = self.fixups.len();
        let frame = self.top_mut(event)?;
        let (parent_type, instance) = (frame.ty.clone(), frame.instance());
        if !frame.is_instantiated() {
            trace!(member = %member, "forward reference waits for the instance");
            frame.pending_fixups.push(index);
        }
        if let Some(open) = frame.member.as_mut().filter(|_| !is_item) {
            open.fixup_pending = true;
        }
        debug!(?names, member = %member, "forward reference recorded");
        self.fixups.push(NameFixup {
            names,
            target: FixupTarget {
                parent_type,
                member,
                instance,
                key,
            },
        });
        Ok(())
    }

    fn resolve_fixups(&mut self) -> Result<(), WriterError> {
        let fixups = mem::take(&mut self.fixups);
        if fixups.is_empty() {
            return Ok(());
        }
        trace_span!("resolve_fixups", count = fixups.len());

        for NameFixup { names, target } in fixups {
            for name in names {
                let registered = self.services.scope.lock().find(&name);
                let resolved = match registered {
                    Some(value) => Some(value),
                    None => self.resolver.as_ref().and_then(|r| r.resolve(&name)),
                };
                let Some(value) = resolved else {
                    return Err(WriterErrorKind::UnresolvedReference { name }.into());
                };
                trace!(%name, %value, member = %target.member, "resolved forward reference");

                if is_item_directive(&target.member) {
                    self.add_to(&target.parent_type, &target.instance, value, target.key.clone())?;
                } else {
                    self.set_member(&target.parent_type, &target.instance, &target.member, value)?;
                }
            }
        }
        Ok(())
    }
}
