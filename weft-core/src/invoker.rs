//! Instance operations: construction, member access, collection population.
//!
//! The materialization engine never touches instances directly. Every
//! operation goes through the [`Invoker`] of the instance's [`TypeDesc`], so a
//! type can be backed by the graph arena ([`DynamicInvoker`]), by inline
//! scalars ([`ScalarInvoker`]), or by anything a host wants to plug in.

use std::sync::Arc;

use crate::tracing_macros::trace;
use crate::{
    InitState, InvokeError, MemberDesc, Object, ServiceContext, TypeDesc, TypeRef, Value,
};

/// Instance operations for one type.
pub trait Invoker: Send + Sync {
    /// Create an instance of `ty` from constructor arguments in declaration
    /// order.
    fn create_instance(
        &self,
        ctx: &mut dyn ServiceContext,
        ty: &TypeRef,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError>;

    /// Read a member; unset members read as [`Value::Null`].
    fn get_value(
        &self,
        ctx: &dyn ServiceContext,
        instance: &Value,
        member: &MemberDesc,
    ) -> Result<Value, InvokeError>;

    /// Assign a member.
    fn set_value(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
        member: &MemberDesc,
        value: Value,
    ) -> Result<(), InvokeError>;

    /// Append an item to a collection instance.
    fn add_to_collection(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
        item: Value,
    ) -> Result<(), InvokeError>;

    /// Add a keyed entry to a dictionary instance.
    fn add_to_dictionary(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
        key: Value,
        item: Value,
    ) -> Result<(), InvokeError>;

    /// Called once an instance exists and before its members are populated.
    fn begin_init(
        &self,
        _ctx: &mut dyn ServiceContext,
        _instance: &Value,
    ) -> Result<(), InvokeError> {
        Ok(())
    }

    /// Called once every member of the instance has been populated.
    fn end_init(&self, _ctx: &mut dyn ServiceContext, _instance: &Value) -> Result<(), InvokeError> {
        Ok(())
    }
}

/// Invoker storing instances as [`Object`]s in the service context's graph.
///
/// Constructor arguments are stored under the members their parameters name.
/// Read-only members whose type is a collection or dictionary are created
/// along with the instance, so they can be populated in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct DynamicInvoker;

fn not_an_object(instance: &Value) -> InvokeError {
    InvokeError::NotAnObject {
        value: instance.to_string(),
    }
}

fn object_mut<'g>(
    ctx: &'g mut dyn ServiceContext,
    instance: &Value,
) -> Result<&'g mut Object, InvokeError> {
    ctx.graph_mut()
        .object_mut(instance)
        .ok_or_else(|| not_an_object(instance))
}

impl Invoker for DynamicInvoker {
    fn create_instance(
        &self,
        ctx: &mut dyn ServiceContext,
        ty: &TypeRef,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        if ty.is_abstract() {
            return Err(InvokeError::AbstractType {
                ty: ty.name().to_string(),
            });
        }
        let ctor = ty
            .constructor_with_arity(args.len())
            .ok_or_else(|| InvokeError::NoConstructor {
                ty: ty.name().to_string(),
                arity: args.len(),
            })?;

        let mut object = Object::new(ty.clone());
        for (param, arg) in ctor.params.iter().zip(args) {
            object.set_member(param.member.clone(), arg);
        }

        for member in ty.members() {
            if !member.is_read_only() || object.member(member.name()).is_some() {
                continue;
            }
            let Some(member_ty) = ctx.schema().resolve(member.value_type()) else {
                continue;
            };
            if member_ty.is_collection() || member_ty.is_dictionary() {
                let invoker = member_ty.invoker().clone();
                let value = invoker.create_instance(ctx, &member_ty, Vec::new())?;
                object.set_member(member.name(), value);
            }
        }

        let id = ctx.graph_mut().alloc(object);
        trace!(ty = %ty.name(), %id, "created instance");
        Ok(Value::Object(id))
    }

    fn get_value(
        &self,
        ctx: &dyn ServiceContext,
        instance: &Value,
        member: &MemberDesc,
    ) -> Result<Value, InvokeError> {
        let object = ctx
            .graph()
            .object(instance)
            .ok_or_else(|| not_an_object(instance))?;
        Ok(object.member(member.name()).cloned().unwrap_or_default())
    }

    fn set_value(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
        member: &MemberDesc,
        value: Value,
    ) -> Result<(), InvokeError> {
        object_mut(ctx, instance)?.set_member(member.name(), value);
        Ok(())
    }

    fn add_to_collection(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
        item: Value,
    ) -> Result<(), InvokeError> {
        let object = object_mut(ctx, instance)?;
        if !object.ty().is_collection() {
            return Err(InvokeError::NotACollection {
                ty: object.ty().name().to_string(),
            });
        }
        object.push_item(item);
        Ok(())
    }

    fn add_to_dictionary(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
        key: Value,
        item: Value,
    ) -> Result<(), InvokeError> {
        let object = object_mut(ctx, instance)?;
        if !object.ty().is_dictionary() {
            return Err(InvokeError::NotADictionary {
                ty: object.ty().name().to_string(),
            });
        }
        let key_text = key.to_string();
        if !object.insert_entry(key, item) {
            return Err(InvokeError::DuplicateKey {
                ty: object.ty().name().to_string(),
                key: key_text,
            });
        }
        Ok(())
    }

    fn begin_init(&self, ctx: &mut dyn ServiceContext, instance: &Value) -> Result<(), InvokeError> {
        let object = object_mut(ctx, instance)?;
        if object.ty().supports_initialize() {
            object.set_init_state(InitState::Initializing);
        }
        Ok(())
    }

    fn end_init(&self, ctx: &mut dyn ServiceContext, instance: &Value) -> Result<(), InvokeError> {
        let object = object_mut(ctx, instance)?;
        if object.ty().supports_initialize() {
            object.set_init_state(InitState::Initialized);
        }
        Ok(())
    }
}

/// Invoker for types whose values are held inline in [`Value`], such as the
/// intrinsic scalars. Only parameterless construction is supported; it yields
/// a fixed default.
#[derive(Clone, Debug, Default)]
pub struct ScalarInvoker {
    default: Value,
}

impl ScalarInvoker {
    /// Construct instances as copies of `default`.
    pub fn new(default: Value) -> Self {
        Self { default }
    }
}

impl Invoker for ScalarInvoker {
    fn create_instance(
        &self,
        _ctx: &mut dyn ServiceContext,
        ty: &TypeRef,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        if !args.is_empty() {
            return Err(InvokeError::NoConstructor {
                ty: ty.name().to_string(),
                arity: args.len(),
            });
        }
        Ok(self.default.clone())
    }

    fn get_value(
        &self,
        _ctx: &dyn ServiceContext,
        instance: &Value,
        _member: &MemberDesc,
    ) -> Result<Value, InvokeError> {
        Err(not_an_object(instance))
    }

    fn set_value(
        &self,
        _ctx: &mut dyn ServiceContext,
        instance: &Value,
        _member: &MemberDesc,
        _value: Value,
    ) -> Result<(), InvokeError> {
        Err(not_an_object(instance))
    }

    fn add_to_collection(
        &self,
        _ctx: &mut dyn ServiceContext,
        instance: &Value,
        _item: Value,
    ) -> Result<(), InvokeError> {
        Err(not_an_object(instance))
    }

    fn add_to_dictionary(
        &self,
        _ctx: &mut dyn ServiceContext,
        instance: &Value,
        _key: Value,
        _item: Value,
    ) -> Result<(), InvokeError> {
        Err(not_an_object(instance))
    }
}

/// Construct `ty` through its own invoker.
pub fn create_instance(
    ctx: &mut dyn ServiceContext,
    ty: &TypeRef,
    args: Vec<Value>,
) -> Result<Value, InvokeError> {
    let invoker = ty.invoker().clone();
    invoker.create_instance(ctx, ty, args)
}

/// The invoker responsible for `instance`: the invoker of its graph object's
/// type, or `fallback` for inline values.
pub fn invoker_for(
    ctx: &dyn ServiceContext,
    instance: &Value,
    fallback: &TypeDesc,
) -> Arc<dyn Invoker> {
    ctx.graph()
        .object(instance)
        .map(|object| object.ty().invoker().clone())
        .unwrap_or_else(|| fallback.invoker().clone())
}
