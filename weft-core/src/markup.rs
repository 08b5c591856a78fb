//! Markup extensions and deferring loaders.
//!
//! A markup extension is an object whose real value is obtained after it has
//! been populated, by asking its type's [`MarkupExtension`] provider. A
//! deferring loader receives the raw node list of a member's content instead
//! of a materialized value.

use std::fmt;
use std::sync::Arc;

use crate::{BoxError, ForwardRef, NodeList, ServiceContext, Value};

/// Produces the value a populated markup-extension instance stands for.
pub trait MarkupExtension: Send + Sync {
    /// Compute the provided value from the populated `instance`.
    fn provide_value(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
    ) -> Result<Value, BoxError>;
}

/// Materializes a captured subtree on demand.
pub trait DeferringLoader: Send + Sync {
    /// Turn the closed node list of a member's content into its value.
    fn load(&self, nodes: NodeList, ctx: &mut dyn ServiceContext) -> Result<Value, BoxError>;
}

/// A markup extension was populated with something it can't work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionError(String);

impl fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ExtensionError {}

fn member_of(ctx: &dyn ServiceContext, instance: &Value, member: &str) -> Value {
    ctx.graph()
        .object(instance)
        .and_then(|object| object.member(member))
        .cloned()
        .unwrap_or_default()
}

/// Provides the type named by the `TypeName` member.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeExtensionProvider;

impl MarkupExtension for TypeExtensionProvider {
    fn provide_value(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
    ) -> Result<Value, BoxError> {
        match member_of(ctx, instance, "TypeName") {
            Value::Type(ty) => Ok(Value::Type(ty)),
            Value::String(name) => ctx
                .resolve_type(&name)
                .map(Value::Type)
                .ok_or_else(|| ExtensionError(format!("unknown type '{name}'")).into()),
            other => Err(ExtensionError(format!("'{other}' does not name a type")).into()),
        }
    }
}

/// Provides null.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullExtensionProvider;

impl MarkupExtension for NullExtensionProvider {
    fn provide_value(&self, _ctx: &mut dyn ServiceContext, _instance: &Value) -> Result<Value, BoxError> {
        Ok(Value::Null)
    }
}

/// Provides the object registered under the `Name` member, or a forward
/// reference to it when it hasn't been registered yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceProvider;

impl MarkupExtension for ReferenceProvider {
    fn provide_value(
        &self,
        ctx: &mut dyn ServiceContext,
        instance: &Value,
    ) -> Result<Value, BoxError> {
        let Value::String(name) = member_of(ctx, instance, "Name") else {
            return Err(ExtensionError("reference has no name".into()).into());
        };
        Ok(ctx
            .find_name(&name)
            .unwrap_or_else(|| Value::ForwardRef(ForwardRef::new([name]))))
    }
}

/// Keeps the captured node list itself as the member's value, to be replayed
/// into a writer later.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateLoader;

impl DeferringLoader for TemplateLoader {
    fn load(&self, nodes: NodeList, _ctx: &mut dyn ServiceContext) -> Result<Value, BoxError> {
        Ok(Value::Template(Arc::new(nodes)))
    }
}
