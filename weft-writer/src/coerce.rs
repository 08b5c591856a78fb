//! Converting raw values to the type they are stored as.

use weft_core::{MemberDesc, ServiceContext, TypeRef, Value, create_instance};

use crate::tracing_macros::trace;
use crate::{WriterError, WriterErrorKind};

/// Convert `value` to `target`, the way it would be when stored into
/// `member`.
///
/// In order:
/// - null becomes null for nullable targets and a default instance otherwise
/// - without a target, the value is kept
/// - values already assignable to the target are kept
/// - text naming a type becomes that type (for `Type` targets) or a
///   `TypeExtension` (for `TypeExtension` targets)
/// - markup extensions accept whatever their provided type accepts
/// - otherwise the member's converter, or else the target's, converts it
///
/// Coercing an already coerced value gives the same value back.
pub fn coerce(
    ctx: &mut dyn ServiceContext,
    member: Option<&MemberDesc>,
    target: Option<&TypeRef>,
    value: Value,
) -> Result<Value, WriterError> {
    if value.is_null() {
        let Some(target) = target else {
            return Ok(Value::Null);
        };
        if target.is_nullable() {
            return Ok(Value::Null);
        }
        trace!(target = %target.name(), "default instance for null");
        return create_instance(ctx, target, Vec::new()).map_err(|source| {
            WriterErrorKind::Construction {
                ty: target.name().to_string(),
                source,
            }
            .into()
        });
    }

    let Some(target) = target else {
        return Ok(value);
    };
    if matches!(value, Value::ForwardRef(_)) {
        return Ok(value);
    }

    let schema = ctx.schema();
    if schema.is_assignable(&value, ctx.graph(), target) {
        return Ok(value);
    }

    if let Value::String(text) = &value {
        if target == schema.type_type() {
            return match ctx.resolve_type(text) {
                Some(ty) => Ok(Value::Type(ty)),
                None => Err(mismatch(ctx, &value, target, None)),
            };
        }
        if target == schema.type_extension_type() {
            return create_instance(ctx, target, vec![value.clone()]).map_err(|source| {
                WriterErrorKind::Construction {
                    ty: target.name().to_string(),
                    source,
                }
                .into()
            });
        }
    }

    if target.is_markup_extension() {
        let returns = target
            .return_type()
            .and_then(|name| schema.resolve(name));
        if returns.is_some_and(|returns| schema.is_assignable(&value, ctx.graph(), &returns)) {
            return Ok(value);
        }
    }

    let converter = member
        .and_then(|m| m.converter())
        .or_else(|| target.converter())
        .cloned();
    match converter {
        Some(converter) if converter.can_convert_from(&value) => {
            trace!(target = %target.name(), %value, "converting");
            converter
                .convert_from(ctx, &value)
                .map_err(|reason| mismatch(ctx, &value, target, Some(reason)))
        }
        _ => Err(mismatch(ctx, &value, target, None)),
    }
}

fn mismatch(
    ctx: &dyn ServiceContext,
    value: &Value,
    target: &TypeRef,
    reason: Option<weft_core::ConvertError>,
) -> WriterError {
    let source_type = ctx
        .schema()
        .type_of(value, ctx.graph())
        .map(|ty| ty.name().to_string())
        .unwrap_or_else(|| "(null)".to_string());
    WriterErrorKind::Coercion {
        value: value.to_string(),
        source_type,
        target: target.name().to_string(),
        reason,
    }
    .into()
}
