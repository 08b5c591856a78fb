//! Value converters: turning one kind of value into another.

use crate::{ConvertError, ServiceContext, Value};

/// Converts values of other types into the type (or member) it is attached to.
pub trait ValueConverter: Send + Sync {
    /// Whether `value` is a candidate for conversion at all.
    fn can_convert_from(&self, value: &Value) -> bool;

    /// Convert `value`. Only called when [`can_convert_from`] accepted it.
    ///
    /// [`can_convert_from`]: ValueConverter::can_convert_from
    fn convert_from(
        &self,
        ctx: &mut dyn ServiceContext,
        value: &Value,
    ) -> Result<Value, ConvertError>;
}

/// Converts scalars and type descriptors to their textual form.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringConverter;

impl ValueConverter for StringConverter {
    fn can_convert_from(&self, value: &Value) -> bool {
        matches!(
            value,
            Value::String(_) | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Type(_)
        )
    }

    fn convert_from(&self, _ctx: &mut dyn ServiceContext, value: &Value) -> Result<Value, ConvertError> {
        Ok(Value::String(value.to_string()))
    }
}

/// Parses integers from text, and accepts floats without a fractional part.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerConverter;

impl ValueConverter for IntegerConverter {
    fn can_convert_from(&self, value: &Value) -> bool {
        matches!(value, Value::String(_) | Value::Int(_) | Value::Float(_))
    }

    fn convert_from(&self, _ctx: &mut dyn ServiceContext, value: &Value) -> Result<Value, ConvertError> {
        match value {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| ConvertError::new(format!("'{s}' is not an integer: {e}"))),
            Value::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Ok(Value::Int(*n as i64))
            }
            other => Err(ConvertError::new(format!("'{other}' is not an integer"))),
        }
    }
}

/// Parses floating point numbers from text, and widens integers.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleConverter;

impl ValueConverter for DoubleConverter {
    fn can_convert_from(&self, value: &Value) -> bool {
        matches!(value, Value::String(_) | Value::Int(_) | Value::Float(_))
    }

    fn convert_from(&self, _ctx: &mut dyn ServiceContext, value: &Value) -> Result<Value, ConvertError> {
        match value {
            Value::Float(n) => Ok(Value::Float(*n)),
            Value::Int(n) => Ok(Value::Float(*n as f64)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| ConvertError::new(format!("'{s}' is not a number: {e}"))),
            other => Err(ConvertError::new(format!("'{other}' is not a number"))),
        }
    }
}

/// Parses `true` / `false`, ignoring ASCII case.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanConverter;

impl ValueConverter for BooleanConverter {
    fn can_convert_from(&self, value: &Value) -> bool {
        matches!(value, Value::String(_) | Value::Bool(_))
    }

    fn convert_from(&self, _ctx: &mut dyn ServiceContext, value: &Value) -> Result<Value, ConvertError> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            other => Err(ConvertError::new(format!("'{other}' is not a boolean"))),
        }
    }
}
