use crate::{
    adapter::{FieldConverter, TransformFactory, TransformOutput},
    args::CommandArgs,
    codec::Codec,
    error::AdapterError,
};
use bigdecimal::{BigDecimal, ToPrimitive};
use model::core::value::Value;
use std::{str::FromStr, sync::Arc};

fn conversion_error(target: &str, value: &Value, reason: impl std::fmt::Display) -> AdapterError {
    AdapterError::Conversion(format!("cannot convert {value} to {target}: {reason}"))
}

fn to_int(value: Value) -> Result<Value, AdapterError> {
    match value {
        Value::Int(_) | Value::Null => Ok(value),
        Value::Boolean(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(f) if f.is_finite() && f.trunc().abs() < i64::MAX as f64 => {
            Ok(Value::Int(f.trunc() as i64))
        }
        Value::Decimal(ref d) => d
            .with_scale(0)
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| conversion_error("int", &value, "out of range")),
        ref other => {
            let text = other.to_text().unwrap_or_default();
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|err| conversion_error("int", other, err))
        }
    }
}

fn to_float(value: Value) -> Result<Value, AdapterError> {
    match value {
        Value::Float(_) | Value::Null => Ok(value),
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Boolean(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        ref other => {
            let text = other.to_text().unwrap_or_default();
            text.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|err| conversion_error("float", other, err))
        }
    }
}

fn to_decimal(value: Value) -> Result<Value, AdapterError> {
    match value {
        Value::Decimal(_) | Value::Null => Ok(value),
        Value::Int(i) => Ok(Value::Decimal(BigDecimal::from(i))),
        ref other => {
            let text = other.to_text().unwrap_or_default();
            BigDecimal::from_str(text.trim())
                .map(Value::Decimal)
                .map_err(|err| conversion_error("decimal", other, err))
        }
    }
}

fn to_bytes(value: Value, codec: Codec) -> Result<Value, AdapterError> {
    match value {
        Value::Null | Value::Bytes(_) => Ok(value),
        Value::String(text) => codec.encode(&text).map(Value::Bytes),
        other => {
            let text = other.to_text().unwrap_or_default();
            codec.encode(&text).map(Value::Bytes)
        }
    }
}

/// Maps one field code to its converter. `None` leaves the field untouched.
pub fn field_converter(code: &str) -> Result<Option<FieldConverter>, AdapterError> {
    let converter: FieldConverter = match code.trim() {
        "" | "s" => return Ok(None),
        "i" => Arc::new(to_int),
        "f" => Arc::new(to_float),
        "d" => Arc::new(to_decimal),
        name => {
            let codec = Codec::for_label(name).ok_or_else(|| {
                AdapterError::invalid("convert", format!("unknown field code or encoding {name:?}"))
            })?;
            Arc::new(move |value| to_bytes(value, codec))
        }
    };
    Ok(Some(converter))
}

/// `convert::fields`, e.g. `s,i,f,d,utf-8` for a five-field row.
pub struct FieldConvertFactory;

impl TransformFactory for FieldConvertFactory {
    fn create(&self, args: &str, _cmd_args: &CommandArgs) -> Result<TransformOutput, AdapterError> {
        let args = args.trim();
        if args.is_empty() {
            return Ok(TransformOutput::Identity);
        }
        let converters = args
            .split(',')
            .map(field_converter)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TransformOutput::Fields(converters))
    }
}
