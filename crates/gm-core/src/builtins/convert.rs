use super::{arity_error, type_error};
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::value::Value;

fn one<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, RuntimeError> {
    match args {
        [v] => Ok(v),
        _ => Err(arity_error(name, 1, args.len())),
    }
}

pub fn to_int(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match one("to_int", args)? {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Char(c) => Ok(Value::Int(*c as i64)),
        Value::Str(s) => {
            let text: String = s.iter().collect();
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| type_error(format!("cannot convert '{text}' to int")))
        }
        other => Err(type_error(format!("cannot convert '{}' to int", other.type_tag()))),
    }
}

pub fn to_float(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match one("to_float", args)? {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => {
            let text: String = s.iter().collect();
            text.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| type_error(format!("cannot convert '{text}' to float")))
        }
        other => Err(type_error(format!("cannot convert '{}' to float", other.type_tag()))),
    }
}

pub fn to_bool(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(one("to_bool", args)?.is_truthy()))
}

pub fn to_string_(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::str_from(&one("to_string", args)?.canonical_string()))
}

pub fn to_char(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match one("to_char", args)? {
        Value::Char(c) => Ok(Value::Char(*c)),
        Value::Int(n) => char::from_u32(*n as u32).map(Value::Char).ok_or_else(|| type_error(format!("{n} is not a valid char codepoint"))),
        Value::Str(s) if s.len() == 1 => Ok(Value::Char(s[0])),
        other => Err(type_error(format!("cannot convert '{}' to char", other.type_tag()))),
    }
}
