use rand::Rng;

use super::{arity_error, type_error};
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::value::Value;

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

pub fn abs(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [Value::Int(n)] => Ok(Value::Int(n.abs())),
        [Value::Float(f)] => Ok(Value::Float(f.abs())),
        [other] => Err(type_error(format!("'abs' expects a number, got '{}'", other.type_tag()))),
        _ => Err(arity_error("abs", 1, args.len())),
    }
}

pub fn min(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    extremum(args, "min", |a, b| a < b)
}

pub fn max(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    extremum(args, "max", |a, b| a > b)
}

fn extremum(args: &[Value], name: &str, better: impl Fn(f64, f64) -> bool) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(arity_error(name, 1, 0));
    }
    let mut best = &args[0];
    let mut best_f = as_f64(best).ok_or_else(|| type_error(format!("'{name}' expects numeric arguments")))?;
    for v in &args[1..] {
        let f = as_f64(v).ok_or_else(|| type_error(format!("'{name}' expects numeric arguments")))?;
        if better(f, best_f) {
            best = v;
            best_f = f;
        }
    }
    Ok(best.clone())
}

pub fn pow(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [Value::Int(base), Value::Int(exp)] if *exp >= 0 => Ok(Value::Int(base.wrapping_pow(*exp as u32))),
        [a, b] => {
            let (base, exp) = (as_f64(a), as_f64(b));
            match (base, exp) {
                (Some(base), Some(exp)) => Ok(Value::Float(base.powf(exp))),
                _ => Err(type_error("'pow' expects numeric arguments")),
            }
        }
        _ => Err(arity_error("pow", 2, args.len())),
    }
}

pub fn sqrt(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [v] => as_f64(v).map(|f| Value::Float(f.sqrt())).ok_or_else(|| type_error(format!("'sqrt' expects a number, got '{}'", v.type_tag()))),
        _ => Err(arity_error("sqrt", 1, args.len())),
    }
}

pub fn floor(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    rounding("floor", args, f64::floor)
}

pub fn ceil(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    rounding("ceil", args, f64::ceil)
}

pub fn round(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    rounding("round", args, f64::round)
}

fn rounding(name: &str, args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value, RuntimeError> {
    match args {
        [Value::Int(n)] => Ok(Value::Int(*n)),
        [v] => as_f64(v).map(|x| Value::Int(f(x) as i64)).ok_or_else(|| type_error(format!("'{name}' expects a number, got '{}'", v.type_tag()))),
        _ => Err(arity_error(name, 1, args.len())),
    }
}

/// `random()` returns a float in `[0, 1)`; `random(lo, hi)` returns an int in
/// `[lo, hi]`, OS-seeded per call via `rand::thread_rng`.
pub fn random(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [] => Ok(Value::Float(rand::thread_rng().gen::<f64>())),
        [Value::Int(lo), Value::Int(hi)] if lo <= hi => Ok(Value::Int(rand::thread_rng().gen_range(*lo..=*hi))),
        [Value::Int(_), Value::Int(_)] => Err(type_error("'random' expects lo <= hi")),
        _ => Err(type_error("'random' expects zero arguments or two ints")),
    }
}
