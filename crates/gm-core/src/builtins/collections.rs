use indexmap::IndexMap;

use super::{arity_error, type_error};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::lexer::Position;
use crate::runtime::Runtime;
use crate::value::Value;

fn values_equal(a: &Value, b: &Value) -> bool {
    a.type_tag() == b.type_tag() && a.canonical_string() == b.canonical_string()
}

pub fn len(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [Value::Str(s)] => Ok(Value::Int(s.len() as i64)),
        [Value::List(l)] => Ok(Value::Int(l.borrow().len() as i64)),
        [Value::Map(m)] => Ok(Value::Int(m.borrow().len() as i64)),
        [Value::Set(s)] => Ok(Value::Int(s.borrow().len() as i64)),
        [other] => Err(type_error(format!("'{}' has no length", other.type_tag()))),
        _ => Err(arity_error("len", 1, args.len())),
    }
}

pub fn type_of(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [v] => Ok(Value::str_from(v.type_tag())),
        _ => Err(arity_error("type", 1, args.len())),
    }
}

fn to_iter_elements(v: &Value) -> Result<Vec<Value>, RuntimeError> {
    match v {
        Value::List(l) => Ok(l.borrow().clone()),
        Value::Str(s) => Ok(s.iter().map(|c| Value::Char(*c)).collect()),
        Value::Set(s) => Ok(s.borrow().values().cloned().collect()),
        Value::Range(start, end) => {
            if start <= end {
                Ok((*start..=*end).map(Value::Int).collect())
            } else {
                Ok((*end..=*start).rev().map(Value::Int).collect())
            }
        }
        other => Err(type_error(format!("'{}' is not iterable", other.type_tag()))),
    }
}

pub fn list_ctor(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [] => Ok(Value::list(Vec::new())),
        [iterable] => Ok(Value::list(to_iter_elements(iterable)?)),
        _ => Err(arity_error("list", 1, args.len())),
    }
}

pub fn map_ctor(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        return Err(arity_error("map", 0, args.len()));
    }
    Ok(Value::Map(std::rc::Rc::new(std::cell::RefCell::new(IndexMap::default()))))
}

pub fn set_ctor(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    match args {
        [] => Ok(Value::Set(std::rc::Rc::new(std::cell::RefCell::new(IndexMap::default())))),
        [iterable] => {
            let mut set = IndexMap::default();
            for item in to_iter_elements(iterable)? {
                set.insert(item.canonical_string(), item);
            }
            Ok(Value::Set(std::rc::Rc::new(std::cell::RefCell::new(set))))
        }
        _ => Err(arity_error("set", 1, args.len())),
    }
}

fn expect_list<'a>(name: &str, args: &'a [Value]) -> Result<&'a std::rc::Rc<std::cell::RefCell<Vec<Value>>>, RuntimeError> {
    match args.first() {
        Some(Value::List(l)) => Ok(l),
        Some(other) => Err(type_error(format!("'{name}' expects a list, got '{}'", other.type_tag()))),
        None => Err(arity_error(name, 1, 0)),
    }
}

pub fn pushback_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("pushback_list", args)?;
    let [_, value] = args else { return Err(arity_error("pushback_list", 2, args.len())) };
    l.borrow_mut().push(value.clone());
    Ok(Value::Nil)
}

pub fn pushfront_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("pushfront_list", args)?;
    let [_, value] = args else { return Err(arity_error("pushfront_list", 2, args.len())) };
    l.borrow_mut().insert(0, value.clone());
    Ok(Value::Nil)
}

pub fn popback_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("popback_list", args)?;
    l.borrow_mut()
        .pop()
        .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, Position::default(), "popback_list on empty list"))
}

pub fn popfront_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("popfront_list", args)?;
    let mut list = l.borrow_mut();
    if list.is_empty() {
        return Err(RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, Position::default(), "popfront_list on empty list"));
    }
    Ok(list.remove(0))
}

pub fn peekback_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("peekback_list", args)?;
    l.borrow()
        .last()
        .cloned()
        .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, Position::default(), "peekback_list on empty list"))
}

pub fn peekfront_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("peekfront_list", args)?;
    l.borrow()
        .first()
        .cloned()
        .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, Position::default(), "peekfront_list on empty list"))
}

pub fn size_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("size_list", args)?;
    Ok(Value::Int(l.borrow().len() as i64))
}

pub fn insert_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("insert_list", args)?;
    let [_, index, value] = args else { return Err(arity_error("insert_list", 3, args.len())) };
    let Value::Int(idx) = index else {
        return Err(type_error("'insert_list' expects an int index"));
    };
    let mut list = l.borrow_mut();
    let pos = (*idx).clamp(0, list.len() as i64) as usize;
    list.insert(pos, value.clone());
    Ok(Value::Nil)
}

pub fn remove_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("remove_list", args)?;
    let [_, index] = args else { return Err(arity_error("remove_list", 2, args.len())) };
    let Value::Int(idx) = index else {
        return Err(type_error("'remove_list' expects an int index"));
    };
    let mut list = l.borrow_mut();
    let len = list.len() as i64;
    let resolved = if *idx < 0 { idx + len } else { *idx };
    if resolved < 0 || resolved >= len {
        return Err(RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, Position::default(), format!("remove_list index {idx} out of bounds")));
    }
    Ok(list.remove(resolved as usize))
}

pub fn contains_list(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let l = expect_list("contains_list", args)?;
    let [_, needle] = args else { return Err(arity_error("contains_list", 2, args.len())) };
    Ok(Value::Bool(l.borrow().iter().any(|v| values_equal(v, needle))))
}
