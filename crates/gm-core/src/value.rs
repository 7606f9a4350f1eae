//! The single tagged value type shared by lexer output (literals), AST
//! construction, and the evaluator. See spec §3 "Values".

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::RandomState;
use indexmap::IndexMap;

use crate::ast::Block;
use crate::environment::Environment;
use crate::error::RuntimeErrorKind;

pub type OrderedMap = IndexMap<String, Value, RandomState>;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    /// Sequence of Unicode code points, reference-counted for O(1) clone.
    Str(Rc<Vec<char>>),
    Nil,
    List(Rc<RefCell<Vec<Value>>>),
    /// Keyed by each key's canonical string form; insertion order preserved.
    Map(Rc<RefCell<OrderedMap>>),
    /// Deduplicated by each element's canonical string form; insertion order preserved.
    Set(Rc<RefCell<OrderedMap>>),
    /// Inclusive integer interval `[start, end]`.
    Range(i64, i64),
    Function(Rc<FunctionValue>),
    Builtin(Rc<BuiltinValue>),
    FileHandle(Rc<RefCell<FileHandleData>>),
    StructType(Rc<StructTypeDef>),
    StructInstance(Rc<RefCell<StructInstanceData>>),
    EnumType(Rc<EnumTypeDef>),
    Error(Rc<ErrorData>),
}

#[derive(Debug)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
    pub captured_env: Environment,
}

pub type BuiltinFn = fn(&mut crate::runtime::Runtime, &[Value]) -> Result<Value, crate::error::RuntimeError>;

pub struct BuiltinValue {
    pub name: String,
    pub func: BuiltinFn,
}

impl fmt::Debug for BuiltinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinValue").field("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub struct FileHandleData {
    pub file: Option<std::fs::File>,
    pub path: String,
    pub mode: String,
}

#[derive(Debug)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
}

#[derive(Debug)]
pub struct StructTypeDef {
    pub name: String,
    /// Declared fields in order, with their default-initializer expression (if any).
    pub fields: Vec<(String, Option<crate::ast::Expr>)>,
    pub methods: IndexMap<String, Rc<MethodDef>, RandomState>,
    /// Scope the struct was declared in; methods close over it (extended with `this`).
    pub def_env: Environment,
}

#[derive(Debug)]
pub struct StructInstanceData {
    pub ty: Rc<StructTypeDef>,
    pub fields: IndexMap<String, Value, RandomState>,
}

#[derive(Debug)]
pub struct EnumTypeDef {
    pub name: String,
    pub members: IndexMap<String, i64, RandomState>,
}

#[derive(Debug)]
pub struct ErrorData {
    pub message: String,
    pub kind: RuntimeErrorKind,
}

impl Value {
    pub fn str_from(s: &str) -> Self {
        Value::Str(Rc::new(s.chars().collect()))
    }

    pub fn str_from_chars(chars: Vec<char>) -> Self {
        Value::Str(Rc::new(chars))
    }

    pub fn error(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Value::Error(Rc::new(ErrorData {
            message: message.into(),
            kind,
        }))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// The short type-tag string, as answered by the `type` builtin.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Nil => "nil",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Range(_, _) => "range",
            Value::Function(_) => "func",
            Value::Builtin(_) => "func",
            Value::FileHandle(_) => "file",
            Value::StructType(_) => "struct_type",
            Value::StructInstance(s) => {
                // Struct instances report their declared type name, not a
                // generic tag, so `type(inst)` reads naturally in user code.
                let _ = s;
                "struct"
            }
            Value::EnumType(_) => "enum_type",
            Value::Error(_) => "error",
        }
    }

    /// Truthiness per spec §4.3.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Char(c) => *c != '\0',
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.borrow().is_empty(),
            Value::Map(m) => !m.borrow().is_empty(),
            Value::Set(s) => !s.borrow().is_empty(),
            Value::Range(start, end) => start != end,
            Value::Error(_) => true,
            _ => true,
        }
    }

    /// The canonical textual form used for `to_string`, printing, and as the
    /// basis for equality/hashing into maps and sets.
    pub fn canonical_string(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Str(s) => s.iter().collect(),
            Value::Nil => "nil".to_string(),
            Value::List(l) => {
                let items: Vec<String> = l.borrow().iter().map(Value::repr).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Map(m) => {
                let items: Vec<String> = m
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.repr()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Value::Set(s) => {
                let items: Vec<String> = s.borrow().values().map(Value::repr).collect();
                format!("{{{}}}", items.join(", "))
            }
            Value::Range(start, end) => format!("{start}...{end}"),
            Value::Function(f) => format!("<func {}>", f.name),
            Value::Builtin(b) => format!("<builtin {}>", b.name),
            Value::FileHandle(h) => format!("<file {}>", h.borrow().path),
            Value::StructType(t) => format!("<struct_type {}>", t.name),
            Value::StructInstance(inst) => {
                let data = inst.borrow();
                let items: Vec<String> = data
                    .fields
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.repr()))
                    .collect();
                format!("{} {{{}}}", data.ty.name, items.join(", "))
            }
            Value::EnumType(e) => format!("<enum_type {}>", e.name),
            Value::Error(e) => format!("error: {}", e.message),
        }
    }

    /// Like `canonical_string` but quotes strings/chars, used when rendering
    /// a value nested inside a container's own canonical form.
    fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", s.iter().collect::<String>()),
            Value::Char(c) => format!("'{c}'"),
            other => other.canonical_string(),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if f == f.trunc() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// Structural equality for scalars and containers (deep, by value);
/// reference-identity equality for functions, files, and type objects,
/// since those have no sensible notion of value equality. This is a Rust
/// convenience for tests and embedders, not the language's own `==`/`===`
/// operators — those live in `evaluator::{loose_equal, strict_equal}` and
/// compare by canonical string form instead.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::Range(a1, a2), Value::Range(b1, b2)) => a1 == b1 && a2 == b2,
            (Value::Map(a), Value::Map(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
            }
            (Value::Set(a), Value::Set(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::FileHandle(a), Value::FileHandle(b)) => Rc::ptr_eq(a, b),
            (Value::StructType(a), Value::StructType(b)) => Rc::ptr_eq(a, b),
            (Value::StructInstance(a), Value::StructInstance(b)) => Rc::ptr_eq(a, b),
            (Value::EnumType(a), Value::EnumType(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => a.message == b.message && a.kind == b.kind,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_string_formats_whole_floats_with_one_decimal() {
        assert_eq!(Value::Float(3.0).canonical_string(), "3.0");
        assert_eq!(Value::Float(3.5).canonical_string(), "3.5");
    }

    #[test]
    fn canonical_string_nests_quoted_strings_inside_containers() {
        let list = Value::list(vec![Value::str_from("hi"), Value::Int(1)]);
        assert_eq!(list.canonical_string(), "[\"hi\", 1]");
    }

    #[test]
    fn truthiness_treats_empty_containers_and_zero_as_falsy() {
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str_from("").is_truthy());
        assert!(!Value::list(Vec::new()).is_truthy());
        assert!(Value::list(vec![Value::Nil]).is_truthy());
    }

    #[test]
    fn partial_eq_is_structural_for_lists_but_by_identity_for_functions() {
        assert_eq!(Value::list(vec![Value::Int(1)]), Value::list(vec![Value::Int(1)]));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }
}
