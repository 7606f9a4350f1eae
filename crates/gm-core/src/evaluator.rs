//! Tree-walking evaluator. Walks the AST produced by `parser` directly,
//! threading a lexical `Environment` and the shared `Runtime` state.
//!
//! Control transfer (`return`/`break`/`continue`) and runtime errors share a
//! single unwind channel: every evaluation function returns
//! `Result<T, Unwind>`, and `?` carries a non-local exit up through nested
//! calls exactly the way a native panic would, without every caller having
//! to check a sentinel. Only loop/switch/function bodies intercept the
//! control-transfer variants; `Unwind::Error` is never intercepted inside
//! user code (there is no `try`/`catch`) and is only caught by the top-level
//! runner.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{
    BinaryOp, Block, DeclKind, Expr, ForInit, Program, Stmt, StructDecl, SwitchCase, UnaryOp,
};
use crate::environment::{self, Environment};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::lexer::Position;
use crate::runtime::Runtime;
use crate::value::{EnumTypeDef, FunctionValue, MethodDef, StructInstanceData, StructTypeDef, Value};

pub enum Unwind {
    Error(RuntimeError),
    Return(Value),
    Break,
    Continue,
}

pub type EvalResult<T> = Result<T, Unwind>;

fn fail<T>(kind: RuntimeErrorKind, pos: Position, message: impl Into<String>) -> EvalResult<T> {
    Err(Unwind::Error(RuntimeError::new(kind, pos, message)))
}

/// Runs a whole program against `env`, returning the value of the last
/// expression statement (`Value::Nil` if the program has none), or the
/// first unhandled runtime error.
pub fn eval_program(program: &Program, env: &Environment, rt: &mut Runtime) -> Result<Value, RuntimeError> {
    let mut last = Value::Nil;
    for stmt in &program.statements {
        match eval_stmt(stmt, env, rt) {
            Ok(Some(v)) => last = v,
            Ok(None) => {}
            Err(Unwind::Error(e)) => return Err(e),
            Err(Unwind::Return(v)) => return Ok(v),
            Err(Unwind::Break) => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch,
                    Position::default(),
                    "'break' used outside of a loop or switch",
                ));
            }
            Err(Unwind::Continue) => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch,
                    Position::default(),
                    "'continue' used outside of a loop",
                ));
            }
        }
    }
    Ok(last)
}

fn eval_block(block: &Block, parent: &Environment, rt: &mut Runtime) -> EvalResult<Option<Value>> {
    let scope = environment::Scope::child(parent);
    eval_stmts_in(block, &scope, rt)
}

fn eval_stmts_in(block: &Block, scope: &Environment, rt: &mut Runtime) -> EvalResult<Option<Value>> {
    let mut last = None;
    for stmt in block {
        last = eval_stmt(stmt, scope, rt)?;
    }
    Ok(last)
}

fn eval_stmt(stmt: &Stmt, env: &Environment, rt: &mut Runtime) -> EvalResult<Option<Value>> {
    match stmt {
        Stmt::Decl { kind, name, value, pos: _ } => {
            let v = eval_expr(value, env, rt)?;
            match kind {
                DeclKind::Var => environment::define_var(env, name, v),
                DeclKind::Let => environment::define_let(env, name, v),
                DeclKind::Const => environment::define_const(env, name, v),
            }
            Ok(None)
        }
        Stmt::ExprStmt(expr) => Ok(Some(eval_expr(expr, env, rt)?)),
        Stmt::Block(block) => eval_block(block, env, rt),
        Stmt::If { cond, then_branch, else_branch, .. } => {
            if eval_expr(cond, env, rt)?.is_truthy() {
                eval_block(then_branch, env, rt)
            } else if let Some(else_branch) = else_branch {
                eval_block(else_branch, env, rt)
            } else {
                Ok(None)
            }
        }
        Stmt::While { conds, body, .. } => eval_while(conds, body, env, rt),
        Stmt::For { init, cond, update, body, .. } => eval_for(init, cond, update, body, env, rt),
        Stmt::Foreach { name, iterable, body, .. } => eval_foreach(name, iterable, body, env, rt),
        Stmt::Switch { scrutinee, cases, .. } => eval_switch(scrutinee, cases, env, rt),
        Stmt::Return { value, pos: _ } => {
            let v = match value {
                Some(e) => eval_expr(e, env, rt)?,
                None => Value::Nil,
            };
            Err(Unwind::Return(v))
        }
        Stmt::Break(_) => Err(Unwind::Break),
        Stmt::Continue(_) => Err(Unwind::Continue),
        Stmt::FuncDecl(decl) => {
            let func = Value::Function(Rc::new(FunctionValue {
                name: decl.name.clone(),
                params: decl.params.clone(),
                body: Rc::new(decl.body.clone()),
                captured_env: Rc::clone(env),
            }));
            environment::define_const(env, &decl.name, func);
            Ok(None)
        }
        Stmt::StructDecl(decl) => {
            eval_struct_decl(decl, env);
            Ok(None)
        }
        Stmt::EnumDecl(decl) => {
            eval_enum_decl(decl, env);
            Ok(None)
        }
        Stmt::Import { name, pos } => eval_import(name, *pos, env),
    }
}

fn eval_while(conds: &[Expr], body: &Block, env: &Environment, rt: &mut Runtime) -> EvalResult<Option<Value>> {
    loop {
        let mut all_true = true;
        for c in conds {
            if !eval_expr(c, env, rt)?.is_truthy() {
                all_true = false;
                break;
            }
        }
        if !all_true {
            return Ok(None);
        }
        match eval_block(body, env, rt) {
            Ok(_) => {}
            Err(Unwind::Break) => return Ok(None),
            Err(Unwind::Continue) => continue,
            Err(other) => return Err(other),
        }
    }
}

fn eval_for(
    init: &[ForInit],
    cond: &Option<Expr>,
    update: &[Expr],
    body: &Block,
    parent: &Environment,
    rt: &mut Runtime,
) -> EvalResult<Option<Value>> {
    let for_scope = environment::Scope::child(parent);
    for item in init {
        let v = eval_expr(&item.expr, &for_scope, rt)?;
        match &item.name {
            Some((DeclKind::Var, name)) => environment::define_var(&for_scope, name, v),
            Some((DeclKind::Let, name)) => environment::define_let(&for_scope, name, v),
            Some((DeclKind::Const, name)) => environment::define_const(&for_scope, name, v),
            None => {}
        }
    }
    loop {
        let keep_going = match cond {
            Some(c) => eval_expr(c, &for_scope, rt)?.is_truthy(),
            None => true,
        };
        if !keep_going {
            return Ok(None);
        }
        match eval_block(body, &for_scope, rt) {
            Ok(_) => {}
            Err(Unwind::Break) => return Ok(None),
            Err(Unwind::Continue) => {}
            Err(other) => return Err(other),
        }
        for u in update {
            eval_expr(u, &for_scope, rt)?;
        }
    }
}

fn eval_foreach(name: &str, iterable: &Expr, body: &Block, env: &Environment, rt: &mut Runtime) -> EvalResult<Option<Value>> {
    let target = eval_expr(iterable, env, rt)?;
    let items: Vec<Value> = match &target {
        Value::List(l) => l.borrow().clone(),
        Value::Str(s) => s.iter().map(|c| Value::Char(*c)).collect(),
        Value::Range(start, end) => {
            if start <= end {
                (*start..=*end).map(Value::Int).collect()
            } else {
                (*end..=*start).rev().map(Value::Int).collect()
            }
        }
        Value::Set(s) => s.borrow().values().cloned().collect(),
        Value::Map(m) => m.borrow().keys().map(|k| Value::str_from(k)).collect(),
        other => {
            return fail(
                RuntimeErrorKind::TypeMismatch,
                iterable.pos(),
                format!("cannot iterate over a value of type '{}'", other.type_tag()),
            )
        }
    };
    for item in items {
        let scope = environment::Scope::child(env);
        environment::define_var(&scope, name, item);
        match eval_stmts_in(body, &scope, rt) {
            Ok(_) => {}
            Err(Unwind::Break) => return Ok(None),
            Err(Unwind::Continue) => continue,
            Err(other) => return Err(other),
        }
    }
    Ok(None)
}

/// C-style switch: the matching case's statements run, then execution
/// continues into subsequent cases (fallthrough) until a `break` or the end
/// of the switch. An empty case body is therefore indistinguishable from an
/// explicit fallthrough to the next label.
fn eval_switch(scrutinee: &Expr, cases: &[SwitchCase], env: &Environment, rt: &mut Runtime) -> EvalResult<Option<Value>> {
    let value = eval_expr(scrutinee, env, rt)?;
    let mut start = None;
    for (i, case) in cases.iter().enumerate() {
        if let Some(case_expr) = &case.value {
            let case_value = eval_expr(case_expr, env, rt)?;
            if strict_equal(&value, &case_value) {
                start = Some(i);
                break;
            }
        }
    }
    let start = start.or_else(|| cases.iter().position(|c| c.value.is_none()));
    let Some(start) = start else {
        return Ok(None);
    };
    let scope = environment::Scope::child(env);
    for case in &cases[start..] {
        match eval_stmts_in(&case.body, &scope, rt) {
            Ok(_) => {}
            Err(Unwind::Break) => return Ok(None),
            Err(other) => return Err(other),
        }
    }
    Ok(None)
}

fn eval_struct_decl(decl: &StructDecl, env: &Environment) {
    let fields = decl.fields.iter().map(|f| (f.name.clone(), f.init.clone())).collect();
    let mut methods = IndexMap::default();
    for m in &decl.methods {
        methods.insert(
            m.name.clone(),
            Rc::new(MethodDef {
                name: m.name.clone(),
                params: m.params.clone(),
                body: Rc::new(m.body.clone()),
            }),
        );
    }
    let def = Rc::new(StructTypeDef {
        name: decl.name.clone(),
        fields,
        methods,
        def_env: Rc::clone(env),
    });
    environment::define_struct_type(env, Rc::clone(&def));
    environment::define_const(env, &decl.name, Value::StructType(def));
}

fn eval_enum_decl(decl: &crate::ast::EnumDecl, env: &Environment) {
    let mut members = IndexMap::default();
    let mut next = 0i64;
    for m in &decl.members {
        let value = m.value.unwrap_or(next);
        members.insert(m.name.clone(), value);
        next = value + 1;
    }
    let def = Rc::new(EnumTypeDef {
        name: decl.name.clone(),
        members,
    });
    environment::define_enum_type(env, Rc::clone(&def));
    environment::define_const(env, &decl.name, Value::EnumType(def));
}

/// Packages from spec §6's import table expose a fixed subset of already
/// registered global builtins under a namespace; `import math;` binds a
/// map whose entries are `Rc`-shared with the same builtin registered
/// globally, so `math.sqrt(x)` and a bare `sqrt(x)` call the same function.
fn eval_import(name: &str, pos: Position, env: &Environment) -> EvalResult<Option<Value>> {
    let members = crate::builtins::package_members(name)
        .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::UndefinedName, pos, format!("unknown package '{name}'"))))?;
    let mut map = IndexMap::default();
    for member_name in members {
        let Some(v) = environment::get(env, member_name) else {
            continue;
        };
        map.insert(member_name.to_string(), v);
    }
    environment::define_const(env, name, Value::Map(Rc::new(std::cell::RefCell::new(map))));
    Ok(None)
}

fn eval_expr(expr: &Expr, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::str_from(s)),
        Expr::Char(c) => Ok(Value::Char(*c)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Nil => Ok(Value::Nil),
        Expr::Ident(name) => environment::get(env, name)
            .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::UndefinedName, Position::default(), format!("undefined name '{name}'")))),
        Expr::Unary { op, expr, pos } => eval_unary(op, expr, *pos, env, rt),
        Expr::Binary { op, left, right, pos } => eval_binary(op, left, right, *pos, env, rt),
        Expr::Member { target, name, pos } => eval_member(target, name, *pos, env, rt),
        Expr::Index { target, index, pos } => eval_index(target, index, *pos, env, rt),
        Expr::Slice { target, start, end, pos } => eval_slice(target, start, end, *pos, env, rt),
        Expr::Call { callee, args, pos } => eval_call(callee, args, *pos, env, rt),
        Expr::New { type_name, args, pos } => eval_new(type_name, args, *pos, env, rt),
        Expr::ArrayLit { elements, .. } => {
            let mut items = Vec::with_capacity(elements.len());
            for e in elements {
                items.push(eval_expr(e, env, rt)?);
            }
            Ok(Value::list(items))
        }
        Expr::MapLit { entries, .. } => {
            let mut map = IndexMap::default();
            for (k, v) in entries {
                let key = eval_expr(k, env, rt)?;
                let value = eval_expr(v, env, rt)?;
                map.insert(key.canonical_string(), value);
            }
            Ok(Value::Map(Rc::new(std::cell::RefCell::new(map))))
        }
        Expr::SetLit { elements, .. } => {
            let mut set = IndexMap::default();
            for e in elements {
                let v = eval_expr(e, env, rt)?;
                set.insert(v.canonical_string(), v);
            }
            Ok(Value::Set(Rc::new(std::cell::RefCell::new(set))))
        }
        Expr::FuncLit { params, body, .. } => Ok(Value::Function(Rc::new(FunctionValue {
            name: "<anonymous>".to_string(),
            params: params.clone(),
            body: Rc::new(body.clone()),
            captured_env: Rc::clone(env),
        }))),
        Expr::Assign { target, value, pos } => eval_assign(target, value, *pos, env, rt),
    }
}

fn eval_unary(op: &UnaryOp, expr: &Expr, pos: Position, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    let v = eval_expr(expr, env, rt)?;
    match (op, &v) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(-n)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Int(n)) => Ok(Value::Int(*n)),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(*f)),
        (UnaryOp::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        _ => fail(
            RuntimeErrorKind::TypeMismatch,
            pos,
            format!("unary operator not defined for type '{}'", v.type_tag()),
        ),
    }
}

fn eval_binary(op: &BinaryOp, left: &Expr, right: &Expr, pos: Position, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    if matches!(op, BinaryOp::And) {
        let l = eval_expr(left, env, rt)?;
        return if l.is_truthy() { eval_expr(right, env, rt) } else { Ok(l) };
    }
    if matches!(op, BinaryOp::Or) {
        let l = eval_expr(left, env, rt)?;
        return if l.is_truthy() { Ok(l) } else { eval_expr(right, env, rt) };
    }

    let l = eval_expr(left, env, rt)?;
    let r = eval_expr(right, env, rt)?;

    match op {
        BinaryOp::Add => add(&l, &r, pos),
        BinaryOp::Sub => numeric_op(&l, &r, pos, "subtract", |a, b| a - b, |a, b| a - b),
        BinaryOp::Mul => numeric_op(&l, &r, pos, "multiply", |a, b| a.wrapping_mul(b), |a, b| a * b),
        BinaryOp::Div => divide(&l, &r, pos),
        BinaryOp::Mod => modulo(&l, &r, pos),
        BinaryOp::BitAnd => int_op(&l, &r, pos, |a, b| a & b),
        BinaryOp::BitOr => int_op(&l, &r, pos, |a, b| a | b),
        BinaryOp::BitXor => int_op(&l, &r, pos, |a, b| a ^ b),
        BinaryOp::Shl => int_op(&l, &r, pos, |a, b| a.wrapping_shl(b as u32)),
        BinaryOp::Shr => int_op(&l, &r, pos, |a, b| a.wrapping_shr(b as u32)),
        BinaryOp::Lt => compare(&l, &r, pos).map(|o| Value::Bool(o.is_lt())),
        BinaryOp::Gt => compare(&l, &r, pos).map(|o| Value::Bool(o.is_gt())),
        BinaryOp::LtEq => compare(&l, &r, pos).map(|o| Value::Bool(o.is_le())),
        BinaryOp::GtEq => compare(&l, &r, pos).map(|o| Value::Bool(o.is_ge())),
        BinaryOp::Eq => Ok(Value::Bool(loose_equal(&l, &r))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_equal(&l, &r))),
        BinaryOp::StrictEq => Ok(Value::Bool(strict_equal(&l, &r))),
        BinaryOp::StrictNotEq => Ok(Value::Bool(!strict_equal(&l, &r))),
        BinaryOp::Range => match (&l, &r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Range(*a, *b)),
            _ => fail(RuntimeErrorKind::TypeMismatch, pos, "range bounds must be integers"),
        },
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn add(l: &Value, r: &Value, pos: Position) -> EvalResult<Value> {
    match (l, r) {
        (Value::Str(a), _) => {
            let mut s = (**a).clone();
            s.extend(r.canonical_string().chars());
            Ok(Value::str_from_chars(s))
        }
        (_, Value::Str(_)) => {
            let mut s: Vec<char> = l.canonical_string().chars().collect();
            s.extend(r.canonical_string().chars());
            Ok(Value::str_from_chars(s))
        }
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        _ => numeric_op(l, r, pos, "add", |a, b| a.wrapping_add(b), |a, b| a + b),
    }
}

fn numeric_op(
    l: &Value,
    r: &Value,
    pos: Position,
    verb: &str,
    int_f: impl Fn(i64, i64) -> i64,
    float_f: impl Fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_f(*a, *b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_f(*a, *b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_f(*a as f64, *b))),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_f(*a, *b as f64))),
        _ => fail(
            RuntimeErrorKind::TypeMismatch,
            pos,
            format!("cannot {verb} '{}' and '{}'", l.type_tag(), r.type_tag()),
        ),
    }
}

fn divide(l: &Value, r: &Value, pos: Position) -> EvalResult<Value> {
    match (l, r) {
        (Value::Int(_), Value::Int(0)) => fail(RuntimeErrorKind::DivisionByZero, pos, "integer division by zero"),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_div(*b))),
        _ => numeric_op(l, r, pos, "divide", |a, b| a.wrapping_div(b), |a, b| a / b),
    }
}

fn modulo(l: &Value, r: &Value, pos: Position) -> EvalResult<Value> {
    match (l, r) {
        (Value::Int(_), Value::Int(0)) => fail(RuntimeErrorKind::DivisionByZero, pos, "integer modulo by zero"),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
        _ => numeric_op(l, r, pos, "take the modulus of", |a, b| a.wrapping_rem(b), |a, b| a % b),
    }
}

fn int_op(l: &Value, r: &Value, pos: Position, f: impl Fn(i64, i64) -> i64) -> EvalResult<Value> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(f(*a, *b))),
        _ => fail(
            RuntimeErrorKind::TypeMismatch,
            pos,
            format!("bitwise operator requires two ints, got '{}' and '{}'", l.type_tag(), r.type_tag()),
        ),
    }
}

fn compare(l: &Value, r: &Value, pos: Position) -> EvalResult<std::cmp::Ordering> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).ok_or_else(|| {
            Unwind::Error(RuntimeError::new(RuntimeErrorKind::TypeMismatch, pos, "comparison with NaN"))
        }),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b).ok_or_else(|| {
            Unwind::Error(RuntimeError::new(RuntimeErrorKind::TypeMismatch, pos, "comparison with NaN"))
        }),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)).ok_or_else(|| {
            Unwind::Error(RuntimeError::new(RuntimeErrorKind::TypeMismatch, pos, "comparison with NaN"))
        }),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Ok(a.cmp(b)),
        _ => fail(
            RuntimeErrorKind::TypeMismatch,
            pos,
            format!("cannot compare '{}' and '{}'", l.type_tag(), r.type_tag()),
        ),
    }
}

/// `==`/`!=`: numerically lenient across int/float, otherwise requires a
/// matching type tag and equal canonical form.
fn loose_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => strict_equal(l, r),
    }
}

/// `===`/`!==` and `switch` case matching: type tags must match, then the
/// canonical textual form is compared.
fn strict_equal(l: &Value, r: &Value) -> bool {
    l.type_tag() == r.type_tag() && l.canonical_string() == r.canonical_string()
}

fn eval_member(target: &Expr, name: &str, pos: Position, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    let t = eval_expr(target, env, rt)?;
    match &t {
        Value::StructInstance(inst) => {
            if let Some(v) = inst.borrow().fields.get(name) {
                return Ok(v.clone());
            }
            let ty = Rc::clone(&inst.borrow().ty);
            if let Some(method) = ty.methods.get(name) {
                let call_env = environment::Scope::child(&ty.def_env);
                environment::define_const(&call_env, "this", t.clone());
                return Ok(Value::Function(Rc::new(FunctionValue {
                    name: method.name.clone(),
                    params: method.params.clone(),
                    body: Rc::clone(&method.body),
                    captured_env: call_env,
                })));
            }
            fail(RuntimeErrorKind::UndefinedName, pos, format!("'{}' has no field or method '{name}'", ty.name))
        }
        Value::EnumType(e) => e
            .members
            .get(name)
            .map(|v| Value::Int(*v))
            .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::UndefinedName, pos, format!("enum '{}' has no member '{name}'", e.name)))),
        Value::Map(m) => m
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::UndefinedName, pos, format!("no member '{name}'")))),
        other => fail(RuntimeErrorKind::TypeMismatch, pos, format!("'{}' has no member '{name}'", other.type_tag())),
    }
}

fn normalize_index(len: usize, idx: i64) -> Option<usize> {
    let resolved = if idx < 0 { idx + len as i64 } else { idx };
    if resolved < 0 || resolved as usize >= len {
        None
    } else {
        Some(resolved as usize)
    }
}

fn eval_index(target: &Expr, index: &Expr, pos: Position, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    let t = eval_expr(target, env, rt)?;
    let i = eval_expr(index, env, rt)?;
    match (&t, &i) {
        (Value::List(l), Value::Int(n)) => {
            let list = l.borrow();
            normalize_index(list.len(), *n)
                .map(|idx| list[idx].clone())
                .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, pos, format!("list index {n} out of bounds"))))
        }
        (Value::Str(s), Value::Int(n)) => normalize_index(s.len(), *n)
            .map(|idx| Value::Char(s[idx]))
            .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, pos, format!("string index {n} out of bounds")))),
        (Value::Map(m), key) => m
            .borrow()
            .get(&key.canonical_string())
            .cloned()
            .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, pos, "key not found in map"))),
        (Value::Range(start, _), Value::Int(n)) => Ok(Value::Int(start + n)),
        _ => fail(
            RuntimeErrorKind::TypeMismatch,
            pos,
            format!("cannot index into '{}' with '{}'", t.type_tag(), i.type_tag()),
        ),
    }
}

fn eval_slice(
    target: &Expr,
    start: &Option<Box<Expr>>,
    end: &Option<Box<Expr>>,
    pos: Position,
    env: &Environment,
    rt: &mut Runtime,
) -> EvalResult<Value> {
    let t = eval_expr(target, env, rt)?;
    let resolve = |e: &Option<Box<Expr>>, default: i64, len: i64, env: &Environment, rt: &mut Runtime| -> EvalResult<i64> {
        match e {
            Some(expr) => match eval_expr(expr, env, rt)? {
                Value::Int(n) => Ok(if n < 0 { (n + len).max(0) } else { n.min(len) }),
                other => fail(RuntimeErrorKind::TypeMismatch, pos, format!("slice bound must be int, got '{}'", other.type_tag())),
            },
            None => Ok(default),
        }
    };
    match &t {
        Value::List(l) => {
            let len = l.borrow().len() as i64;
            let s = resolve(start, 0, len, env, rt)?;
            let e = resolve(end, len, len, env, rt)?;
            let list = l.borrow();
            if s >= e {
                Ok(Value::list(Vec::new()))
            } else {
                Ok(Value::list(list[s as usize..e as usize].to_vec()))
            }
        }
        Value::Str(s) => {
            let len = s.len() as i64;
            let lo = resolve(start, 0, len, env, rt)?;
            let hi = resolve(end, len, len, env, rt)?;
            if lo >= hi {
                Ok(Value::str_from_chars(Vec::new()))
            } else {
                Ok(Value::str_from_chars(s[lo as usize..hi as usize].to_vec()))
            }
        }
        other => fail(RuntimeErrorKind::TypeMismatch, pos, format!("cannot slice a value of type '{}'", other.type_tag())),
    }
}

fn eval_call(callee: &Expr, args: &[Expr], pos: Position, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    let callee_val = eval_expr(callee, env, rt)?;
    let mut arg_values = Vec::with_capacity(args.len());
    for a in args {
        arg_values.push(eval_expr(a, env, rt)?);
    }
    match callee_val {
        Value::Function(f) => call_function(&f, arg_values, pos, rt),
        Value::Builtin(b) => (b.func)(rt, &arg_values).map_err(Unwind::Error),
        other => fail(RuntimeErrorKind::TypeMismatch, pos, format!("'{}' is not callable", other.type_tag())),
    }
}

fn call_function(f: &Rc<FunctionValue>, args: Vec<Value>, pos: Position, rt: &mut Runtime) -> EvalResult<Value> {
    if args.len() != f.params.len() {
        return fail(
            RuntimeErrorKind::ArityMismatch,
            pos,
            format!("'{}' expects {} argument(s), got {}", f.name, f.params.len(), args.len()),
        );
    }
    if rt.enter_call().is_err() {
        return fail(RuntimeErrorKind::Recursion, pos, "maximum recursion depth exceeded");
    }
    let call_scope = environment::Scope::child(&f.captured_env);
    for (param, arg) in f.params.iter().zip(args) {
        environment::define_var(&call_scope, param, arg);
    }
    let result = match eval_stmts_in(&f.body, &call_scope, rt) {
        Ok(_) => Ok(Value::Nil),
        Err(Unwind::Return(v)) => Ok(v),
        Err(other) => Err(other),
    };
    rt.exit_call();
    result
}

fn eval_new(type_name: &str, args: &[Expr], pos: Position, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    let ty = environment::lookup_struct_type(env, type_name)
        .ok_or_else(|| Unwind::Error(RuntimeError::new(RuntimeErrorKind::UndefinedName, pos, format!("undefined struct type '{type_name}'"))))?;
    if args.len() > ty.fields.len() {
        return fail(
            RuntimeErrorKind::ArityMismatch,
            pos,
            format!("'{type_name}' has {} field(s), got {} constructor argument(s)", ty.fields.len(), args.len()),
        );
    }
    // Fields are initialized in declaration order into a fresh scope of the
    // struct's defining environment, each one bound as it's computed, so a
    // later default initializer can refer to an earlier field (`b = a + 1;`).
    let init_scope = environment::Scope::child(&ty.def_env);
    let mut fields = IndexMap::default();
    for (i, (field_name, init)) in ty.fields.iter().enumerate() {
        let value = if let Some(arg_expr) = args.get(i) {
            eval_expr(arg_expr, env, rt)?
        } else if let Some(init_expr) = init {
            eval_expr(init_expr, &init_scope, rt)?
        } else {
            Value::Nil
        };
        environment::define_var(&init_scope, field_name, value.clone());
        fields.insert(field_name.clone(), value);
    }
    Ok(Value::StructInstance(Rc::new(std::cell::RefCell::new(StructInstanceData { ty, fields }))))
}

fn eval_assign(target: &Expr, value: &Expr, pos: Position, env: &Environment, rt: &mut Runtime) -> EvalResult<Value> {
    let v = eval_expr(value, env, rt)?;
    match target {
        Expr::Ident(name) => {
            environment::assign(env, name, v.clone(), pos).map_err(Unwind::Error)?;
            Ok(v)
        }
        Expr::Index { target, index, pos: idx_pos } => {
            let container = eval_expr(target, env, rt)?;
            let key = eval_expr(index, env, rt)?;
            match (&container, &key) {
                (Value::List(l), Value::Int(n)) => {
                    let mut list = l.borrow_mut();
                    let len = list.len();
                    let idx = normalize_index(len, *n).ok_or_else(|| {
                        Unwind::Error(RuntimeError::new(RuntimeErrorKind::IndexOutOfBounds, *idx_pos, format!("list index {n} out of bounds")))
                    })?;
                    list[idx] = v.clone();
                    Ok(v)
                }
                (Value::Map(m), key) => {
                    m.borrow_mut().insert(key.canonical_string(), v.clone());
                    Ok(v)
                }
                _ => fail(
                    RuntimeErrorKind::TypeMismatch,
                    *idx_pos,
                    format!("cannot assign into '{}' with index '{}'", container.type_tag(), key.type_tag()),
                ),
            }
        }
        Expr::Member { target, name, pos: mem_pos } => {
            let container = eval_expr(target, env, rt)?;
            match &container {
                Value::StructInstance(inst) => {
                    let mut data = inst.borrow_mut();
                    if !data.fields.contains_key(name) {
                        return fail(RuntimeErrorKind::UndefinedName, *mem_pos, format!("'{}' has no field '{name}'", data.ty.name));
                    }
                    data.fields.insert(name.clone(), v.clone());
                    Ok(v)
                }
                other => fail(RuntimeErrorKind::TypeMismatch, *mem_pos, format!("cannot assign a field on '{}'", other.type_tag())),
            }
        }
        _ => fail(RuntimeErrorKind::TypeMismatch, pos, "invalid assignment target"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_equal_is_numerically_lenient_across_int_and_float() {
        assert!(loose_equal(&Value::Int(1), &Value::Float(1.0)));
        assert!(!strict_equal(&Value::Int(1), &Value::Float(1.0)));
    }

    #[test]
    fn strict_equal_compares_canonical_form_once_tags_match() {
        assert!(strict_equal(&Value::str_from("a"), &Value::str_from("a")));
        assert!(!strict_equal(&Value::str_from("a"), &Value::str_from("b")));
    }

    #[test]
    fn normalize_index_wraps_negatives_and_rejects_out_of_range() {
        assert_eq!(normalize_index(3, -1), Some(2));
        assert_eq!(normalize_index(3, 0), Some(0));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(3, -4), None);
    }

    #[test]
    fn compare_reports_nan_as_a_type_error_rather_than_an_ordering() {
        let err = compare(&Value::Float(f64::NAN), &Value::Float(1.0), Position::default());
        assert!(matches!(err, Err(Unwind::Error(_))));
    }
}
