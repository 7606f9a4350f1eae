//! Lexically scoped environments. See spec §3 "Environments" design note:
//! scopes form a parent chain of `Rc<RefCell<Scope>>`; a child never stores a
//! back-pointer to its parent's owner, so closures capturing a scope cannot
//! create reference cycles through the chain itself.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::lexer::Position;
use crate::value::{EnumTypeDef, StructTypeDef, Value};

pub type Environment = Rc<RefCell<Scope>>;

#[derive(Debug)]
pub struct Scope {
    parent: Option<Environment>,
    vars: HashMap<String, Value>,
    consts: HashSet<String>,
    /// Names declared with `let`, pinned to the type tag of their first value.
    let_types: HashMap<String, &'static str>,
    struct_types: HashMap<String, Rc<StructTypeDef>>,
    enum_types: HashMap<String, Rc<EnumTypeDef>>,
}

impl Scope {
    pub fn global() -> Environment {
        Rc::new(RefCell::new(Scope {
            parent: None,
            vars: HashMap::new(),
            consts: HashSet::new(),
            let_types: HashMap::new(),
            struct_types: HashMap::new(),
            enum_types: HashMap::new(),
        }))
    }

    pub fn child(parent: &Environment) -> Environment {
        Rc::new(RefCell::new(Scope {
            parent: Some(Rc::clone(parent)),
            vars: HashMap::new(),
            consts: HashSet::new(),
            let_types: HashMap::new(),
            struct_types: HashMap::new(),
            enum_types: HashMap::new(),
        }))
    }
}

/// Free functions rather than inherent `impl Scope` methods, since most
/// operations need to walk the `Rc<RefCell<_>>` chain rather than operate on
/// a single borrowed `Scope`.
pub fn define_var(env: &Environment, name: &str, value: Value) {
    env.borrow_mut().vars.insert(name.to_string(), value);
}

pub fn define_let(env: &Environment, name: &str, value: Value) {
    let tag = value.type_tag();
    let mut scope = env.borrow_mut();
    scope.let_types.insert(name.to_string(), tag);
    scope.vars.insert(name.to_string(), value);
}

pub fn define_const(env: &Environment, name: &str, value: Value) {
    let mut scope = env.borrow_mut();
    scope.consts.insert(name.to_string());
    scope.vars.insert(name.to_string(), value);
}

pub fn get(env: &Environment, name: &str) -> Option<Value> {
    let scope = env.borrow();
    if let Some(v) = scope.vars.get(name) {
        return Some(v.clone());
    }
    match &scope.parent {
        Some(parent) => get(parent, name),
        None => None,
    }
}

/// Finds the nearest enclosing scope (walking outward from `env`) that
/// already declares `name`, or `None` if it is undeclared anywhere.
fn find_owner(env: &Environment, name: &str) -> Option<Environment> {
    if env.borrow().vars.contains_key(name) {
        return Some(Rc::clone(env));
    }
    let parent = env.borrow().parent.clone();
    parent.and_then(|p| find_owner(&p, name))
}

/// Assigns to an existing binding, per spec §4.4: walks outward to the
/// declaring scope, enforcing const-immutability and `let` type pinning. If
/// `name` is undeclared anywhere, it is created as a fresh `var` in `env`
/// (spec's implicit-declaration-on-first-assignment rule for bare `x = v;`).
pub fn assign(env: &Environment, name: &str, value: Value, pos: Position) -> Result<(), RuntimeError> {
    match find_owner(env, name) {
        Some(owner) => {
            let mut scope = owner.borrow_mut();
            if scope.consts.contains(name) {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::ImmutableAssign,
                    pos,
                    format!("cannot assign to const '{name}'"),
                ));
            }
            if let Some(pinned) = scope.let_types.get(name).copied() {
                if pinned != value.type_tag() {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::TypePinViolation,
                        pos,
                        format!(
                            "cannot assign {} to '{name}', pinned to {pinned}",
                            value.type_tag()
                        ),
                    ));
                }
            }
            scope.vars.insert(name.to_string(), value);
            Ok(())
        }
        None => {
            define_var(env, name, value);
            Ok(())
        }
    }
}

pub fn define_struct_type(env: &Environment, def: Rc<StructTypeDef>) {
    env.borrow_mut().struct_types.insert(def.name.clone(), def);
}

pub fn lookup_struct_type(env: &Environment, name: &str) -> Option<Rc<StructTypeDef>> {
    let scope = env.borrow();
    if let Some(t) = scope.struct_types.get(name) {
        return Some(Rc::clone(t));
    }
    match &scope.parent {
        Some(parent) => lookup_struct_type(parent, name),
        None => None,
    }
}

pub fn define_enum_type(env: &Environment, def: Rc<EnumTypeDef>) {
    env.borrow_mut().enum_types.insert(def.name.clone(), def);
}

pub fn lookup_enum_type(env: &Environment, name: &str) -> Option<Rc<EnumTypeDef>> {
    let scope = env.borrow();
    if let Some(t) = scope.enum_types.get(name) {
        return Some(Rc::clone(t));
    }
    match &scope.parent {
        Some(parent) => lookup_enum_type(parent, name),
        None => None,
    }
}

/// Names currently bound in `env` alone, for the REPL's `/scope` command.
pub fn local_names(env: &Environment) -> Vec<String> {
    let mut names: Vec<String> = env.borrow().vars.keys().cloned().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Position;

    #[test]
    fn child_scopes_see_parent_bindings_but_not_the_reverse() {
        let parent = Scope::global();
        define_var(&parent, "x", Value::Int(1));
        let child = Scope::child(&parent);
        assert_eq!(get(&child, "x"), Some(Value::Int(1)));
        define_var(&child, "y", Value::Int(2));
        assert_eq!(get(&parent, "y"), None);
    }

    #[test]
    fn assign_walks_up_to_the_declaring_scope() {
        let parent = Scope::global();
        define_var(&parent, "x", Value::Int(1));
        let child = Scope::child(&parent);
        assign(&child, "x", Value::Int(2), Position::default()).unwrap();
        assert_eq!(get(&parent, "x"), Some(Value::Int(2)));
        assert!(!child.borrow().vars.contains_key("x"));
    }

    #[test]
    fn assigning_an_undeclared_name_declares_it_as_a_var_in_the_current_scope() {
        let env = Scope::global();
        assign(&env, "fresh", Value::Int(9), Position::default()).unwrap();
        assert_eq!(get(&env, "fresh"), Some(Value::Int(9)));
    }

    #[test]
    fn const_rebinding_is_rejected() {
        let env = Scope::global();
        define_const(&env, "z", Value::Int(1));
        let err = assign(&env, "z", Value::Int(2), Position::default()).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::ImmutableAssign);
    }

    #[test]
    fn let_bindings_are_pinned_to_their_first_type() {
        let env = Scope::global();
        define_let(&env, "n", Value::Int(1));
        let err = assign(&env, "n", Value::str_from("oops"), Position::default()).unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::TypePinViolation);
        assign(&env, "n", Value::Int(2), Position::default()).unwrap();
    }
}
