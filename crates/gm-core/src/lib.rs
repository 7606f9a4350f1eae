//! Core library for the `gm` scripting language: lexer, parser, tree-walking
//! evaluator, value model, and a REPL session, all usable without any of
//! `gm-cli`'s process-level I/O.

pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod value;

pub use environment::{Environment, Scope};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use repl::{ExecError, MetaCommand, ReplSession};
pub use runtime::{PrintWriter, Runtime};
pub use value::Value;

/// Parses and evaluates `source` as a standalone program against a fresh
/// global scope with all builtins installed. Used by `gm-cli`'s file-run
/// mode and by integration tests that don't need REPL persistence.
///
/// A parse failure is returned as `Err`, since there is no program to run at
/// all. An uncaught runtime error is not: it surfaces as `Ok(Value::Error)`,
/// the same first-class value a caught `error` value would be, so callers
/// inspect `type(v) == "error"` instead of matching on a Rust error type.
pub fn run(source: &str, rt: &mut Runtime) -> Result<Value, repl::ExecError> {
    let (program, errors) = parser::parse(source);
    if !errors.is_empty() {
        return Err(repl::ExecError::Parse(errors));
    }
    let env = environment::Scope::global();
    builtins::install(&env);
    match evaluator::eval_program(&program, &env, rt) {
        Ok(v) => Ok(v),
        Err(e) => Ok(Value::error(e.kind, format!("{}: {}", e.pos, e.message))),
    }
}
