//! Core REPL session: owns the persistent global scope and evaluates one
//! chunk of source at a time. Deliberately has no terminal I/O of its own —
//! `gm-cli` drives a minimal `stdin`/`stdout` loop around it, so the session
//! itself stays embeddable (tests drive it directly; a future host could
//! wrap it in a richer line editor without touching this module). Mirrors
//! the teacher's `ReplSession`/terminal-driver split in `repl.rs` and
//! `bin/ouros-repl.rs`.

use std::fmt;

use crate::environment::{self, Environment};
use crate::evaluator;
use crate::parser::{self, ParseError};
use crate::runtime::{PrintWriter, Runtime, StdoutWriter};
use crate::value::Value;

/// A failure that prevents a chunk of source from producing a value at all.
/// An uncaught runtime error is deliberately not one of these: it surfaces
/// as `Ok(Value::Error)` instead, since the language treats errors as
/// first-class inspectable values rather than host-level exceptions.
#[derive(Debug)]
pub enum ExecError {
    Parse(Vec<ParseError>),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Parse(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ExecError {}

pub enum MetaCommand {
    Exit,
    Scope(Vec<String>),
    Cleared,
    Unknown(String),
}

pub struct ReplSession {
    env: Environment,
    rt: Runtime,
}

impl ReplSession {
    pub fn new() -> Self {
        Self::with_writer(Box::new(StdoutWriter))
    }

    pub fn with_writer(writer: Box<dyn PrintWriter>) -> Self {
        let env = environment::Scope::global();
        crate::builtins::install(&env);
        Self {
            env,
            rt: Runtime::with_writer(writer),
        }
    }

    /// Parses and evaluates one chunk of source against the session's
    /// persistent global scope. A parse failure or an uncaught runtime error
    /// never poisons the session: the next call starts clean. An uncaught
    /// runtime error comes back as `Ok(Value::Error)`, not `Err`.
    pub fn execute(&mut self, source: &str) -> Result<Value, ExecError> {
        let (program, errors) = parser::parse(source);
        if !errors.is_empty() {
            return Err(ExecError::Parse(errors));
        }
        match evaluator::eval_program(&program, &self.env, &mut self.rt) {
            Ok(v) => Ok(v),
            Err(e) => Ok(Value::error(e.kind, format!("{}: {}", e.pos, e.message))),
        }
    }

    /// Recognizes a leading-`/` meta command; returns `None` for ordinary
    /// source lines.
    pub fn meta(&mut self, line: &str) -> Option<MetaCommand> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }
        Some(match line {
            "/exit" => MetaCommand::Exit,
            "/scope" => MetaCommand::Scope(environment::local_names(&self.env)),
            "/clear" => {
                self.env = environment::Scope::global();
                crate::builtins::install(&self.env);
                MetaCommand::Cleared
            }
            other => MetaCommand::Unknown(other.to_string()),
        })
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}
