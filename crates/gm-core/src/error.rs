//! Runtime error taxonomy. See spec §4.3 "Runtime errors" and §7.

use std::fmt;

use strum::{Display, EnumString};

use crate::lexer::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RuntimeErrorKind {
    TypeMismatch,
    DivisionByZero,
    IndexOutOfBounds,
    ArityMismatch,
    UndefinedName,
    ImmutableAssign,
    TypePinViolation,
    IoError,
    Raised,
    Recursion,
}

/// An evaluation-time failure, carrying the position it occurred at so the
/// top-level runner can report `line:column: message`.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
    pub pos: Position,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, pos: Position, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.pos, self.message, self.kind)
    }
}

impl std::error::Error for RuntimeError {}
