//! The interpreter's shared mutable state: where output goes, which open
//! file handles need to be cleaned up at shutdown, and the call-depth
//! counter that enforces the recursion guard. Grounded in the teacher's
//! `io.rs` (`PrintWriter` trait) and `resource.rs` (`ResourceError::Recursion`).

use std::cell::RefCell;
use std::io::{self, Write as _};
use std::rc::{Rc, Weak};

use crate::value::FileHandleData;

/// Maximum call-stack depth before evaluation aborts with a recursion error.
/// Matches the teacher's default resource-limit order of magnitude.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1024;

/// Destination for `print`/`println`/`printf` output.
///
/// The default implementation writes to real stdout; embedders that want to
/// capture interpreter output (tests, a hosted playground) supply their own.
pub trait PrintWriter {
    fn write_str(&mut self, s: &str);
}

#[derive(Debug, Default)]
pub struct StdoutWriter;

impl PrintWriter for StdoutWriter {
    fn write_str(&mut self, s: &str) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let _ = lock.write_all(s.as_bytes());
        let _ = lock.flush();
    }
}

/// Captures output in memory instead of printing it; used by tests and by
/// embedders that want the interpreter's output as a string.
#[derive(Debug, Default)]
pub struct BufferWriter {
    pub buffer: String,
}

impl PrintWriter for BufferWriter {
    fn write_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }
}

pub struct Runtime {
    pub writer: Box<dyn PrintWriter>,
    pub max_recursion_depth: usize,
    call_depth: usize,
    /// Weak handles to every `fopen`-backed file so `shutdown` can close any
    /// still-open handle when the interpreter tears down, independent of
    /// whether the script itself ever called `fclose`.
    open_files: Vec<Weak<RefCell<FileHandleData>>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            writer: Box::new(StdoutWriter),
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            call_depth: 0,
            open_files: Vec::new(),
        }
    }

    pub fn with_writer(writer: Box<dyn PrintWriter>) -> Self {
        Self {
            writer,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            call_depth: 0,
            open_files: Vec::new(),
        }
    }

    pub fn register_file(&mut self, handle: &Rc<RefCell<FileHandleData>>) {
        self.open_files.push(Rc::downgrade(handle));
    }

    /// Called once when the interpreter is dropped (end of script, or REPL
    /// `/exit`): flushes and closes every file handle still alive, in
    /// registration order.
    pub fn shutdown(&mut self) {
        for weak in self.open_files.drain(..) {
            if let Some(handle) = weak.upgrade() {
                let mut data = handle.borrow_mut();
                if let Some(file) = data.file.take() {
                    let _ = file.sync_all();
                    drop(file);
                }
            }
        }
    }

    pub fn enter_call(&mut self) -> Result<(), ()> {
        if self.call_depth >= self.max_recursion_depth {
            return Err(());
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
