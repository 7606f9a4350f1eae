use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::rc::Rc;

use super::{arity_error, type_error};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::lexer::Position;
use crate::runtime::Runtime;
use crate::value::{FileHandleData, Value};

fn str_of(v: &Value) -> Option<String> {
    match v {
        Value::Str(s) => Some(s.iter().collect()),
        _ => None,
    }
}

fn io_err(e: std::io::Error) -> RuntimeError {
    RuntimeError::new(RuntimeErrorKind::IoError, Position::default(), e.to_string())
}

pub fn fopen(rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let [path, mode] = args else { return Err(arity_error("fopen", 2, args.len())) };
    let (Some(path), Some(mode)) = (str_of(path), str_of(mode)) else {
        return Err(type_error("'fopen' expects (path: string, mode: string)"));
    };
    let mut opts = OpenOptions::new();
    match mode.as_str() {
        "r" => opts.read(true),
        "w" => opts.write(true).create(true).truncate(true),
        "a" => opts.append(true).create(true),
        "r+" => opts.read(true).write(true),
        "w+" => opts.read(true).write(true).create(true).truncate(true),
        other => return Err(type_error(format!("unsupported file mode '{other}'"))),
    };
    let file = opts.open(&path).map_err(io_err)?;
    let handle = Rc::new(RefCell::new(FileHandleData {
        file: Some(file),
        path,
        mode,
    }));
    rt.register_file(&handle);
    Ok(Value::FileHandle(handle))
}

fn expect_handle<'a>(name: &str, args: &'a [Value]) -> Result<&'a Rc<RefCell<FileHandleData>>, RuntimeError> {
    match args.first() {
        Some(Value::FileHandle(h)) => Ok(h),
        Some(other) => Err(type_error(format!("'{name}' expects a file handle, got '{}'", other.type_tag()))),
        None => Err(arity_error(name, 1, 0)),
    }
}

fn closed_err(path: &str) -> RuntimeError {
    RuntimeError::new(RuntimeErrorKind::IoError, Position::default(), format!("file '{path}' is closed"))
}

pub fn fclose(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let h = expect_handle("fclose", args)?;
    h.borrow_mut().file = None;
    Ok(Value::Nil)
}

pub fn fread(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let h = expect_handle("fread", args)?;
    let mut data = h.borrow_mut();
    let path = data.path.clone();
    let file = data.file.as_mut().ok_or_else(|| closed_err(&path))?;
    match args.get(1) {
        Some(Value::Int(n)) => {
            let mut buf = vec![0u8; (*n).max(0) as usize];
            let read = file.read(&mut buf).map_err(io_err)?;
            buf.truncate(read);
            Ok(Value::str_from(&String::from_utf8_lossy(&buf)))
        }
        None => {
            let mut buf = String::new();
            file.read_to_string(&mut buf).map_err(io_err)?;
            Ok(Value::str_from(&buf))
        }
        Some(other) => Err(type_error(format!("'fread' expects an int byte count, got '{}'", other.type_tag()))),
    }
}

pub fn fwrite(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let h = expect_handle("fwrite", args)?;
    let [_, text] = args else { return Err(arity_error("fwrite", 2, args.len())) };
    let text = text.canonical_string();
    let mut data = h.borrow_mut();
    let path = data.path.clone();
    let file = data.file.as_mut().ok_or_else(|| closed_err(&path))?;
    file.write_all(text.as_bytes()).map_err(io_err)?;
    Ok(Value::Int(text.len() as i64))
}

pub fn fseek(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let h = expect_handle("fseek", args)?;
    let [_, offset, whence] = args else { return Err(arity_error("fseek", 3, args.len())) };
    let (Value::Int(offset), Value::Int(whence)) = (offset, whence) else {
        return Err(type_error("'fseek' expects an int offset and an int whence"));
    };
    let seek_from = match whence {
        0 => SeekFrom::Start((*offset).max(0) as u64),
        1 => SeekFrom::Current(*offset),
        2 => SeekFrom::End(*offset),
        other => return Err(type_error(format!("'fseek' expects whence in {{0, 1, 2}}, got {other}"))),
    };
    let mut data = h.borrow_mut();
    let path = data.path.clone();
    let file = data.file.as_mut().ok_or_else(|| closed_err(&path))?;
    file.seek(seek_from).map_err(io_err)?;
    Ok(Value::Nil)
}

pub fn ftell(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let h = expect_handle("ftell", args)?;
    let mut data = h.borrow_mut();
    let path = data.path.clone();
    let file = data.file.as_mut().ok_or_else(|| closed_err(&path))?;
    let pos = file.stream_position().map_err(io_err)?;
    Ok(Value::Int(pos as i64))
}
