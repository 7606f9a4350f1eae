use std::io::BufRead;

use super::arity_error;
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::value::Value;

pub fn print(rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let parts: Vec<String> = args.iter().map(Value::canonical_string).collect();
    rt.writer.write_str(&parts.join(" "));
    Ok(Value::Nil)
}

pub fn println(rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let parts: Vec<String> = args.iter().map(Value::canonical_string).collect();
    rt.writer.write_str(&parts.join(" "));
    rt.writer.write_str("\n");
    Ok(Value::Nil)
}

/// `printf(fmt, ...)`: `{}` placeholders are substituted in order with each
/// remaining argument's canonical string form.
pub fn printf(rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    let Some(Value::Str(fmt)) = args.first() else {
        return Err(super::type_error("'printf' expects a format string as its first argument"));
    };
    let fmt: String = fmt.iter().collect();
    let mut out = String::with_capacity(fmt.len());
    let mut rest = args[1..].iter();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            match rest.next() {
                Some(v) => out.push_str(&v.canonical_string()),
                None => out.push_str("{}"),
            }
        } else {
            out.push(c);
        }
    }
    rt.writer.write_str(&out);
    Ok(Value::Nil)
}

/// Reads one line from stdin, stripping the trailing newline. Returns an
/// empty string at EOF, matching the teacher's preference for an explicit
/// sentinel value over a special error path for ordinary stream exhaustion.
pub fn input(_rt: &mut Runtime, args: &[Value]) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        return Err(arity_error("input", 0, args.len()));
    }
    let stdin = std::io::stdin();
    let mut line = String::new();
    let _ = stdin.lock().read_line(&mut line);
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::str_from(&line))
}
