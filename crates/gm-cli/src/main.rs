//! Command-line entry point: no arguments starts an interactive REPL, one
//! positional argument runs that file and exits. Mirrors the teacher's
//! `bin/ouros-repl.rs` file-vs-interactive dispatch and `read_line` helper,
//! trimmed to this language's REPL surface (no resumable host calls).

use std::io::{self, Write};
use std::process::ExitCode;

use gm_core::repl::{ExecError, MetaCommand, ReplSession};
use gm_core::{Runtime, Value};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 2 {
        eprintln!("usage: gm [script.gm]");
        return ExitCode::FAILURE;
    }

    if let Some(path) = args.get(1) {
        return run_file(path);
    }

    run_repl();
    ExitCode::SUCCESS
}

fn run_file(path: &str) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut rt = Runtime::new();
    match gm_core::run(&source, &mut rt) {
        Ok(Value::Error(e)) => {
            eprintln!("{}", e.message);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(ExecError::Parse(errors)) => {
            for e in &errors {
                eprintln!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run_repl() {
    let mut session = ReplSession::new();
    loop {
        let Some(line) = read_line(">>> ") else {
            println!();
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Some(cmd) = session.meta(&line) {
            match cmd {
                MetaCommand::Exit => break,
                MetaCommand::Scope(names) => {
                    if names.is_empty() {
                        println!("(no bindings)");
                    } else {
                        for name in names {
                            println!("{name}");
                        }
                    }
                }
                MetaCommand::Cleared => println!("scope cleared"),
                MetaCommand::Unknown(cmd) => println!("unknown command: {cmd}"),
            }
            continue;
        }
        match session.execute(&line) {
            Ok(Value::Nil) => {}
            Ok(Value::Error(e)) => eprintln!("{}", e.message),
            Ok(v) => println!("{v}"),
            Err(err) => eprintln!("{err}"),
        }
    }
}

fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).ok()?;
    if read == 0 {
        return None;
    }
    Some(input.trim_end_matches(['\r', '\n']).to_owned())
}
