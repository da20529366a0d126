//! External programs run by the generation: stub compilers and `rustfmt`.
use std::{
    path::Path,
    process::{Command, Stdio},
};

use tracing::{debug, info};

use crate::{ErrorKind, Result};


/// Render a command line for logs and errors.
fn command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line
}

/// Run `program` with `args` and wait for it to finish. Standard streams are
/// inherited.
pub fn run<S: AsRef<str>>(program: &str, args: &[S]) -> Result<()> {
    let line = command_line(program, args);
    info!(command = %line, "running");

    let status = Command::new(program)
        .args(args.iter().map(AsRef::as_ref))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .or_else(|err| ErrorKind::Command.err(format!("`{}`: {}", line, err)))?;

    match status.success() {
        true => Ok(()),
        false => ErrorKind::Command.err(format!("`{}` exited with {}", line, status)),
    }
}

/// Split an options string into arguments, on whitespace.
pub fn split_options(options: &str) -> Vec<String> {
    options.split_whitespace().map(String::from).collect()
}

/// Format a generated source in place.
pub fn rustfmt(path: &Path) -> Result<()> {
    debug!(path = %path.display(), "formatting");
    let path = path.to_string_lossy();
    run("rustfmt", &["--edition", "2018", path.as_ref()])
}
