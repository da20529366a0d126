use std::{fmt, io};

use thiserror::Error as ThisError;


/// Generation step that failed.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum ErrorKind {
    /// RPC convention selector is neither `grpc` nor `thrift`
    InvalidConvention,
    /// Configuration file missing or unreadable
    Config,
    /// Malformed configuration or field-mapping document
    Parse,
    /// File or directory operation
    Io,
    /// External command could not run or exited with failure
    Command,
    /// Stub sources don't contain an expected item
    Introspection,
    /// Generated code fragment is not valid Rust
    Template,
}

impl ErrorKind {
    /// Return an error of this kind.
    pub fn error<M: Into<String>>(self, message: M) -> Error {
        Error { kind: self, message: message.into() }
    }

    /// Return `Err` of this kind.
    pub fn err<T, M: Into<String>>(self, message: M) -> Result<T> {
        Err(self.error(message))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::InvalidConvention => "invalid rpc type",
            ErrorKind::Config => "configuration error",
            ErrorKind::Parse => "parse error",
            ErrorKind::Io => "io error",
            ErrorKind::Command => "command failed",
            ErrorKind::Introspection => "introspection error",
            ErrorKind::Template => "template error",
        })
    }
}


/// Generation-time error. Every one of them aborts the run.
#[derive(Clone,Debug,PartialEq,ThisError)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, Error>;


impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io.error(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        ErrorKind::Parse.error(err.to_string())
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        ErrorKind::Parse.error(err.to_string())
    }
}
