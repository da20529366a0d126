use thiserror::Error as ThisError;


/// Kind of error returned by a generated switcher at serving time.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum ErrorKind {
    /// Method name has no case in the switcher
    UnknownMethod,
    /// Composite type name has no case in the struct argument builder
    UnknownType,
    /// Request parameters could not be decoded into the target value
    Decode,
    /// The stub call itself failed
    Rpc,
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

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::UnknownMethod => "unknown method",
            ErrorKind::UnknownType => "unknown type",
            ErrorKind::Decode => "decode error",
            ErrorKind::Rpc => "rpc error",
        })
    }
}


/// Serving-time error, handed back to the server runtime which decides how it
/// maps to an HTTP response.
#[derive(Clone,Debug,PartialEq,ThisError)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, Error>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ErrorKind::UnknownMethod.error("No such method[Get]");
        assert_eq!(err.to_string(), "unknown method: No such method[Get]");
        assert_eq!(ErrorKind::Rpc.err::<(), _>("down").unwrap_err().kind, ErrorKind::Rpc);
    }
}
