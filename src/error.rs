use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse failure classes; every [`Error`] variant maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotAnInterface,
    Parse,
    Cycle,
    Conflict,
    Unrenderable,
    TypeArgs,
    InvalidRef,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("package {path:?} not found")]
    PackageNotFound { path: String },

    #[error("no buildable Go source files in {}", dir.display())]
    NoGoFiles { dir: PathBuf },

    #[error("type {name} not found in package {pkg:?}")]
    TypeNotFound { pkg: String, name: String },

    #[error("unknown package qualifier {qualifier:?} in {}", file.display())]
    UnknownQualifier { qualifier: String, file: PathBuf },

    #[error("{name} is not an interface (it is a {found})")]
    NotAnInterface { name: String, found: &'static str },

    #[error("{}:{line}:{col}: {message}", file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        col: usize,
        message: String,
    },

    #[error("interface embedding cycle: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("method {method} has conflicting signatures in {first} and {second}")]
    Conflict {
        method: String,
        first: String,
        second: String,
    },

    #[error("cannot render {text:?}: {reason}")]
    Unrenderable { text: String, reason: String },

    #[error("{name} has {expected} type parameter(s) but {found} type argument(s) were given")]
    TypeArgs {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid interface reference {text:?}: {reason}")]
    InvalidRef { text: String, reason: String },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PackageNotFound { .. }
            | Error::NoGoFiles { .. }
            | Error::TypeNotFound { .. }
            | Error::UnknownQualifier { .. } => ErrorKind::NotFound,
            Error::NotAnInterface { .. } => ErrorKind::NotAnInterface,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Cycle { .. } => ErrorKind::Cycle,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Unrenderable { .. } => ErrorKind::Unrenderable,
            Error::TypeArgs { .. } => ErrorKind::TypeArgs,
            Error::InvalidRef { .. } => ErrorKind::InvalidRef,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
