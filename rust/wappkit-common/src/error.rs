use thiserror::Error;

/// The single error type surfaced by stream operations.
///
/// Every failure (opening a target, touching a closed handle, or an
/// underlying read/write/seek/tell failure) is reported through this type
/// with a human-readable message. The [`ErrorKind`] is available for
/// diagnostics, but callers are not expected to branch on it.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the underlying `std::io::Error`, if this error wraps one.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        match self.kind() {
            ErrorKind::Open { source, .. } | ErrorKind::Io { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn open(path: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Open {
                path: path.into(),
                source,
            }
            .into(),
        )
    }

    pub fn invalid_handle(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidHandle {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn invalid_mode(mode: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidMode { mode: mode.into() }.into())
    }

    pub fn invalid_target(target: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidTarget {
                target: target.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("unable to open \"{path}\": {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid resource: cannot {operation} a closed stream")]
    InvalidHandle { operation: String },

    #[error("invalid open mode \"{mode}\"")]
    InvalidMode { mode: String },

    #[error("invalid stream target \"{target}\": {message}")]
    InvalidTarget { target: String, message: String },

    #[error("unable to {context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("perform I/O", e)
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        match e.into_kind() {
            ErrorKind::Open { source, .. } | ErrorKind::Io { source, .. } => source,
            kind @ ErrorKind::InvalidHandle { .. } => {
                std::io::Error::new(std::io::ErrorKind::NotConnected, kind.to_string())
            }
            kind => std::io::Error::new(std::io::ErrorKind::InvalidInput, kind.to_string()),
        }
    }
}
