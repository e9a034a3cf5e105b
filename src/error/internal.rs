use std::error;
use std::fmt;
use std::io;

use backtrace::Backtrace;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    backtrace: Option<Backtrace>,
}

#[derive(Debug)]
pub enum ErrorKind {
    Io(io::Error),
    Http(reqwest::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    // Non success response from the remote service.
    Backend {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },
    Config(String),
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            ErrorKind::Io(err) => err.fmt(f),
            ErrorKind::Http(err) => write!(f, "http request failed. {}", err),
            ErrorKind::Json(err) => write!(f, "json decode error. {}", err),
            ErrorKind::Yaml(err) => write!(f, "yaml decode error. {}", err),
            ErrorKind::Backend {
                status, message, ..
            } => match status {
                Some(status) => write!(f, "backend responded {}. {}", status, message),
                None => write!(f, "backend error. {}", message),
            },
            ErrorKind::Config(description) => write!(f, "invalid config. {}", description),
            ErrorKind::Internal(description) => write!(f, "internal error. {}", description),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::from(ErrorKind::Io(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::from(ErrorKind::Http(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::from(ErrorKind::Json(err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::from(ErrorKind::Yaml(err))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::with_backtrace(kind)
    }
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }

    fn with_backtrace(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Some(Backtrace::new()),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Io(err) => Some(err),
            ErrorKind::Http(err) => Some(err),
            ErrorKind::Json(err) => Some(err),
            ErrorKind::Yaml(err) => Some(err),
            _ => None,
        }
    }
}
