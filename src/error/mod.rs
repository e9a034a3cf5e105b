pub(crate) mod internal;

use std::error;
use std::fmt;
use std::io;

use chrono::NaiveDate;

use crate::error::internal::{Error, ErrorKind};

#[derive(Debug)]
pub enum SiakadError {
    // Operation requires a signed in principal.
    Unauthenticated,
    // The gate decided a view which does not permit the operation.
    Forbidden { view: String },
    Validation(String),
    // Attendance for the date was already recorded.
    AlreadyRecorded { date: NaiveDate },
    // Fault reported by the data access collaborator.
    Backend { code: Option<String>, message: String },
    Internal(Error),
}

impl SiakadError {
    pub fn validation(message: impl Into<String>) -> Self {
        SiakadError::Validation(message.into())
    }

    pub fn backend(code: Option<&str>, message: impl Into<String>) -> Self {
        SiakadError::Backend {
            code: code.map(str::to_owned),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SiakadError::Validation(_))
    }

    /// Captured where an internal error was raised.
    pub fn backtrace(&self) -> Option<&backtrace::Backtrace> {
        match self {
            SiakadError::Internal(err) => err.backtrace(),
            _ => None,
        }
    }
}

impl fmt::Display for SiakadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SiakadError::Unauthenticated => write!(f, "unauthenticated"),
            SiakadError::Forbidden { view } => {
                write!(f, "operation not permitted from view {}", view)
            }
            SiakadError::Validation(message) => write!(f, "invalid input: {}", message),
            SiakadError::AlreadyRecorded { date } => {
                write!(f, "attendance for {} already recorded", date)
            }
            SiakadError::Backend {
                code: Some(code),
                message,
            } => write!(f, "backend error({}): {}", code, message),
            SiakadError::Backend {
                code: None,
                message,
            } => write!(f, "backend error: {}", message),
            SiakadError::Internal(err) => err.fmt(f),
        }
    }
}

impl error::Error for SiakadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SiakadError::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Error> for SiakadError {
    fn from(err: Error) -> Self {
        match err.kind() {
            ErrorKind::Backend { code, message, .. } => SiakadError::Backend {
                code: code.clone(),
                message: message.clone(),
            },
            _ => SiakadError::Internal(err),
        }
    }
}

impl From<ErrorKind> for SiakadError {
    fn from(kind: ErrorKind) -> Self {
        SiakadError::from(Error::from(kind))
    }
}

impl From<io::Error> for SiakadError {
    fn from(err: io::Error) -> Self {
        SiakadError::from(Error::from(err))
    }
}

impl From<serde_json::Error> for SiakadError {
    fn from(err: serde_json::Error) -> Self {
        SiakadError::from(Error::from(err))
    }
}

impl From<serde_yaml::Error> for SiakadError {
    fn from(err: serde_yaml::Error) -> Self {
        SiakadError::from(Error::from(err))
    }
}

impl From<reqwest::Error> for SiakadError {
    fn from(err: reqwest::Error) -> Self {
        SiakadError::from(Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_surfaces_as_backend_variant() {
        let err = SiakadError::from(ErrorKind::Backend {
            status: Some(409),
            code: Some("23505".into()),
            message: "duplicate key".into(),
        });
        assert!(matches!(
            err,
            SiakadError::Backend { code: Some(ref c), .. } if c == "23505"
        ));
        assert_eq!(err.to_string(), "backend error(23505): duplicate key");
    }

    #[test]
    fn other_kinds_stay_internal() {
        let err = SiakadError::from(io::Error::new(io::ErrorKind::NotFound, "config.yaml"));
        assert!(matches!(err, SiakadError::Internal(_)));
        assert!(error::Error::source(&err).is_some());
        assert!(err.backtrace().is_some());
        assert!(SiakadError::Unauthenticated.backtrace().is_none());
    }
}
