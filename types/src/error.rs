use std::fmt;

use jiff::civil::Date;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A serializable-on-demand error for server functions.
///
/// Wraps an [`anyhow::Error`] so the full chain (and backtrace, when
/// `RUST_BACKTRACE=1` is set) survives the trip to the client, plus a status
/// code the client uses to decide between a banner and a login redirect.
pub struct Error {
    inner: anyhow::Error,
    code: u16,
}

impl Error {
    pub fn from_anyhow(inner: anyhow::Error) -> Self {
        let code = if inner.is::<ValidationError>() {
            422
        } else {
            500
        };
        Self { inner, code }
    }

    /// No usable session on the request.
    pub fn unauthorized(message: impl fmt::Display) -> Self {
        Self {
            inner: anyhow::anyhow!("{message}"),
            code: 401,
        }
    }

    /// A session exists but the gate denied it.
    pub fn forbidden(message: impl fmt::Display) -> Self {
        Self {
            inner: anyhow::anyhow!("{message}"),
            code: 403,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        self.inner.downcast_ref()
    }

    pub fn chain(&self) -> Vec<String> {
        self.inner.chain().map(|e| e.to_string()).collect()
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.inner
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl<E> From<E> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::from_anyhow(anyhow::Error::from(error))
    }
}

#[cfg(feature = "server")]
impl From<Error> for dioxus::server::ServerFnError {
    fn from(error: Error) -> Self {
        use std::backtrace::BacktraceStatus;

        let backtrace = match error.inner.backtrace().status() {
            BacktraceStatus::Captured => Some(error.inner.backtrace().to_string()),
            _ => None,
        };

        Self::ServerError {
            message: error.to_string(),
            code: error.code,
            details: Some(serde_json::json!({
                "chain": error.chain(),
                "backtrace": backtrace,
            })),
        }
    }
}

/// Input the requester must fix. Surfaced as-is, never silently corrected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: Date, end: Date },
    #[error("{0} is required")]
    Required(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("a user with email '{0}' already exists")]
    EmailTaken(String),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}
