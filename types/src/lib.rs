pub mod access;
pub mod csv;
mod error;
pub mod report;
mod role;
pub mod summary;
mod user;
mod viewer;

pub use access::{AccessRequirement, gates};
pub use error::{Error, Result, ValidationError};
pub use report::{Report, ReportFilter, ReportRow};
pub use role::Role;
pub use summary::SummaryView;
pub use user::{UserForm, UserQuery, UserRecord};
pub use viewer::Viewer;

pub const SESSION_COOKIE_NAME: &str = "roster_session";

#[doc(hidden)]
pub use anyhow::anyhow as internal_anyhow_dont_use;

/// Build an ad-hoc [`Error`] from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_anyhow($crate::internal_anyhow_dont_use!($($arg)*))
    };
}
