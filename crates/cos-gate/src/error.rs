use std::fmt;

/// Errors that can occur while deciding on a permission.
///
/// A denial is not an error: it is reported as
/// [`PermissionVerdict::Denied`](crate::PermissionVerdict::Denied).
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The prompter could not present the request at all.
    #[error("prompter failed: {0}")]
    Prompter(String),

    /// The decision store could not be read or written.
    #[error("permission store error: {0}")]
    Store(String),
}

impl PartialEq for GateError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

impl Eq for GateError {}

/// Result alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;
