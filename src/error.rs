//! Submodule defining the errors surfaced by the engine.

/// Errors produced by engine operations.
///
/// These map directly onto the HTTP status codes of the external handler
/// (400 and 404 respectively); the engine itself never deals in status
/// codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The request was malformed: an unknown filter option, a missing
    /// required parameter, an invalid enum literal, a duplicate id/email
    /// on insert, and so on.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// The referenced account id does not exist.
    #[error("account not found")]
    NotFound,
}

/// Convenience alias for engine operations.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Builds a [`Error::BadRequest`] from anything displayable.
    pub fn bad_request(message: impl core::fmt::Display) -> Self {
        Error::BadRequest(message.to_string())
    }
}
