//! User-facing error taxonomy.
//!
//! Session and book operations catch transport failures at their boundary
//! and return one of these instead. `Display` is the short message shown
//! inline to the user.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Login or registration rejected; carries the server's detail or a fallback
    #[error("{0}")]
    Auth(String),

    /// Refresh failed or was impossible; the session has been ended
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Transient(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_user_message() {
        assert_eq!(ClientError::Auth("Invalid credentials".into()).to_string(), "Invalid credentials");
        assert_eq!(ClientError::NotFound("Book not found").to_string(), "Book not found");
        assert_eq!(ClientError::Transient("Search failed").to_string(), "Search failed");
    }
}
