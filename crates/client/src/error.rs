//! Client-side error taxonomy.
//!
//! Three kinds of failure reach a controller:
//! - [`ValidationError`] - required-field checks; never touches the network
//! - [`GatewayError::Transport`] - the remote could not be reached
//! - [`GatewayError::Remote`] - the remote answered with a non-2xx status

use herool_core::{EmailError, RequestId, UserRole};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::session::SessionError;

/// Local input validation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields are empty.
    #[error("All fields are required")]
    MissingFields,

    /// Login attempted without email or password.
    #[error("Email and password are required")]
    MissingCredentials,

    /// Email address is structurally invalid.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Registration password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Registration password is too short.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },

    /// The selected request is not in the current list.
    #[error("Request {0} is not available")]
    UnknownRequest(RequestId),

    /// The technician already has an offer on this request.
    #[error("You already submitted an offer for request {0}")]
    DuplicateOffer(RequestId),
}

/// Errors returned by controller actions and auth flows.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The remote gateway failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The session could not be persisted.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The account's role does not match the view or the role asked for.
    #[error("account is registered as {actual}, not {expected}")]
    RoleMismatch {
        /// Role that was required.
        expected: UserRole,
        /// Role the remote reports for the account.
        actual: UserRole,
    },

    /// No user is signed in.
    #[error("not signed in")]
    NotSignedIn,
}

impl ClientError {
    /// Message suitable for inline display next to the action that failed.
    ///
    /// Remote failures show the server's own message when it sent one;
    /// everything else falls back to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Gateway(e) => e.user_message(fallback),
            Self::RoleMismatch { .. } => self.to_string(),
            Self::Session(_) | Self::NotSignedIn => fallback.to_owned(),
        }
    }
}
