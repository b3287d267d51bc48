//! Local validation failures and command-level outcomes.
//!
//! Validation errors are reported to the user immediately and never reach
//! the network.

use thiserror::Error;

use crate::search::query::MAX_TERMS;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Search term cannot be empty")]
    EmptyTerm,

    #[error("'{0}' is already part of the search")]
    DuplicateTerm(String),

    #[error("Maximum {MAX_TERMS} search terms allowed")]
    TooManyTerms,

    #[error("Title is required")]
    EmptyTitle,

    #[error("Please select at least one data product")]
    EmptySelection,

    /// A product id that is not part of the rendered result list.
    #[error("Data product {0} is not in the current results")]
    UnknownProduct(i64),

    #[error("Invalid filter '{0}'")]
    UnknownFilter(String),

    #[error("Invalid category '{0}'")]
    UnknownCategory(String),
}

/// Why a non-interactive command did not complete.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend wants the user to sign in; `redirect` is the login location.
    #[error("login required (visit {redirect} or run `studyscope login`)")]
    LoginRequired { redirect: String },

    /// A failure already rendered as user-facing text.
    #[error("{0}")]
    Failed(String),
}

impl SessionError {
    /// Process exit code: 2 validation, 3 login required, 1 anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::Validation(_) => 2,
            SessionError::LoginRequired { .. } => 3,
            SessionError::Failed(_) => 1,
        }
    }
}
