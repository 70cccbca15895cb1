//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used as a transaction title.
    #[error("transaction title cannot be empty")]
    EmptyTitle,

    /// An empty string was used as a user's display name.
    #[error("name cannot be empty")]
    EmptyName,

    /// A zero or negative amount was used to create a transaction.
    ///
    /// Transactions record a quantity of money changing hands, so the amount
    /// must always be positive. Whether money was earned or spent is
    /// expressed by the transaction kind, not the sign of the amount.
    #[error("transaction amounts must be greater than zero")]
    NonPositiveAmount,

    /// A transaction was marked as recurring without saying how often it
    /// recurs.
    #[error("a recurring transaction must specify a recurrence")]
    MissingRecurrence,

    /// A negative amount was used to set a monthly budget.
    #[error("budget amounts must not be negative")]
    NegativeBudgetAmount,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unexpected error occurred while creating a bearer token.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The email used to create or update a user is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// Date arithmetic stepped outside the calendar range the date library
    /// supports.
    #[error("the date is outside the supported calendar range")]
    DateOutOfRange,

    /// A recurring template's cursor was updated by another sync between this
    /// sync reading the template and trying to advance it. The occurrences
    /// belong to whichever call won; this call must not insert them again.
    #[error("the template cursor was advanced by a concurrent sync")]
    CursorConflict,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created. A
    /// resource owned by another user is reported identically so that clients
    /// cannot probe for other users' records.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::EmptyTitle
            | Error::EmptyName
            | Error::NonPositiveAmount
            | Error::MissingRecurrence
            | Error::NegativeBudgetAmount
            | Error::TooWeak(_)
            | Error::DuplicateEmail => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let cases = [
            Error::EmptyTitle,
            Error::EmptyName,
            Error::NonPositiveAmount,
            Error::MissingRecurrence,
            Error::NegativeBudgetAmount,
            Error::DuplicateEmail,
        ];

        for error in cases {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = Error::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn sql_no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(error, Error::NotFound);
    }
}
