//! Validation errors for user-supplied goal and log data.

/// Errors raised while validating input at the request layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Goal title was empty or whitespace
    #[error("title must not be empty")]
    EmptyTitle,

    /// Cadence label is not one of daily, weekly, monthly
    #[error("invalid cadence `{0}`; expected daily|weekly|monthly")]
    InvalidCadence(String),

    /// Date is not a valid `YYYY-MM-DD` calendar date
    #[error("invalid date `{0}`; expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Identifier could not be decoded
    #[error("invalid id `{0}`")]
    InvalidId(String),
}
