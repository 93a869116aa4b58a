use thiserror::Error;

/// Precondition violations raised by the projection engine.
///
/// Every variant is reported before any output is produced: a call either
/// returns a complete value or sequence, or fails with one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// An argument is outside its permitted domain.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: String,
    },

    /// A contribution stream ran out before the horizon was covered.
    #[error("contribution stream supplied {supplied} yearly values, {needed} required")]
    InsufficientData { needed: u32, supplied: u32 },

    /// Percentage of original balance is undefined for a zero balance.
    #[error("starting balance is zero; percentage of original is undefined")]
    DivisionByZero,
}

impl ProjectionError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}
