use thiserror::Error;

/// Failure surfaced by any concept operation.
///
/// Concepts never answer with a "did not happen" message: every refusal is
/// one of these variants, and callers map the [`ErrorKind`] to a status.
#[derive(Debug, Error)]
pub enum ConceptError {
    /// Referenced entity or record is absent.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness invariant would be violated.
    #[error("{0}")]
    Duplicate(String),

    /// The actor lacks the required relationship (resident, owner, voter).
    #[error("{0}")]
    NotAllowed(String),

    /// A debit exceeds the account balance.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    /// Malformed or out-of-range input.
    #[error("{0}")]
    InvalidInput(String),

    /// The document store failed underneath the concept.
    #[error("storage error: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    NotAllowed,
    InsufficientBalance,
    InvalidInput,
    Store,
}

impl ConceptError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn not_allowed(msg: impl Into<String>) -> Self {
        Self::NotAllowed(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::NotAllowed(_) => ErrorKind::NotAllowed,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Store(_) => ErrorKind::Store,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConceptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_convert_from_anyhow() {
        let err: ConceptError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(err.to_string(), "storage error: disk on fire");
    }

    #[test]
    fn insufficient_balance_message_names_both_amounts() {
        let err = ConceptError::InsufficientBalance {
            requested: 1000,
            available: 70,
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: requested 1000, available 70"
        );
    }
}
