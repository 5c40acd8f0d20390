//! Error types for the pix service.

use crate::domain::UserId;
use crate::ports::KeyError;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Cannot pay a pix requested by yourself")]
    SelfPay,

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Pix is not open for payment")]
    InvalidKey,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Wallet balance out of range")]
    BalanceOverflow,
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors returned by the service.
///
/// The HTTP adapter decides which status code each variant gets.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("It was not possible to receive the pix from the same user")]
    SelfPay,

    #[error("You don't have enough balance to make the payment")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid key for payment")]
    InvalidKey,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(DomainError::SelfPay) => AppError::SelfPay,
            RepoError::Domain(DomainError::InsufficientFunds {
                available,
                requested,
            }) => AppError::InsufficientFunds {
                available,
                requested,
            },
            RepoError::Domain(DomainError::UserNotFound(id)) => {
                AppError::NotFound(format!("User not found: {}", id))
            }
            RepoError::Domain(DomainError::InvalidKey) => AppError::InvalidKey,
            RepoError::Domain(DomainError::ValidationError(msg)) => AppError::BadRequest(msg),
            RepoError::Domain(DomainError::BalanceOverflow) => {
                AppError::BadRequest("Payment value is out of range for these wallets".into())
            }
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::BadRequest(e),
        }
    }
}

impl From<KeyError> for AppError {
    fn from(_: KeyError) -> Self {
        AppError::InvalidKey
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_errors_map_to_pix_kinds() {
        assert!(matches!(
            AppError::from(RepoError::Domain(DomainError::InvalidKey)),
            AppError::InvalidKey
        ));
        assert!(matches!(
            AppError::from(RepoError::Domain(DomainError::InsufficientFunds {
                available: 10,
                requested: 20
            })),
            AppError::InsufficientFunds {
                available: 10,
                requested: 20
            }
        ));
        assert!(matches!(
            AppError::from(RepoError::Database("boom".into())),
            AppError::Internal(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::Domain(DomainError::BalanceOverflow)),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_key_error_is_invalid_key() {
        assert!(matches!(
            AppError::from(KeyError::Malformed),
            AppError::InvalidKey
        ));
    }

    #[test]
    fn test_messages_match_wire_contract() {
        assert_eq!(
            AppError::SelfPay.to_string(),
            "It was not possible to receive the pix from the same user"
        );
        assert_eq!(AppError::InvalidKey.to_string(), "Invalid key for payment");
    }
}
