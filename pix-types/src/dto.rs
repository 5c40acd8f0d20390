//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{User, UserId, UserName};

// ─────────────────────────────────────────────────────────────────────────────
// User DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to sign up a new wallet holder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Silva")]
    pub last_name: String,
    /// Opening wallet balance in cents
    #[serde(default)]
    #[schema(example = 10000)]
    pub wallet: i64,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Silva")]
    pub last_name: String,
    /// Wallet balance in cents
    #[schema(example = 10000)]
    pub wallet: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            wallet: user.wallet,
        }
    }
}

/// Response after signing up. The raw API key is only ever shown here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub user: UserResponse,
    #[schema(example = "sk_abc123xyz...")]
    pub api_key: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pix DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to open a payment request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestPixRequest {
    /// Amount to receive in cents
    #[schema(example = 2500)]
    pub value: i64,
}

/// The key a payer needs to settle a payment request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PixKeyResponse {
    pub key: String,
}

/// Request to pay a payment request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayPixRequest {
    pub key: String,
}

/// Response after a successful payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(example = "Payment made successfully")]
    pub msg: String,
}

/// Direction of a settled pix from the point of view of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// The caller requested the pix and was paid
    Received,
    /// The caller paid someone else's pix
    Paid,
}

/// One line of the transaction history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionEntry {
    /// Amount in cents
    #[schema(example = 2500)]
    pub value: i64,
    /// The other party of the payment
    pub user: UserName,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}
