//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for a User.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random UserId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a UserId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// First and last name of a user, as shown to counterparties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserName {
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Silva")]
    pub last_name: String,
}

/// A wallet holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Wallet balance in cents
    pub wallet: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with the given opening balance.
    ///
    /// # Validation
    /// - First name cannot be empty
    /// - Opening wallet cannot be negative
    pub fn new(first_name: String, last_name: String, wallet: i64) -> Result<Self, DomainError> {
        if first_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "First name cannot be empty".into(),
            ));
        }
        if wallet < 0 {
            return Err(DomainError::ValidationError(
                "Opening wallet cannot be negative".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: UserId::new(),
            first_name,
            last_name,
            wallet,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a user with all fields specified (for database reconstruction).
    pub fn from_parts(
        id: UserId,
        first_name: String,
        last_name: String,
        wallet: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            wallet,
            created_at,
            updated_at,
        }
    }

    /// Returns the display name of this user.
    pub fn name(&self) -> UserName {
        UserName {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Checks if the wallet covers a payment of `value`.
    ///
    /// An empty wallet is not checked and may go negative.
    pub fn has_sufficient_funds(&self, value: i64) -> bool {
        self.wallet == 0 || self.wallet >= value
    }

    /// Adds `value` to the wallet.
    pub fn credit(&mut self, value: i64) -> Result<(), DomainError> {
        self.wallet = self
            .wallet
            .checked_add(value)
            .ok_or(DomainError::BalanceOverflow)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Subtracts `value` from the wallet.
    pub fn debit(&mut self, value: i64) -> Result<(), DomainError> {
        if !self.has_sufficient_funds(value) {
            return Err(DomainError::InsufficientFunds {
                available: self.wallet,
                requested: value,
            });
        }
        self.wallet = self
            .wallet
            .checked_sub(value)
            .ok_or(DomainError::BalanceOverflow)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}
