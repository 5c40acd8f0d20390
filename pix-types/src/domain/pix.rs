//! Pix payment-request domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{UserId, UserName};
use crate::error::DomainError;

/// Unique identifier for a Pix record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PixId(Uuid);

impl PixId {
    /// Creates a new random PixId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PixId from an existing UUID.
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

impl Default for PixId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PixId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PixId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle of a payment request. `Open` until paid, then `Close` forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PixStatus {
    Open,
    Close,
}

impl PixStatus {
    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PixStatus::Open => "open",
            PixStatus::Close => "close",
        }
    }
}

impl std::fmt::Display for PixStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PixStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PixStatus::Open),
            "close" => Ok(PixStatus::Close),
            other => Err(DomainError::ValidationError(format!(
                "Unknown pix status: {}",
                other
            ))),
        }
    }
}

/// A payment request raised by one user and, once settled, paid by another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pix {
    pub id: PixId,
    /// Requested amount in cents. Not validated: zero and negative values are kept as given.
    pub value: i64,
    pub status: PixStatus,
    pub requesting_user_id: UserId,
    pub paying_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pix {
    /// Opens a new payment request.
    pub fn open(requesting_user_id: UserId, value: i64) -> Self {
        let now = Utc::now();
        Self {
            id: PixId::new(),
            value,
            status: PixStatus::Open,
            requesting_user_id,
            paying_user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a pix from database fields.
    pub fn from_parts(
        id: PixId,
        value: i64,
        status: PixStatus,
        requesting_user_id: UserId,
        paying_user_id: Option<UserId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            value,
            status,
            requesting_user_id,
            paying_user_id,
            created_at,
            updated_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PixStatus::Open
    }

    /// Returns true if this open pix is the one described by a settlement.
    pub fn matches(&self, settle: &SettlePix) -> bool {
        self.is_open()
            && self.id == settle.pix_id
            && self.requesting_user_id == settle.requesting_user_id
            && self.value == settle.value
    }

    /// Closes the pix on behalf of `payer`.
    ///
    /// A closed pix can never be closed again.
    pub fn close(&mut self, payer: UserId) -> Result<(), DomainError> {
        if !self.is_open() {
            return Err(DomainError::InvalidKey);
        }
        self.status = PixStatus::Close;
        self.paying_user_id = Some(payer);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Everything a repository needs to settle one payment atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePix {
    pub pix_id: PixId,
    pub requesting_user_id: UserId,
    pub paying_user_id: UserId,
    pub value: i64,
}

/// A closed pix together with the name of the other party.
#[derive(Debug, Clone)]
pub struct SettledPix {
    pub pix: Pix,
    pub counterparty: UserName,
}
