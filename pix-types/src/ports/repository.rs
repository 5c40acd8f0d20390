//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory) implement this trait.

use crate::domain::{ApiKey, Pix, PixId, SettlePix, SettledPix, User, UserId};
use crate::dto::CreateUserRequest;
use crate::error::RepoError;

/// The main repository port for pix operations.
///
/// `settle_pix` MUST be atomic: both wallet writes and the status
/// transition commit together or not at all.
#[async_trait::async_trait]
pub trait PixRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a new user with the requested opening wallet.
    async fn create_user(&self, req: CreateUserRequest) -> Result<User, RepoError>;

    /// Gets a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Pix Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists a new `open` pix requested by `requesting_user_id`.
    async fn create_pix(&self, requesting_user_id: UserId, value: i64) -> Result<Pix, RepoError>;

    /// Gets a pix by ID, whatever its status.
    async fn get_pix(&self, id: PixId) -> Result<Option<Pix>, RepoError>;

    /// Settles an open pix (MUST be atomic).
    ///
    /// Fails, in this order, with:
    /// - `InsufficientFunds` if the payer exists and cannot cover the value
    /// - `UserNotFound` if either user is missing
    /// - `InvalidKey` if no matching open pix exists
    async fn settle_pix(&self, req: SettlePix) -> Result<Pix, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────────

    /// Closed pix requested by the user, with the payer as counterparty.
    async fn list_received(&self, user_id: UserId) -> Result<Vec<SettledPix>, RepoError>;

    /// Closed pix paid by the user, with the requester as counterparty.
    async fn list_paid(&self, user_id: UserId) -> Result<Vec<SettledPix>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // API Keys
    // ─────────────────────────────────────────────────────────────────────────────

    /// Issues a new API key for the user. Returns the stored key and the raw secret.
    async fn create_api_key(&self, user_id: UserId) -> Result<(ApiKey, String), RepoError>;

    /// Looks up an active API key by hash and records its use.
    async fn verify_api_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError>;
}
