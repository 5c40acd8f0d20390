//! Pix Application Service
//!
//! Orchestrates domain operations through the repository and key codec ports.
//! Contains NO infrastructure logic - pure business orchestration.

use tracing::{info, warn};

use pix_types::{
    AppError, CreateUserRequest, DomainError, PaymentResponse, PixKeyCodec, PixRepository,
    RepoError, SettlePix, SettledPix, TransactionEntry, TransactionKind, User, UserId,
};

const PAYMENT_OK: &str = "Payment made successfully";
const CUSTOMERS_NOT_FOUND: &str = "We can't find the transaction's customers, generate a new key";

/// Application service for pix operations.
///
/// Generic over `R: PixRepository` and `K: PixKeyCodec` - the adapters are
/// injected at compile time, so tests can run against an in-memory repo.
pub struct PixService<R: PixRepository, K: PixKeyCodec> {
    repo: R,
    codec: K,
}

impl<R: PixRepository, K: PixKeyCodec> PixService<R, K> {
    /// Creates a new pix service with the given repository and key codec.
    pub fn new(repo: R, codec: K) -> Self {
        Self { repo, codec }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Returns a reference to the key codec.
    pub fn codec(&self) -> &K {
        &self.codec
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────────

    /// Signs up a user and issues their API key.
    ///
    /// Returns the user and the raw key, which is never retrievable again.
    #[tracing::instrument(skip(self, req))]
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<(User, String), AppError> {
        if req.first_name.trim().is_empty() {
            return Err(AppError::BadRequest("First name cannot be empty".into()));
        }

        let user = self.repo.create_user(req).await?;
        let (_api_key, raw_key) = self.repo.create_api_key(user.id).await?;

        info!(user_id = %user.id, "user created");
        Ok((user, raw_key))
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", id)))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Pix
    // ─────────────────────────────────────────────────────────────────────────────

    /// Opens a payment request for `user` and returns the key to share with a payer.
    ///
    /// `value` is not validated.
    #[tracing::instrument(skip(self), fields(user_id = %user))]
    pub async fn request(&self, value: i64, user: UserId) -> Result<String, AppError> {
        let requester = self.get_user(user).await?;

        let pix = self.repo.create_pix(requester.id, value).await?;
        let key = self.codec.encode(requester.id, value, pix.id);

        info!(pix_id = %pix.id, "pix requested");
        Ok(key)
    }

    /// Pays the payment request identified by `key` from `user`'s wallet.
    #[tracing::instrument(skip(self, key), fields(user_id = %user))]
    pub async fn pay(&self, key: &str, user: UserId) -> Result<PaymentResponse, AppError> {
        let decoded = self.codec.decode(key).inspect_err(|e| {
            warn!(error = %e, "rejected pix key");
        })?;

        if decoded.user_id == user {
            warn!("self payment rejected");
            return Err(AppError::SelfPay);
        }

        let settle = SettlePix {
            pix_id: decoded.register_id,
            requesting_user_id: decoded.user_id,
            paying_user_id: user,
            value: decoded.value,
        };

        let pix = self.repo.settle_pix(settle).await.map_err(|e| {
            warn!(error = %e, pix_id = %settle.pix_id, "pix payment rejected");
            match e {
                RepoError::Domain(DomainError::UserNotFound(_)) => {
                    AppError::NotFound(CUSTOMERS_NOT_FOUND.into())
                }
                other => other.into(),
            }
        })?;

        info!(pix_id = %pix.id, value = pix.value, "pix paid");
        Ok(PaymentResponse {
            msg: PAYMENT_OK.into(),
        })
    }

    /// Lists the settled pix the user received or paid, newest first.
    ///
    /// Entries with equal timestamps keep received-before-paid order.
    #[tracing::instrument(skip(self), fields(user_id = %user))]
    pub async fn transactions(&self, user: UserId) -> Result<Vec<TransactionEntry>, AppError> {
        let received = self.repo.list_received(user).await?;
        let paid = self.repo.list_paid(user).await?;

        let mut entries: Vec<TransactionEntry> = received
            .into_iter()
            .map(|s| entry(s, TransactionKind::Received))
            .chain(paid.into_iter().map(|s| entry(s, TransactionKind::Paid)))
            .collect();

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }
}

fn entry(settled: SettledPix, kind: TransactionKind) -> TransactionEntry {
    TransactionEntry {
        value: settled.pix.value,
        user: settled.counterparty,
        updated_at: settled.pix.updated_at,
        kind,
    }
}
