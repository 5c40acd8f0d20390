//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use pix_types::{
    ApiKey, CreateUserRequest, DomainError, Pix, PixId, PixRepository, RepoError, SettlePix,
    SettledPix, User, UserId,
};

use crate::security::{generate_api_key, hash_api_key};
use crate::types::sqlite::{DbApiKey, DbPix, DbSettledPix, DbUser};

const PIX_COLUMNS: &str = "p.id, p.value, p.status, p.requesting_user_id, p.paying_user_id, p.created_at, p.updated_at";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (idempotent).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let ddl_keys = include_str!("../migrations/0002_create_api_keys.sql");
        sqlx::query(ddl_keys)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_settled(
        &self,
        user_id: UserId,
        own_column: &str,
        counterparty_column: &str,
    ) -> Result<Vec<SettledPix>, RepoError> {
        let sql = format!(
            "SELECT {PIX_COLUMNS}, u.first_name, u.last_name
             FROM pix p JOIN users u ON u.id = p.{counterparty_column}
             WHERE p.{own_column} = ? AND p.status = 'close'"
        );

        let rows: Vec<DbSettledPix> = sqlx::query_as(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbSettledPix::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PixRepository for SqliteRepo {
    async fn create_user(&self, req: CreateUserRequest) -> Result<User, RepoError> {
        let user = User::new(req.first_name, req.last_name, req.wallet)?;

        sqlx::query(
            r#"INSERT INTO users (id, first_name, last_name, wallet, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.wallet)
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            r#"SELECT id, first_name, last_name, wallet, created_at, updated_at FROM users WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbUser::into_domain).transpose()
    }

    async fn create_pix(&self, requesting_user_id: UserId, value: i64) -> Result<Pix, RepoError> {
        let pix = Pix::open(requesting_user_id, value);

        sqlx::query(
            r#"INSERT INTO pix (id, value, status, requesting_user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(pix.id.to_string())
        .bind(pix.value)
        .bind(pix.status.as_str())
        .bind(requesting_user_id.to_string())
        .bind(pix.created_at.to_rfc3339())
        .bind(pix.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(pix)
    }

    async fn get_pix(&self, id: PixId) -> Result<Option<Pix>, RepoError> {
        let row: Option<DbPix> = sqlx::query_as(
            r#"SELECT id, value, status, requesting_user_id, paying_user_id, created_at, updated_at FROM pix WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPix::into_domain).transpose()
    }

    async fn settle_pix(&self, req: SettlePix) -> Result<Pix, RepoError> {
        if req.requesting_user_id == req.paying_user_id {
            return Err(DomainError::SelfPay.into());
        }

        let requester_id = req.requesting_user_id.to_string();
        let payer_id = req.paying_user_id.to_string();
        let pix_id = req.pix_id.to_string();
        let now = Utc::now().to_rfc3339();

        // Every early return below drops `db_tx`, which rolls it back.
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        // Writing first takes the write lock before anything is read, so a
        // concurrent settlement waits here and then sees the pix closed.
        let closed = sqlx::query(
            r#"UPDATE pix SET status = 'close', paying_user_id = ?, updated_at = ?
               WHERE id = ? AND status = 'open' AND requesting_user_id = ? AND value = ?"#,
        )
        .bind(&payer_id)
        .bind(&now)
        .bind(&pix_id)
        .bind(&requester_id)
        .bind(req.value)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let user_sql = r#"SELECT id, first_name, last_name, wallet, created_at, updated_at FROM users WHERE id = ?"#;

        let requester: Option<DbUser> = sqlx::query_as(user_sql)
            .bind(&requester_id)
            .fetch_optional(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let payer: Option<DbUser> = sqlx::query_as(user_sql)
            .bind(&payer_id)
            .fetch_optional(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let requester = requester.map(DbUser::into_domain).transpose()?;
        let payer = payer.map(DbUser::into_domain).transpose()?;

        if let Some(payer) = &payer {
            if !payer.has_sufficient_funds(req.value) {
                return Err(DomainError::InsufficientFunds {
                    available: payer.wallet,
                    requested: req.value,
                }
                .into());
            }
        }

        let Some(mut requester) = requester else {
            return Err(DomainError::UserNotFound(req.requesting_user_id).into());
        };
        let Some(mut payer) = payer else {
            return Err(DomainError::UserNotFound(req.paying_user_id).into());
        };

        if closed.rows_affected() == 0 {
            return Err(DomainError::InvalidKey.into());
        }

        payer.debit(req.value)?;
        requester.credit(req.value)?;

        for user in [&payer, &requester] {
            sqlx::query(r#"UPDATE users SET wallet = ?, updated_at = ? WHERE id = ?"#)
                .bind(user.wallet)
                .bind(&now)
                .bind(user.id.to_string())
                .execute(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        let row: DbPix = sqlx::query_as(
            r#"SELECT id, value, status, requesting_user_id, paying_user_id, created_at, updated_at FROM pix WHERE id = ?"#,
        )
        .bind(&pix_id)
        .fetch_one(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;
        let pix = row.into_domain()?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        tracing::debug!(pix_id = %pix.id, value = req.value, "pix settled");
        Ok(pix)
    }

    async fn list_received(&self, user_id: UserId) -> Result<Vec<SettledPix>, RepoError> {
        self.list_settled(user_id, "requesting_user_id", "paying_user_id")
            .await
    }

    async fn list_paid(&self, user_id: UserId) -> Result<Vec<SettledPix>, RepoError> {
        self.list_settled(user_id, "paying_user_id", "requesting_user_id")
            .await
    }

    async fn create_api_key(&self, user_id: UserId) -> Result<(ApiKey, String), RepoError> {
        let raw_key = generate_api_key();
        let api_key = ApiKey::new(user_id, hash_api_key(&raw_key));

        sqlx::query(
            r#"INSERT INTO api_keys (id, user_id, key_hash, is_active, created_at) VALUES (?, ?, ?, 1, ?)"#,
        )
        .bind(api_key.id.to_string())
        .bind(user_id.to_string())
        .bind(&api_key.key_hash)
        .bind(api_key.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok((api_key, raw_key))
    }

    async fn verify_api_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError> {
        let row: Option<DbApiKey> = sqlx::query_as(
            r#"SELECT id, user_id, key_hash, is_active, created_at, last_used_at
               FROM api_keys WHERE key_hash = ? AND is_active = 1"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let now = Utc::now();
        sqlx::query(r#"UPDATE api_keys SET last_used_at = ? WHERE id = ?"#)
            .bind(now.to_rfc3339())
            .bind(&row.id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut api_key = row.into_domain()?;
        api_key.last_used_at = Some(now);
        Ok(Some(api_key))
    }
}
