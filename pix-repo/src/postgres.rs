//! PostgreSQL repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use pix_types::{
    ApiKey, CreateUserRequest, DomainError, Pix, PixId, PixRepository, RepoError, SettlePix,
    SettledPix, User, UserId,
};

use crate::security::{generate_api_key, hash_api_key};
use crate::types::pg::{DbApiKey, DbPix, DbSettledPix, DbUser};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with row-level locking.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_tables_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_api_keys_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }

    async fn list_settled(
        &self,
        user_id: UserId,
        own_column: &str,
        counterparty_column: &str,
    ) -> Result<Vec<SettledPix>, RepoError> {
        let sql = format!(
            "SELECT p.id, p.value, p.status, p.requesting_user_id, p.paying_user_id, p.created_at, p.updated_at,
                    u.first_name, u.last_name
             FROM pix p JOIN users u ON u.id = p.{counterparty_column}
             WHERE p.{own_column} = $1 AND p.status = 'close'"
        );

        let rows: Vec<DbSettledPix> = sqlx::query_as(&sql)
            .bind(user_id.into_uuid())
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
impl PixRepository for PostgresRepo {
    async fn create_user(&self, req: CreateUserRequest) -> Result<User, RepoError> {
        let user = User::new(req.first_name, req.last_name, req.wallet)?;

        sqlx::query(
            r#"INSERT INTO users (id, first_name, last_name, wallet, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(user.id.into_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.wallet)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            r#"SELECT id, first_name, last_name, wallet, created_at, updated_at FROM users WHERE id = $1"#,
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(row.map(DbUser::into_domain))
    }

    async fn create_pix(&self, requesting_user_id: UserId, value: i64) -> Result<Pix, RepoError> {
        let pix = Pix::open(requesting_user_id, value);

        sqlx::query(
            r#"INSERT INTO pix (id, value, status, requesting_user_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(pix.id.into_uuid())
        .bind(pix.value)
        .bind(pix.status.as_str())
        .bind(requesting_user_id.into_uuid())
        .bind(pix.created_at)
        .bind(pix.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(pix)
    }

    async fn get_pix(&self, id: PixId) -> Result<Option<Pix>, RepoError> {
        let row: Option<DbPix> = sqlx::query_as(
            r#"SELECT id, value, status, requesting_user_id, paying_user_id, created_at, updated_at FROM pix WHERE id = $1"#,
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPix::into_domain).transpose()
    }

    async fn settle_pix(&self, req: SettlePix) -> Result<Pix, RepoError> {
        if req.requesting_user_id == req.paying_user_id {
            return Err(DomainError::SelfPay.into());
        }

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        // Lock both wallets in id order so concurrent settlements cannot deadlock.
        let users: Vec<DbUser> = sqlx::query_as(
            r#"SELECT id, first_name, last_name, wallet, created_at, updated_at
               FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE"#,
        )
        .bind(vec![
            req.requesting_user_id.into_uuid(),
            req.paying_user_id.into_uuid(),
        ])
        .fetch_all(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut requester = None;
        let mut payer = None;
        for user in users.into_iter().map(DbUser::into_domain) {
            if user.id == req.requesting_user_id {
                requester = Some(user);
            } else if user.id == req.paying_user_id {
                payer = Some(user);
            }
        }

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

        let row: Option<DbPix> = sqlx::query_as(
            r#"SELECT id, value, status, requesting_user_id, paying_user_id, created_at, updated_at
               FROM pix WHERE id = $1 AND status = 'open' FOR UPDATE"#,
        )
        .bind(req.pix_id.into_uuid())
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut pix = match row.map(DbPix::into_domain).transpose()? {
            Some(pix) if pix.matches(&req) => pix,
            _ => return Err(DomainError::InvalidKey.into()),
        };

        payer.debit(req.value)?;
        requester.credit(req.value)?;
        pix.close(payer.id)?;

        let now = Utc::now();

        sqlx::query(r#"UPDATE users SET wallet = $1, updated_at = $2 WHERE id = $3"#)
            .bind(requester.wallet)
            .bind(now)
            .bind(requester.id.into_uuid())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(r#"UPDATE users SET wallet = $1, updated_at = $2 WHERE id = $3"#)
            .bind(payer.wallet)
            .bind(now)
            .bind(payer.id.into_uuid())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            r#"UPDATE pix SET status = 'close', paying_user_id = $1, updated_at = $2 WHERE id = $3"#,
        )
        .bind(payer.id.into_uuid())
        .bind(pix.updated_at)
        .bind(pix.id.into_uuid())
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

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
            r#"INSERT INTO api_keys (id, user_id, key_hash, is_active, created_at) VALUES ($1, $2, $3, TRUE, $4)"#,
        )
        .bind(*api_key.id.as_uuid())
        .bind(user_id.into_uuid())
        .bind(&api_key.key_hash)
        .bind(api_key.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok((api_key, raw_key))
    }

    async fn verify_api_key_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepoError> {
        let row: Option<DbApiKey> = sqlx::query_as(
            r#"UPDATE api_keys SET last_used_at = NOW()
               WHERE key_hash = $1 AND is_active = TRUE
               RETURNING id, user_id, key_hash, is_active, created_at, last_used_at"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(row.map(DbApiKey::into_domain))
    }
}
