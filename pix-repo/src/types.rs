//! Database row types for SQLite and PostgreSQL.
//!
//! SQLite stores ids and timestamps as TEXT, PostgreSQL as UUID/TIMESTAMPTZ,
//! so each backend gets its own row structs. Both convert into the same
//! domain types.

use pix_types::{PixStatus, RepoError};

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_status(s: &str) -> Result<PixStatus, RepoError> {
    s.parse::<PixStatus>()
        .map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
pub fn parse_uuid(s: &str) -> Result<uuid::Uuid, RepoError> {
    uuid::Uuid::parse_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
pub fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::Database(e.to_string()))?
        .with_timezone(&chrono::Utc))
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
pub mod sqlite {
    use sqlx::FromRow;

    use pix_types::{ApiKey, ApiKeyId, Pix, PixId, RepoError, SettledPix, User, UserId, UserName};

    use super::{parse_status, parse_timestamp, parse_uuid};

    /// User row from database.
    #[derive(FromRow)]
    pub struct DbUser {
        pub id: String,
        pub first_name: String,
        pub last_name: String,
        pub wallet: i64,
        pub created_at: String,
        pub updated_at: String,
    }

    impl DbUser {
        pub fn into_domain(self) -> Result<User, RepoError> {
            Ok(User::from_parts(
                UserId::from_uuid(parse_uuid(&self.id)?),
                self.first_name,
                self.last_name,
                self.wallet,
                parse_timestamp(&self.created_at)?,
                parse_timestamp(&self.updated_at)?,
            ))
        }
    }

    /// Pix row from database.
    #[derive(FromRow)]
    pub struct DbPix {
        pub id: String,
        pub value: i64,
        pub status: String,
        pub requesting_user_id: String,
        pub paying_user_id: Option<String>,
        pub created_at: String,
        pub updated_at: String,
    }

    impl DbPix {
        pub fn into_domain(self) -> Result<Pix, RepoError> {
            let paying_user_id = self
                .paying_user_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?
                .map(UserId::from_uuid);

            Ok(Pix::from_parts(
                PixId::from_uuid(parse_uuid(&self.id)?),
                self.value,
                parse_status(&self.status)?,
                UserId::from_uuid(parse_uuid(&self.requesting_user_id)?),
                paying_user_id,
                parse_timestamp(&self.created_at)?,
                parse_timestamp(&self.updated_at)?,
            ))
        }
    }

    /// Pix row joined with the counterparty's name.
    #[derive(FromRow)]
    pub struct DbSettledPix {
        #[sqlx(flatten)]
        pub pix: DbPix,
        pub first_name: String,
        pub last_name: String,
    }

    impl DbSettledPix {
        pub fn into_domain(self) -> Result<SettledPix, RepoError> {
            Ok(SettledPix {
                pix: self.pix.into_domain()?,
                counterparty: UserName {
                    first_name: self.first_name,
                    last_name: self.last_name,
                },
            })
        }
    }

    /// API key row from database.
    #[derive(FromRow)]
    pub struct DbApiKey {
        pub id: String,
        pub user_id: String,
        pub key_hash: String,
        pub is_active: i64,
        pub created_at: String,
        pub last_used_at: Option<String>,
    }

    impl DbApiKey {
        pub fn into_domain(self) -> Result<ApiKey, RepoError> {
            let last_used_at = self
                .last_used_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?;

            Ok(ApiKey {
                id: ApiKeyId::from_uuid(parse_uuid(&self.id)?),
                user_id: UserId::from_uuid(parse_uuid(&self.user_id)?),
                key_hash: self.key_hash,
                is_active: self.is_active != 0,
                created_at: parse_timestamp(&self.created_at)?,
                last_used_at,
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL rows
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "postgres")]
pub mod pg {
    use chrono::{DateTime, Utc};
    use sqlx::FromRow;
    use uuid::Uuid;

    use pix_types::{ApiKey, ApiKeyId, Pix, PixId, RepoError, SettledPix, User, UserId, UserName};

    use super::parse_status;

    /// User row from database.
    #[derive(FromRow)]
    pub struct DbUser {
        pub id: Uuid,
        pub first_name: String,
        pub last_name: String,
        pub wallet: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl DbUser {
        pub fn into_domain(self) -> User {
            User::from_parts(
                UserId::from_uuid(self.id),
                self.first_name,
                self.last_name,
                self.wallet,
                self.created_at,
                self.updated_at,
            )
        }
    }

    /// Pix row from database.
    #[derive(FromRow)]
    pub struct DbPix {
        pub id: Uuid,
        pub value: i64,
        pub status: String,
        pub requesting_user_id: Uuid,
        pub paying_user_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    impl DbPix {
        pub fn into_domain(self) -> Result<Pix, RepoError> {
            Ok(Pix::from_parts(
                PixId::from_uuid(self.id),
                self.value,
                parse_status(&self.status)?,
                UserId::from_uuid(self.requesting_user_id),
                self.paying_user_id.map(UserId::from_uuid),
                self.created_at,
                self.updated_at,
            ))
        }
    }

    /// Pix row joined with the counterparty's name.
    #[derive(FromRow)]
    pub struct DbSettledPix {
        #[sqlx(flatten)]
        pub pix: DbPix,
        pub first_name: String,
        pub last_name: String,
    }

    impl DbSettledPix {
        pub fn into_domain(self) -> Result<SettledPix, RepoError> {
            Ok(SettledPix {
                pix: self.pix.into_domain()?,
                counterparty: UserName {
                    first_name: self.first_name,
                    last_name: self.last_name,
                },
            })
        }
    }

    /// API key row from database.
    #[derive(FromRow)]
    pub struct DbApiKey {
        pub id: Uuid,
        pub user_id: Uuid,
        pub key_hash: String,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub last_used_at: Option<DateTime<Utc>>,
    }

    impl DbApiKey {
        pub fn into_domain(self) -> ApiKey {
            ApiKey {
                id: ApiKeyId::from_uuid(self.id),
                user_id: UserId::from_uuid(self.user_id),
                key_hash: self.key_hash,
                is_active: self.is_active,
                created_at: self.created_at,
                last_used_at: self.last_used_at,
            }
        }
    }
}
