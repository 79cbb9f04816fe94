use async_trait::async_trait;
use color_eyre::Result;
use eyre::WrapErr;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

/// Delivery details for a known user.
#[derive(Debug, Clone)]
pub struct UserContact {
    pub name: String,
    pub email: Option<String>,
}

/// Resolves an opaque user identity to its delivery address.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` means the identity matches no user at all.
    async fn lookup(&self, identity: &str) -> Result<Option<UserContact>>;
}

/// Directory backed by the `users` table.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn lookup(&self, identity: &str) -> Result<Option<UserContact>> {
        // A malformed id cannot match any user row.
        let Ok(id) = Uuid::parse_str(identity) else {
            return Ok(None);
        };

        let user: Option<User> = sqlx::query_as::<_, User>(
            r#"
                SELECT id, name, email, created_at
                FROM users
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .wrap_err("Failed to fetch user")?;

        Ok(user.map(|user| UserContact {
            name: user.name,
            email: user.email,
        }))
    }
}
