use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

pub const TOKEN_KEY_LEN: usize = 40;

/// Opaque bearer credential, at most one live row per user. Never a
/// response shape itself; `TokenResponse` is the only serialized form.
#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub key: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

pub fn generate_key() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_KEY_LEN)
        .map(char::from)
        .collect()
}

impl AuthToken {
    /// Return the user's live token, creating one if none exists. A second
    /// login reuses the existing key.
    pub async fn get_or_create(db: &PgPool, user_id: Uuid) -> anyhow::Result<AuthToken> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET key = auth_tokens.key
            RETURNING key, user_id, created_at
            "#,
        )
        .bind(generate_key())
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(token)
    }

    /// Resolve a bearer key to its owning user.
    pub async fn find_user(db: &PgPool, key: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.username, u.name, u.phone, u.birth_date,
                   u.password_hash, u.is_active, u.is_staff, u.created_at
            FROM users u
            JOIN auth_tokens t ON t.user_id = u.id
            WHERE t.key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn delete_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
