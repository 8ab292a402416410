use sqlx::PgPool;
use uuid::Uuid;

use super::token::generate_key;

/// Server-side session bookkeeping, written only when the
/// `create_session_on_login` flag is on. Request authentication itself is
/// token-only; sessions are created and destroyed alongside the token.
pub struct Session;

impl Session {
    pub async fn create_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO sessions (key, user_id) VALUES ($1, $2)")
            .bind(generate_key())
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
