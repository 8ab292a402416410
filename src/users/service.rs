use axum::async_trait;
use uuid::Uuid;

use super::repo::User;
use crate::{
    auth::{session::Session, token::AuthToken},
    state::AppState,
};

/// Persistence and revocation operations behind the two lifecycle
/// transitions. The seam keeps their ordering assertable without a live
/// database.
#[async_trait]
pub trait AccountStore {
    async fn persist_deactivation(&self, user_id: Uuid) -> anyhow::Result<()>;
    async fn persist_password_hash(&self, user_id: Uuid, hash: &str) -> anyhow::Result<()>;
    async fn revoke_token(&self, user_id: Uuid) -> anyhow::Result<()>;
    async fn revoke_session(&self, user_id: Uuid) -> anyhow::Result<()>;
}

#[async_trait]
impl AccountStore for AppState {
    async fn persist_deactivation(&self, user_id: Uuid) -> anyhow::Result<()> {
        User::deactivate(&self.db, user_id).await
    }

    async fn persist_password_hash(&self, user_id: Uuid, hash: &str) -> anyhow::Result<()> {
        User::set_password_hash(&self.db, user_id, hash).await
    }

    async fn revoke_token(&self, user_id: Uuid) -> anyhow::Result<()> {
        AuthToken::delete_for_user(&self.db, user_id).await
    }

    async fn revoke_session(&self, user_id: Uuid) -> anyhow::Result<()> {
        if self.config.create_session_on_login {
            Session::delete_for_user(&self.db, user_id).await?;
        }
        Ok(())
    }
}

/// Logical deletion: the inactive flag is persisted first, then the token
/// and session are revoked. A failed persist leaves credentials untouched.
pub async fn deactivate_account(store: &impl AccountStore, user_id: Uuid) -> anyhow::Result<()> {
    store.persist_deactivation(user_id).await?;
    store.revoke_token(user_id).await?;
    store.revoke_session(user_id).await
}

/// Password change: the new hash is persisted first, then the old token and
/// session are revoked.
pub async fn change_password(
    store: &impl AccountStore,
    user_id: Uuid,
    new_hash: &str,
) -> anyhow::Result<()> {
    store.persist_password_hash(user_id, new_hash).await?;
    store.revoke_token(user_id).await?;
    store.revoke_session(user_id).await
}
