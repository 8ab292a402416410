use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::token::AuthToken;
use crate::{error::ApiError, state::AppState, users::repo::User};

/// Extracts the caller by resolving the bearer token against the credential
/// store. Deactivated users are rejected here, so no handler ever sees them.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))?;

        let key = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("Token "))
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization scheme."))?;

        let user = AuthToken::find_user(&state.db, key)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid token."))?;

        if !user.is_active {
            return Err(ApiError::unauthorized("User inactive or deleted."));
        }

        Ok(AuthUser(user))
    }
}
