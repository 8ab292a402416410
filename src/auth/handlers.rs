use axum::{extract::State, http::StatusCode, routing::post, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{extractors::AuthUser, password, session::Session, token::AuthToken};
use crate::{
    error::{ApiError, ApiResult},
    extract::Json,
    state::AppState,
    users::repo::User,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token/login", post(login))
        .route("/token/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let ok = password::verify_password(&payload.password, &user.password_hash)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login attempt for inactive user");
        return Err(invalid_credentials());
    }

    let token = AuthToken::get_or_create(&state.db, user.id).await?;
    if state.config.create_session_on_login {
        Session::create_for_user(&state.db, user.id).await?;
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse {
        auth_token: token.key,
    }))
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<StatusCode> {
    AuthToken::delete_for_user(&state.db, user.id).await?;
    if state.config.create_session_on_login {
        Session::delete_for_user(&state.db, user.id).await?;
    }

    info!(user_id = %user.id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Unable to log in with provided credentials.")
}
