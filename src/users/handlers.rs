use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::AuthUser, password},
    config::AppConfig,
    error::{ApiError, ApiResult},
    extract::Json,
    state::AppState,
};

use super::{
    dto::{
        AdminUpdateRequest, AdminUserView, CreateUserRequest, DeleteAccountRequest,
        SetPasswordRequest, UpdateProfileRequest, UserListItem, UserSelfView,
    },
    permissions::{require, Action},
    repo::User,
    service,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register).get(list_users))
        .route(
            "/users/me",
            get(get_me).put(update_me).patch(update_me).delete(delete_me),
        )
        .route("/users/set_password", post(set_password))
        .route(
            "/users/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

/// Duplicate-email policy: the body names the colliding field only when the
/// deployment opted in.
fn creation_conflict(config: &AppConfig) -> ApiError {
    if config.expose_conflict_field {
        ApiError::Conflict("A user with this email already exists.".to_string())
    } else {
        ApiError::Conflict("Cannot create user.".to_string())
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserSelfView>)> {
    require(Action::Create, None)?;
    payload.validate()?;

    // Friendly pre-check; the unique constraint below closes the race.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(creation_conflict(&state.config));
    }

    let hash = password::hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.email,
        &payload.username,
        &payload.name,
        payload.phone.as_deref(),
        payload.birth_date,
        &hash,
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => creation_conflict(&state.config),
        _ => e.into(),
    })?;

    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserSelfView::from(&user))))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<Vec<UserListItem>>> {
    require(Action::List, Some(&caller))?;
    let items = User::list(&state.db).await?;
    Ok(Json(items))
}

#[instrument(skip_all, fields(target = %id))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdminUserView>> {
    require(Action::Retrieve, Some(&caller))?;
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No user matches the given id."))?;
    Ok(Json(AdminUserView::from(&user)))
}

#[instrument(skip_all, fields(target = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateRequest>,
) -> ApiResult<Json<AdminUserView>> {
    require(Action::Update, Some(&caller))?;
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("No user matches the given id."));
    }

    let changes = payload.into_changes()?;
    let user = User::admin_update(&state.db, id, &changes)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::validation("email", "A user with this email already exists.")
            }
            _ => e.into(),
        })?;

    info!(user_id = %user.id, "user updated by admin");
    Ok(Json(AdminUserView::from(&user)))
}

/// Admin-tier destroy: logical delete plus credential revocation.
#[instrument(skip_all, fields(target = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require(Action::Destroy, Some(&caller))?;
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("No user matches the given id."));
    }

    service::deactivate_account(&state, id).await?;

    info!(user_id = %id, "user deactivated by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(caller): AuthUser) -> ApiResult<Response> {
    require(Action::Me, Some(&caller))?;
    Ok(profile_view(&caller))
}

#[instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Response> {
    require(Action::Me, Some(&caller))?;
    let user = User::update_profile(&state.db, caller.id, &payload.into_changes()).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(profile_view(&user))
}

/// Self-deactivation. Revocation runs only after the flag is persisted.
#[instrument(skip_all)]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<DeleteAccountRequest>,
) -> ApiResult<StatusCode> {
    require(Action::Me, Some(&caller))?;
    payload.validate(&caller)?;

    service::deactivate_account(&state, caller.id).await?;

    info!(user_id = %caller.id, "account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// Password change for the caller's own record. The new hash is persisted
/// before the old token is revoked.
#[instrument(skip_all)]
pub async fn set_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<SetPasswordRequest>,
) -> ApiResult<StatusCode> {
    require(Action::SetPassword, Some(&caller))?;
    payload.validate(&caller)?;

    let hash = password::hash_password(&payload.new_password)?;
    service::change_password(&state, caller.id, &hash).await?;

    info!(user_id = %caller.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Staff callers see the full detail view of their own record; everyone
/// else gets the self view.
fn profile_view(user: &User) -> Response {
    if user.is_staff {
        Json(AdminUserView::from(user)).into_response()
    } else {
        Json(UserSelfView::from(user)).into_response()
    }
}
