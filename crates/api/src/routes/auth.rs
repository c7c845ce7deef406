use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sitedesk_db::models::{User, UserRole};
use sitedesk_services::notify::AccountAction;
use tracing::warn;
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub name: Option<String>,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkAuthRequest {
    pub auth_id: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
}

fn to_user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = state.auth.hash_password(&body.password)?;
    let role = body.role.unwrap_or(UserRole::Member);
    let user = state
        .users
        .create(body.email, body.name, role, password_hash)
        .await?;

    // Let every admin know someone joined. Failures never block
    // registration itself.
    if let Some(user_id) = user.id {
        let actor_id = user_id.to_hex();
        match state.users.list_admins().await {
            Ok(admins) => {
                for admin in admins.iter().filter(|a| a.id != user.id) {
                    if let Some(admin_id) = admin.id {
                        if let Err(e) = state
                            .dispatcher
                            .dispatch_user_event(admin_id, &actor_id, AccountAction::Joined)
                            .await
                        {
                            warn!(%actor_id, %e, "user-joined notification failed");
                        }
                    }
                }
            }
            Err(e) => warn!(%e, "admin listing for user-joined notification failed"),
        }
    }

    let tokens = state.auth.generate_tokens(
        user.id.ok_or_else(|| ApiError::Internal("user has no id".to_string()))?,
        &user.email,
        user.role,
    )?;

    Ok(Json(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: to_user_response(&user),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .users
        .find_by_email(&body.email)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;
    if !state.auth.verify_password(&body.password, hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let tokens = state.auth.generate_tokens(
        user.id.ok_or_else(|| ApiError::Internal("user has no id".to_string()))?,
        &user.email,
        user.role,
    )?;

    Ok(Json(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: to_user_response(&user),
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;
    let user_id = bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;
    let user = state.users.base.find_by_id(user_id).await?;

    let tokens = state
        .auth
        .generate_tokens(user_id, &user.email, user.role)?;

    Ok(Json(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: to_user_response(&user),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.base.find_by_id(auth.user_id).await?;
    Ok(Json(to_user_response(&user)))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    state.users.update_name(auth.user_id, body.name).await?;
    let user = state.users.base.find_by_id(auth.user_id).await?;

    let actor_id = auth.user_id.to_hex();
    match state.users.list_admins().await {
        Ok(admins) => {
            for admin in admins.iter().filter(|a| a.id != Some(auth.user_id)) {
                if let Some(admin_id) = admin.id {
                    if let Err(e) = state
                        .dispatcher
                        .dispatch_user_event(admin_id, &actor_id, AccountAction::Updated)
                        .await
                    {
                        warn!(%actor_id, %e, "user-updated notification failed");
                    }
                }
            }
        }
        Err(e) => warn!(%e, "admin listing for user-updated notification failed"),
    }

    Ok(Json(to_user_response(&user)))
}

/// Attaches an external auth identity to the signed-in user and upserts
/// the matching self-registration profile, so name resolution can reach
/// this person through either key.
pub async fn link_auth(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<LinkAuthRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    state.users.link_auth_id(auth.user_id, &body.auth_id).await?;
    state
        .profiles
        .upsert(body.auth_id, body.full_name, Some(auth.email.clone()))
        .await?;

    let user = state.users.base.find_by_id(auth.user_id).await?;
    Ok(Json(to_user_response(&user)))
}
