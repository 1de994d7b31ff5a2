use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info, warn};

use voca_db::Database;
use voca_db::models::{NewUser, UserUpdate};
use voca_gateway::dispatcher::Dispatcher;
use voca_tokens::TokenChain;
use voca_types::api::{
    EditProfileRequest, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use voca_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::validation::{EmailDomains, ProfileReport};

pub type AppState = Arc<AppStateInner>;

/// Process-wide state, built once at startup and never mutated afterwards.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenChain,
    pub email_domains: EmailDomains,
    pub dispatcher: Dispatcher,
}

/// Run blocking work (SQLite, Argon2) off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })?
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::WrongPassword)
}

fn check_profile(report: ProfileReport) -> Result<(), ApiError> {
    if report.is_valid() {
        Ok(())
    } else {
        Err(ApiError::Validation(report.into_details()))
    }
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let birthdate = req
        .birthdate
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string);

    check_profile(
        ProfileReport::check(
            &req.name,
            &req.username,
            &req.email,
            Some(&req.password),
            &state.email_domains,
        )
        .with_birthdate(birthdate.as_deref()),
    )?;

    let user_id = blocking(&state, move |s| {
        let password_hash = hash_password(&req.password)?;
        let id = s.db.create_user(&NewUser {
            name: &req.name,
            email: &req.email,
            username: &req.username,
            password_hash: &password_hash,
            birthdate: birthdate.as_deref(),
        })?;
        Ok(id)
    })
    .await
    .inspect_err(|e| {
        if matches!(e, ApiError::Conflict) {
            info!("Registration rejected: username or email taken");
        }
    })?;

    info!("Registered user {}", user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully!".to_string(),
            user_id,
        }),
    ))
}

/// POST /login: verify the password, then mint the whole token chain.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = req.login_name().unwrap_or_default().to_string();
    let password = req.password;

    let user = blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_login(&lookup)?
            .ok_or(ApiError::NotFound("User not found!"))?;
        verify_password(&password, &user.password)?;
        Ok(user)
    })
    .await
    .inspect_err(|e| {
        if matches!(e, ApiError::WrongPassword) {
            warn!("Failed login attempt");
        }
    })?;

    let tokens = &state.tokens;
    let login_token = tokens
        .issue_login_token(Some(user.id), req.group_id.as_deref())
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("could not issue login token")))?;
    let user_token = tokens
        .derive_user_token(&login_token)
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("could not derive user token")))?;

    // No group at login is fine: group-scoped routes are just unavailable.
    let group_token = tokens.derive_group_token(&login_token);
    let group_id = group_token
        .as_deref()
        .and_then(|t| tokens.resolve_group_id(t));

    info!("User {} logged in (group: {:?})", user.id, group_id);

    Ok(Json(LoginResponse {
        login_token,
        user_token,
        group_token,
        user_id: user.id,
        group_id,
        email: user.email,
        username: user.username,
        name: user.name,
    }))
}

/// POST /edit. Validation runs before any write, so a rejected edit
/// leaves the stored profile untouched.
pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<EditProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password = req.password.filter(|p| !p.is_empty());

    check_profile(ProfileReport::check(
        &req.name,
        &req.username,
        &req.email,
        password.as_deref(),
        &state.email_domains,
    ))?;

    let updated = blocking(&state, move |s| {
        let password_hash = password.as_deref().map(hash_password).transpose()?;
        let row = s
            .db
            .update_user(
                user_id,
                &UserUpdate {
                    name: &req.name,
                    username: &req.username,
                    email: &req.email,
                    password_hash: password_hash.as_deref(),
                },
            )?
            .ok_or(ApiError::NotFound("User not found"))?;
        Ok(row)
    })
    .await?;

    info!("User {} updated profile", user_id);
    Ok(Json(User::from(updated)))
}

/// GET /me
pub async fn me(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |s| {
        s.db.get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("User not found"))
    })
    .await?;

    Ok(Json(User::from(row)))
}
