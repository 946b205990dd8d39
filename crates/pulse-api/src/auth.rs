use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use pulse_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use pulse_types::models::Role;

use crate::{AppState, error::ApiError};

const CREDENTIALS_REQUIRED: ApiError = ApiError::BadRequest("Email and password required");

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|_| CREDENTIALS_REQUIRED)?;
    let email = req.email.filter(|e| !e.is_empty()).ok_or(CREDENTIALS_REQUIRED)?;
    let password = req.password.filter(|p| !p.is_empty()).ok_or(CREDENTIALS_REQUIRED)?;

    if state.db.get_user_by_email(&email)?.is_some() {
        return Err(ApiError::UserExists);
    }

    // Hash with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hash failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();

    // Registration never grants privileges; admins are provisioned
    // directly in the store.
    state
        .db
        .create_user(&user_id.to_string(), &email, &password_hash, Role::Viewer.as_str())?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { id: user_id, email }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|_| CREDENTIALS_REQUIRED)?;
    let email = req.email.filter(|e| !e.is_empty()).ok_or(CREDENTIALS_REQUIRED)?;
    let password = req.password.filter(|p| !p.is_empty()).ok_or(CREDENTIALS_REQUIRED)?;

    // Unknown email and wrong password fail identically
    let user = state
        .db
        .get_user_by_email(&email)?
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {e}", user.id)))?;

    let role = Role::from_db(&user.role);
    let token = state.tokens.issue(user_id, role, &user.email)?;

    Ok(Json(LoginResponse { token, role }))
}
