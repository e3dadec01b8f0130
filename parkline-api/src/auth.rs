use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use parkline_core::models::{NewUser, User};
use parkline_core::repository::UserRepository;
use parkline_core::validation::{
    is_valid_email, is_valid_phone, validate_password, validate_username,
};
use parkline_core::{CoreError, CoreResult};
use parkline_shared::Masked;
use parkline_store::app_config::BootstrapAdmin;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::middleware::auth::{Claims, ROLE_ADMIN, ROLE_CUSTOMER};
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password: Masked<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: Masked<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Look the user up and check the password. Both failure modes produce the
/// same error.
pub async fn authenticate(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
) -> CoreResult<User> {
    let invalid = || CoreError::Authentication("invalid username or password".to_string());

    let user = users.get_user_by_username(username).await?.ok_or_else(invalid)?;
    if !verify_password(password, user.password_hash.expose()) {
        return Err(invalid());
    }
    Ok(user)
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.to_string(),
        role: if user.is_admin { ROLE_ADMIN } else { ROLE_CUSTOMER }.to_owned(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.expose().as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

/// Creates the configured admin account unless the username is already taken.
pub async fn bootstrap_admin(users: &dyn UserRepository, admin: &BootstrapAdmin) -> Result<(), AppError> {
    if users.get_user_by_username(&admin.username).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(admin.password.expose())
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))?;

    users
        .create_user(&NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            full_name: "Administrator".to_string(),
            phone: None,
            password_hash: Masked::new(password_hash),
            is_admin: true,
        })
        .await?;

    info!("Created bootstrap admin {}", admin.username);
    Ok(())
}

fn validate_registration(req: &RegisterRequest) -> Result<(), String> {
    validate_username(&req.username)?;
    if !is_valid_email(&req.email) {
        return Err(format!("Invalid email address: {}", req.email));
    }
    if req.full_name.trim().is_empty() {
        return Err("Full name is required".to_string());
    }
    if let Some(phone) = &req.phone {
        if !is_valid_phone(phone) {
            return Err(format!("Invalid phone number: {}", phone));
        }
    }
    validate_password(req.password.expose())
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&req).map_err(AppError::ValidationError)?;

    let password_hash = hash_password(req.password.expose())
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))?;

    let id = state
        .users
        .create_user(&NewUser {
            username: req.username,
            email: req.email,
            full_name: req.full_name.trim().to_string(),
            phone: req.phone,
            password_hash: Masked::new(password_hash),
            is_admin: false,
        })
        .await?;

    let user = state
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::InternalServerError(format!("User {} vanished", id)))?;

    info!("Registered user {}", user.username);
    let token = issue_token(&state.auth, &user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = authenticate(state.users.as_ref(), &req.username, req.password.expose()).await?;
    let token = issue_token(&state.auth, &user)?;
    Ok(Json(AuthResponse { token, user }))
}
