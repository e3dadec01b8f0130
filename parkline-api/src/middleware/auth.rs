use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use parkline_core::RequestContext;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_CUSTOMER: &str = "CUSTOMER";
pub const ROLE_ADMIN: &str = "ADMIN";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn context(&self) -> Result<RequestContext, AppError> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;

        match self.role.as_str() {
            ROLE_ADMIN => Ok(RequestContext::admin(user_id)),
            ROLE_CUSTOMER => Ok(RequestContext::customer(user_id)),
            other => Err(AppError::AuthenticationError(format!("Unknown role {}", other))),
        }
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Turns a bearer token into a `RequestContext` request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.expose().as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

    let ctx = token_data.claims.context()?;
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Guard
// ============================================================================

/// Must run after `auth_middleware`.
pub async fn admin_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    let is_admin = req.extensions().get::<RequestContext>().map(|ctx| ctx.is_admin);

    match is_admin {
        Some(true) => Ok(next.run(req).await),
        Some(false) => Err(AppError::AuthorizationError(
            "admin access required".to_string(),
        )),
        None => Err(AppError::AuthenticationError(
            "Missing bearer token".to_string(),
        )),
    }
}
