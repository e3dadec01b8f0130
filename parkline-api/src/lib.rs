use axum::{
    extract::State,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod quotes;
pub mod spaces;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use middleware::{admin_middleware, auth_middleware};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // Layers added later run first: authenticate, then require the admin role.
    let customer = Router::new()
        .merge(bookings::routes())
        .merge(payments::routes())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin = admin::routes()
        .route_layer(from_fn(admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(spaces::routes())
        .merge(quotes::routes())
        .merge(customer)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.db.ping().await.map_err(anyhow::Error::from)?;
    Ok(Json(json!({ "status": "ok" })))
}
