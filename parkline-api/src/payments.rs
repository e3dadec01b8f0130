use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use parkline_core::models::Payment;
use parkline_core::RequestContext;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/{id}/settle", post(settle_payment))
        .route("/v1/payments/{id}/refund", post(refund_payment))
}

async fn settle_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(state.payments.settle(&ctx, payment_id).await?))
}

async fn refund_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(state.payments.refund(&ctx, payment_id).await?))
}
