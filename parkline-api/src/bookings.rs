use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use parkline_booking::Checkout;
use parkline_core::models::{BookingDetails, BookingPatch, NewBooking, Payment, PaymentMethod, VehicleType};
use parkline_core::validation::{is_valid_license_plate, validate_booking_time_at};
use parkline_core::{RequestContext, TimeWindow};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub space_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vehicle_plate: String,
    pub vehicle_type: VehicleType,
    /// Admins may book on behalf of another user
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_premium: bool,
    pub discount_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub booking_id: Uuid,
    pub updated: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_my_bookings))
        .route("/v1/bookings/{id}", get(get_booking).patch(update_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/complete", post(complete_booking))
        .route("/v1/bookings/{id}/payments", post(checkout).get(list_payments))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingDetails>), AppError> {
    if !is_valid_license_plate(&req.vehicle_plate) {
        return Err(AppError::ValidationError(
            "Invalid license plate format".to_string(),
        ));
    }

    let max_duration = Duration::hours(state.booking_rules.max_duration_hours);
    validate_booking_time_at(req.start_time, req.end_time, Utc::now(), max_duration)
        .map_err(AppError::ValidationError)?;

    let booking = NewBooking {
        user_id: req.user_id.unwrap_or(ctx.user_id),
        space_id: req.space_id,
        window: TimeWindow::new(req.start_time, req.end_time)?,
        vehicle_plate: req.vehicle_plate,
        vehicle_type: req.vehicle_type,
    };

    let booking_id = state.bookings.create_booking(&ctx, booking).await?;
    let details = state.bookings.get_booking(&ctx, booking_id).await?;

    Ok((StatusCode::CREATED, Json(details)))
}

async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    Ok(Json(state.bookings.get_user_bookings(&ctx, ctx.user_id).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetails>, AppError> {
    Ok(Json(state.bookings.get_booking(&ctx, booking_id).await?))
}

async fn update_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(booking_id): Path<Uuid>,
    Json(patch): Json<BookingPatch>,
) -> Result<Json<UpdateResponse>, AppError> {
    if patch.moves_window() {
        let current = state.bookings.get_booking(&ctx, booking_id).await?.booking;
        let start = patch.start_time.unwrap_or(current.start_time);
        let end = patch.end_time.unwrap_or(current.end_time);

        // An unchanged start may already have passed for a booking in progress.
        let now = match patch.start_time {
            Some(_) => Utc::now(),
            None => start,
        };
        let max_duration = Duration::hours(state.booking_rules.max_duration_hours);
        validate_booking_time_at(start, end, now, max_duration)
            .map_err(AppError::ValidationError)?;
    }

    let updated = state.bookings.update_booking(&ctx, booking_id, patch).await?;
    Ok(Json(UpdateResponse { booking_id, updated }))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<UpdateResponse>, AppError> {
    let updated = state.bookings.cancel_booking(&ctx, booking_id).await?;
    Ok(Json(UpdateResponse { booking_id, updated }))
}

async fn complete_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<UpdateResponse>, AppError> {
    let updated = state.bookings.complete_booking(&ctx, booking_id).await?;
    Ok(Json(UpdateResponse { booking_id, updated }))
}

async fn checkout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Checkout>), AppError> {
    let checkout = state
        .payments
        .checkout(
            &ctx,
            booking_id,
            req.payment_method,
            req.is_premium,
            req.discount_code.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

async fn list_payments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    Ok(Json(state.payments.get_booking_payments(&ctx, booking_id).await?))
}
