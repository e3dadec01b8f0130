use chrono::Utc;
use parkline_core::models::{
    BookingDetails, BookingPatch, BookingStatus, NewBooking, ParkingSpace,
};
use parkline_core::repository::{BookingRepository, SpaceRepository};
use parkline_core::validation::{is_valid_license_plate, normalize_plate};
use parkline_core::{CoreError, CoreResult, RequestContext};
use parkline_shared::models::events::{to_log_payload, BookingCreatedEvent, BookingReleasedEvent};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Manages the booking lifecycle and the space occupancy it drives.
///
/// ```text
/// active --cancel-->   cancelled
/// active --complete--> completed
/// ```
///
/// Every mutation is a single repository call, and each repository call is
/// one transaction, so a rejected request leaves no partial state behind.
pub struct BookingManager {
    bookings: Arc<dyn BookingRepository>,
    spaces: Arc<dyn SpaceRepository>,
}

impl BookingManager {
    pub fn new(bookings: Arc<dyn BookingRepository>, spaces: Arc<dyn SpaceRepository>) -> Self {
        Self { bookings, spaces }
    }

    /// Reserve a space for a window. Fails with `Conflict` when another active
    /// booking on the space overlaps it.
    pub async fn create_booking(
        &self,
        ctx: &RequestContext,
        mut booking: NewBooking,
    ) -> CoreResult<Uuid> {
        if !ctx.can_act_for(booking.user_id) {
            return Err(CoreError::Forbidden(
                "cannot create bookings for another user".to_string(),
            ));
        }

        booking.vehicle_plate = checked_plate(&booking.vehicle_plate)?;

        let id = self.bookings.create_booking(&booking).await.map_err(|e| {
            warn!("Booking on space {} rejected: {}", booking.space_id, e);
            e
        })?;

        let event = BookingCreatedEvent {
            booking_id: id,
            space_id: booking.space_id,
            user_id: booking.user_id,
            start_time: booking.window.start().timestamp(),
            end_time: booking.window.end().timestamp(),
            timestamp: Utc::now().timestamp(),
        };
        info!(event = %to_log_payload(&event), "Booking created: {}", id);

        Ok(id)
    }

    /// Apply a patch to an active booking.
    ///
    /// Returns `Ok(false)` when the booking is unknown, already terminal, or
    /// the patch is empty.
    pub async fn update_booking(
        &self,
        ctx: &RequestContext,
        booking_id: Uuid,
        mut patch: BookingPatch,
    ) -> CoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let current = match self.bookings.get_booking(booking_id).await? {
            Some(details) => details.booking,
            None => return Ok(false),
        };

        if !ctx.can_act_for(current.user_id) {
            return Err(CoreError::Forbidden(format!(
                "booking {} belongs to another user",
                booking_id
            )));
        }

        // A repeated terminal transition is left to the repository, which
        // reports it as `false`.
        if let Some(next) = patch.status {
            let repeated_release = current.status.is_terminal() && next.is_terminal();
            if !repeated_release && !current.status.can_transition_to(next) {
                return Err(CoreError::InvalidTransition {
                    from: current.status.to_string(),
                    to: next.to_string(),
                });
            }
        }

        if let Some(plate) = patch.vehicle_plate.take() {
            patch.vehicle_plate = Some(checked_plate(&plate)?);
        }

        let updated = self.bookings.update_booking(booking_id, &patch).await?;

        match patch.status {
            Some(status) if updated && status.is_terminal() => {
                let event = BookingReleasedEvent {
                    booking_id,
                    status: status.to_string(),
                    released_by: ctx.user_id,
                    timestamp: Utc::now().timestamp(),
                };
                info!(event = %to_log_payload(&event), "Booking {} {}", booking_id, status);
            }
            _ if updated => info!("Booking {} updated", booking_id),
            _ => {}
        }

        Ok(updated)
    }

    /// Cancel an active booking and release its space. Repeating the call
    /// returns `Ok(false)`.
    pub async fn cancel_booking(&self, ctx: &RequestContext, booking_id: Uuid) -> CoreResult<bool> {
        self.update_booking(ctx, booking_id, BookingPatch::status(BookingStatus::Cancelled))
            .await
    }

    /// Mark an active booking as completed and release its space.
    pub async fn complete_booking(&self, ctx: &RequestContext, booking_id: Uuid) -> CoreResult<bool> {
        self.update_booking(ctx, booking_id, BookingPatch::status(BookingStatus::Completed))
            .await
    }

    /// Spaces that are active and not held right now.
    pub async fn get_available_spaces(&self) -> CoreResult<Vec<ParkingSpace>> {
        self.spaces.list_available_spaces().await
    }

    pub async fn get_user_bookings(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> CoreResult<Vec<BookingDetails>> {
        if !ctx.can_act_for(user_id) {
            return Err(CoreError::Forbidden(
                "cannot list bookings of another user".to_string(),
            ));
        }
        self.bookings.list_user_bookings(user_id).await
    }

    pub async fn get_booking(
        &self,
        ctx: &RequestContext,
        booking_id: Uuid,
    ) -> CoreResult<BookingDetails> {
        let details = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;

        if !ctx.can_act_for(details.booking.user_id) {
            return Err(CoreError::Forbidden(format!(
                "booking {} belongs to another user",
                booking_id
            )));
        }
        Ok(details)
    }

    /// All active bookings across spaces. Admin only.
    pub async fn get_active_bookings(&self, ctx: &RequestContext) -> CoreResult<Vec<BookingDetails>> {
        if !ctx.is_admin {
            return Err(CoreError::Forbidden("admin access required".to_string()));
        }
        self.bookings.list_active_bookings().await
    }
}

fn checked_plate(plate: &str) -> CoreResult<String> {
    if !is_valid_license_plate(plate) {
        return Err(CoreError::Validation(format!(
            "Invalid license plate: {}",
            plate
        )));
    }
    Ok(normalize_plate(plate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_is_normalized() {
        assert_eq!(checked_plate(" abc123 ").unwrap(), "ABC123");
        assert!(matches!(checked_plate("AB-123"), Err(CoreError::Validation(_))));
        assert!(matches!(checked_plate("TOOLONG123"), Err(CoreError::Validation(_))));
    }
}
