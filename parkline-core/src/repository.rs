use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Booking, BookingDetails, BookingPatch, NewBooking, NewParkingSpace, NewPayment, NewUser,
    ParkingSpace, Payment, PaymentStatus, SpacePatch, User, UserPatch,
};
use crate::CoreResult;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Integrity` when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> CoreResult<Uuid>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> CoreResult<Option<User>>;

    async fn update_user(&self, id: Uuid, patch: &UserPatch) -> CoreResult<bool>;

    async fn delete_user(&self, id: Uuid) -> CoreResult<bool>;
}

/// Repository trait for parking spaces
#[async_trait]
pub trait SpaceRepository: Send + Sync {
    async fn create_space(&self, space: &NewParkingSpace) -> CoreResult<Uuid>;

    async fn get_space(&self, id: Uuid) -> CoreResult<Option<ParkingSpace>>;

    async fn list_spaces(&self) -> CoreResult<Vec<ParkingSpace>>;

    /// Spaces that are active and not currently held by a booking.
    async fn list_available_spaces(&self) -> CoreResult<Vec<ParkingSpace>>;

    async fn update_space(&self, id: Uuid, patch: &SpacePatch) -> CoreResult<bool>;

    async fn delete_space(&self, id: Uuid) -> CoreResult<bool>;
}

/// Repository trait for bookings.
///
/// Both mutating methods run as one transaction each: the overlap check, the
/// booking write and the space availability flip commit or roll back together.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts an active booking unless another active booking on the same
    /// space overlaps the window (`Conflict`).
    async fn create_booking(&self, booking: &NewBooking) -> CoreResult<Uuid>;

    /// Applies a patch to an active booking. Returns `false` when no active
    /// booking matched, which makes repeated terminal transitions no-ops.
    async fn update_booking(&self, id: Uuid, patch: &BookingPatch) -> CoreResult<bool>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<BookingDetails>>;

    async fn list_user_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingDetails>>;

    async fn list_active_bookings(&self) -> CoreResult<Vec<BookingDetails>>;

    async fn list_active_for_space(&self, space_id: Uuid) -> CoreResult<Vec<Booking>>;
}

/// Repository trait for booking payments
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create_payment(&self, payment: &NewPayment) -> CoreResult<Uuid>;

    async fn get_payment(&self, id: Uuid) -> CoreResult<Option<Payment>>;

    async fn list_booking_payments(&self, booking_id: Uuid) -> CoreResult<Vec<Payment>>;

    /// Moves a payment from `from` to `to` only if it is still in `from`.
    async fn transition_payment(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        transaction_id: Option<&str>,
        payment_date: Option<DateTime<Utc>>,
    ) -> CoreResult<bool>;
}
