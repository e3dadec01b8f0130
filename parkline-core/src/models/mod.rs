pub mod booking;
pub mod payment;
pub mod space;
pub mod user;

pub use booking::{Booking, BookingDetails, BookingPatch, BookingStatus, NewBooking, VehicleType};
pub use payment::{ChargeOutcome, NewPayment, Payment, PaymentAdapter, PaymentMethod, PaymentStatus};
pub use space::{NewParkingSpace, ParkingSpace, SpacePatch, SpaceStatus};
pub use user::{NewUser, User, UserPatch};
