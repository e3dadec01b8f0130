pub mod manager;
pub mod payments;

pub use manager::BookingManager;
pub use payments::{Checkout, MockPaymentAdapter, PaymentService};
