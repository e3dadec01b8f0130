pub mod app_config;
pub mod booking_repo;
pub mod database;
mod error;
pub mod payment_repo;
pub mod space_repo;
pub mod user_repo;

pub use app_config::Config;
pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use payment_repo::StorePaymentRepository;
pub use space_repo::StoreSpaceRepository;
pub use user_repo::StoreUserRepository;
