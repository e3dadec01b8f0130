use parkline_booking::{BookingManager, MockPaymentAdapter, PaymentService};
use parkline_core::repository::{SpaceRepository, UserRepository};
use parkline_pricing::PricingEngine;
use parkline_shared::Masked;
use parkline_store::app_config::BookingRules;
use parkline_store::{
    DbClient, StoreBookingRepository, StorePaymentRepository, StoreSpaceRepository,
    StoreUserRepository,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub users: Arc<dyn UserRepository>,
    pub spaces: Arc<dyn SpaceRepository>,
    pub bookings: Arc<BookingManager>,
    pub payments: Arc<PaymentService>,
    pub pricing: Arc<PricingEngine>,
    pub auth: AuthConfig,
    pub booking_rules: BookingRules,
}

impl AppState {
    /// Wires the sqlite repositories into the lifecycle services.
    pub fn new(
        db: DbClient,
        auth: AuthConfig,
        pricing: PricingEngine,
        booking_rules: BookingRules,
    ) -> Self {
        let pool = db.pool.clone();
        let users = Arc::new(StoreUserRepository::new(pool.clone()));
        let spaces = Arc::new(StoreSpaceRepository::new(pool.clone()));
        let booking_repo = Arc::new(StoreBookingRepository::new(pool.clone()));
        let payment_repo = Arc::new(StorePaymentRepository::new(pool));
        let pricing = Arc::new(pricing);

        let bookings = Arc::new(BookingManager::new(booking_repo.clone(), spaces.clone()));
        let payments = Arc::new(PaymentService::new(
            payment_repo,
            booking_repo,
            pricing.clone(),
            Arc::new(MockPaymentAdapter::new()),
        ));

        Self {
            db: Arc::new(db),
            users,
            spaces,
            bookings,
            payments,
            pricing,
            auth,
            booking_rules,
        }
    }
}
