use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub space_id: Uuid,
    pub user_id: Uuid,
    pub start_time: i64,
    pub end_time: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingReleasedEvent {
    pub booking_id: Uuid,
    pub status: String, // completed or cancelled
    pub released_by: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentSettledEvent {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub status: String,
    pub amount_cents: i64,
    pub transaction_id: Option<String>,
    pub timestamp: i64,
}

/// Renders an event as a single-line JSON payload for structured logs.
pub fn to_log_payload<T: serde::Serialize>(event: &T) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
}
