use async_trait::async_trait;
use chrono::Utc;
use parkline_core::models::{
    BookingStatus, ChargeOutcome, NewPayment, Payment, PaymentAdapter, PaymentMethod,
    PaymentStatus,
};
use parkline_core::repository::{BookingRepository, PaymentRepository};
use parkline_core::{CoreError, CoreResult, RequestContext};
use parkline_pricing::{PricingEngine, Quote};
use parkline_shared::models::events::{to_log_payload, PaymentSettledEvent};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A recorded pending payment together with the price it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct Checkout {
    pub payment: Payment,
    pub quote: Quote,
}

/// Prices bookings, records payments and drives them through the processor.
///
/// ```text
/// pending --settle--> completed --refund--> refunded
/// pending --settle--> failed
/// ```
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    bookings: Arc<dyn BookingRepository>,
    pricing: Arc<PricingEngine>,
    adapter: Arc<dyn PaymentAdapter>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        bookings: Arc<dyn BookingRepository>,
        pricing: Arc<PricingEngine>,
        adapter: Arc<dyn PaymentAdapter>,
    ) -> Self {
        Self { payments, bookings, pricing, adapter }
    }

    /// Price a booking and record a pending payment for it.
    pub async fn checkout(
        &self,
        ctx: &RequestContext,
        booking_id: Uuid,
        method: PaymentMethod,
        is_premium: bool,
        discount_code: Option<&str>,
    ) -> CoreResult<Checkout> {
        let details = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;
        let booking = details.booking;

        if !ctx.can_act_for(booking.user_id) {
            return Err(CoreError::Forbidden(format!(
                "booking {} belongs to another user",
                booking_id
            )));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::Validation(format!(
                "booking {} is cancelled and cannot be paid",
                booking_id
            )));
        }

        let window = booking
            .window()
            .ok_or_else(|| CoreError::Storage(format!("booking {} has an empty window", booking_id)))?;
        let quote = self
            .pricing
            .quote(booking.vehicle_type.as_str(), &window, is_premium, discount_code);

        let payment_id = self
            .payments
            .create_payment(&NewPayment {
                booking_id,
                amount_cents: quote.total_cents,
                payment_method: method,
            })
            .await?;

        info!(
            "Payment {} of {} recorded for booking {}",
            payment_id, quote.total_display, booking_id
        );

        let payment = self.load(payment_id).await?;
        Ok(Checkout { payment, quote })
    }

    /// Charge a pending payment. A decline moves it to `failed`.
    pub async fn settle(&self, ctx: &RequestContext, payment_id: Uuid) -> CoreResult<Payment> {
        let payment = self.load(payment_id).await?;
        self.authorize(ctx, &payment).await?;

        if payment.status != PaymentStatus::Pending {
            return Err(CoreError::InvalidTransition {
                from: payment.status.to_string(),
                to: PaymentStatus::Completed.to_string(),
            });
        }

        let (to, transaction_id, payment_date) = match self.adapter.charge(&payment).await? {
            ChargeOutcome::Approved { transaction_id } => {
                (PaymentStatus::Completed, Some(transaction_id), Some(Utc::now()))
            }
            ChargeOutcome::Declined { reason } => {
                warn!("Payment {} declined: {}", payment_id, reason);
                (PaymentStatus::Failed, None, None)
            }
        };

        self.transition(&payment, to, transaction_id.as_deref(), payment_date)
            .await?;

        let event = PaymentSettledEvent {
            payment_id,
            booking_id: payment.booking_id,
            status: to.to_string(),
            amount_cents: payment.amount_cents,
            transaction_id,
            timestamp: Utc::now().timestamp(),
        };
        info!(event = %to_log_payload(&event), "Payment {} {}", payment_id, to);

        self.load(payment_id).await
    }

    /// Return the funds of a completed payment. Admin only.
    pub async fn refund(&self, ctx: &RequestContext, payment_id: Uuid) -> CoreResult<Payment> {
        if !ctx.is_admin {
            return Err(CoreError::Forbidden("admin access required".to_string()));
        }

        let payment = self.load(payment_id).await?;
        if payment.status != PaymentStatus::Completed {
            return Err(CoreError::InvalidTransition {
                from: payment.status.to_string(),
                to: PaymentStatus::Refunded.to_string(),
            });
        }

        self.adapter.refund(&payment).await?;
        self.transition(&payment, PaymentStatus::Refunded, None, None)
            .await?;

        info!("Payment {} refunded", payment_id);
        self.load(payment_id).await
    }

    pub async fn get_booking_payments(
        &self,
        ctx: &RequestContext,
        booking_id: Uuid,
    ) -> CoreResult<Vec<Payment>> {
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
        self.payments.list_booking_payments(booking_id).await
    }

    async fn load(&self, payment_id: Uuid) -> CoreResult<Payment> {
        self.payments
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("payment {}", payment_id)))
    }

    async fn authorize(&self, ctx: &RequestContext, payment: &Payment) -> CoreResult<()> {
        if ctx.is_admin {
            return Ok(());
        }
        let owner = self
            .bookings
            .get_booking(payment.booking_id)
            .await?
            .map(|details| details.booking.user_id);
        if owner != Some(ctx.user_id) {
            return Err(CoreError::Forbidden(format!(
                "payment {} belongs to another user",
                payment.id
            )));
        }
        Ok(())
    }

    /// Conditional move out of the payment's current status. Losing a race
    /// to another writer surfaces as `InvalidTransition`.
    async fn transition(
        &self,
        payment: &Payment,
        to: PaymentStatus,
        transaction_id: Option<&str>,
        payment_date: Option<chrono::DateTime<Utc>>,
    ) -> CoreResult<()> {
        if !payment.status.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: payment.status.to_string(),
                to: to.to_string(),
            });
        }

        let moved = self
            .payments
            .transition_payment(payment.id, payment.status, to, transaction_id, payment_date)
            .await?;
        if !moved {
            return Err(CoreError::InvalidTransition {
                from: payment.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

/// Stand-in processor: approves every charge with a `txn-<uuid>` reference
/// unless built with [`MockPaymentAdapter::declining`].
#[derive(Debug, Default, Clone)]
pub struct MockPaymentAdapter {
    decline_reason: Option<String>,
}

impl MockPaymentAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declining(reason: &str) -> Self {
        Self {
            decline_reason: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn charge(&self, payment: &Payment) -> CoreResult<ChargeOutcome> {
        if let Some(reason) = &self.decline_reason {
            return Ok(ChargeOutcome::Declined {
                reason: reason.clone(),
            });
        }
        if payment.amount_cents < 0 {
            return Ok(ChargeOutcome::Declined {
                reason: "negative amount".to_string(),
            });
        }
        Ok(ChargeOutcome::Approved {
            transaction_id: format!("txn-{}", Uuid::new_v4()),
        })
    }

    async fn refund(&self, _payment: &Payment) -> CoreResult<()> {
        Ok(())
    }
}
