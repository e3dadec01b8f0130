use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkline_core::models::{NewPayment, Payment, PaymentMethod, PaymentStatus};
use parkline_core::repository::PaymentRepository;
use parkline_core::{CoreError, CoreResult};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{corrupt, map_db_error, storage};

pub struct StorePaymentRepository {
    pool: SqlitePool,
}

impl StorePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount_cents: i64,
    payment_method: String,
    transaction_id: Option<String>,
    status: String,
    payment_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount_cents: row.amount_cents,
            payment_method: row.payment_method.parse::<PaymentMethod>().map_err(corrupt)?,
            transaction_id: row.transaction_id,
            status: row.status.parse::<PaymentStatus>().map_err(corrupt)?,
            payment_date: row.payment_date,
            created_at: row.created_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, booking_id, amount_cents, payment_method, transaction_id, \
     status, payment_date, created_at";

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn create_payment(&self, payment: &NewPayment) -> CoreResult<Uuid> {
        if payment.amount_cents < 0 {
            return Err(CoreError::Validation(
                "Payment amount cannot be negative".to_string(),
            ));
        }

        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, amount_cents, payment_method, status, created_at)
            VALUES (?1, ?2, ?3, ?4, 'pending', ?5)
            "#,
        )
        .bind(id)
        .bind(payment.booking_id)
        .bind(payment.amount_cents)
        .bind(payment.payment_method.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "booking"))?;

        Ok(id)
    }

    async fn get_payment(&self, id: Uuid) -> CoreResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ?1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        row.map(Payment::try_from).transpose()
    }

    async fn list_booking_payments(&self, booking_id: Uuid) -> CoreResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE booking_id = ?1 ORDER BY created_at",
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn transition_payment(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        transaction_id: Option<&str>,
        payment_date: Option<DateTime<Utc>>,
    ) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = ?1,
                transaction_id = COALESCE(?2, transaction_id),
                payment_date = COALESCE(?3, payment_date)
            WHERE id = ?4 AND status = ?5
            "#,
        )
        .bind(to.as_str())
        .bind(transaction_id)
        .bind(payment_date)
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.rows_affected() > 0)
    }
}
