use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use campus_domain::id::{EventId, StudentId};
use campus_domain::money::Money;

use crate::domain::repository::{
    EventRepository, PaymentGateway, PaymentRepository, RegistrationRepository,
};
use crate::domain::types::{
    GatewayCredentials, GatewayOrderRequest, Payment, PaymentStatus, RECEIPT_BUCKET_SECS,
    RECEIPT_MAX_LEN,
};
use crate::error::PaymentsServiceError;

/// Receipt sent with the order: stable for one student and event within a time bucket,
/// so a client retry inside the bucket asks the gateway for the same receipt.
pub fn build_receipt(event_id: EventId, student_id: StudentId, now: DateTime<Utc>) -> String {
    let mut receipt = format!(
        "ev{}-{}-{}",
        event_id,
        student_id.short(),
        now.timestamp().div_euclid(RECEIPT_BUCKET_SECS)
    );
    receipt.truncate(RECEIPT_MAX_LEN);
    receipt
}

pub struct CreateOrderInput {
    pub student_id: StudentId,
    pub event_id: EventId,
    /// Requested amount in minor units.
    pub amount: i64,
    pub currency: Option<String>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CreateOrderOutput {
    pub order_id: String,
    pub amount: Money,
    pub currency: String,
    pub key_id: String,
    pub event_id: EventId,
    pub event_name: String,
    pub receipt: String,
}

pub struct CreateOrderUseCase<E, P, R, G>
where
    E: EventRepository,
    P: PaymentRepository,
    R: RegistrationRepository,
    G: PaymentGateway,
{
    pub events: E,
    pub payments: P,
    pub registrations: R,
    pub gateway: G,
    pub credentials: Option<GatewayCredentials>,
    pub currency: String,
}

impl<E, P, R, G> CreateOrderUseCase<E, P, R, G>
where
    E: EventRepository,
    P: PaymentRepository,
    R: RegistrationRepository,
    G: PaymentGateway,
{
    pub async fn execute(
        &self,
        input: CreateOrderInput,
    ) -> Result<CreateOrderOutput, PaymentsServiceError> {
        let requested =
            Money::from_minor(input.amount).map_err(|_| PaymentsServiceError::InvalidAmount)?;
        if let Some(ref currency) = input.currency {
            if !currency.eq_ignore_ascii_case(&self.currency) {
                return Err(PaymentsServiceError::InvalidAmount);
            }
        }

        // 1. Event must exist, be active and not have started → 404
        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .filter(|e| e.is_open_for_orders(input.requested_at))
            .ok_or(PaymentsServiceError::EventNotFound)?;

        // 2. One registration per student per event → 409
        if self
            .registrations
            .find(event.id, input.student_id)
            .await?
            .is_some()
        {
            return Err(PaymentsServiceError::AlreadyRegistered);
        }

        // 3. Seats left → 409. Re-checked at commit time.
        if !event.has_seat() {
            return Err(PaymentsServiceError::EventFull);
        }

        // 4. Exact fee, no partial payments. Free events never go through the gateway.
        if event.fee.is_zero() || requested != event.fee {
            return Err(PaymentsServiceError::InvalidAmount);
        }

        // 5. Credentials before any network call → 503
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(PaymentsServiceError::Config("gateway credentials"))?;

        let receipt = build_receipt(event.id, input.student_id, input.requested_at);
        let order = self
            .gateway
            .create_order(&GatewayOrderRequest {
                amount: event.fee,
                currency: self.currency.clone(),
                receipt: receipt.clone(),
                event_id: event.id,
                student_id: input.student_id,
            })
            .await?;

        // Same receipt inside the bucket gives the same gateway order: keep the row we have.
        if self
            .payments
            .find_by_order(&order.id, input.student_id)
            .await?
            .is_some()
        {
            info!(
                event_id = %event.id,
                student_id = %input.student_id,
                order_id = %order.id,
                "payment order reused"
            );
        } else {
            let now = Utc::now();
            let payment = Payment {
                id: Uuid::new_v4(),
                student_id: input.student_id,
                event_id: event.id,
                order_id: order.id.clone(),
                payment_id: None,
                amount: event.fee,
                currency: self.currency.clone(),
                status: PaymentStatus::Created,
                method: None,
                receipt: receipt.clone(),
                failure_reason: None,
                created_at: now,
                updated_at: now,
            };
            // A concurrent retry may have stored the row first.
            if !self.payments.create(&payment).await?
                && self
                    .payments
                    .find_by_order(&order.id, input.student_id)
                    .await?
                    .is_none()
            {
                return Err(anyhow::anyhow!(
                    "gateway order {} is stored for another student",
                    order.id
                )
                .into());
            }

            info!(
                event_id = %event.id,
                student_id = %input.student_id,
                order_id = %order.id,
                amount = event.fee.minor(),
                "payment order created"
            );
        }

        Ok(CreateOrderOutput {
            order_id: order.id,
            amount: event.fee,
            currency: self.currency.clone(),
            key_id: credentials.key_id.clone(),
            event_id: event.id,
            event_name: event.name,
            receipt,
        })
    }
}
