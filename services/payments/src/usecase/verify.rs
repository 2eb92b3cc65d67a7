use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use campus_domain::id::{EventId, StudentId};
use campus_domain::money::Money;

use crate::domain::repository::{
    EventRepository, Notifier, PaymentGateway, RegistrationRepository, StudentDirectory,
};
use crate::domain::signature;
use crate::domain::types::{CaptureCommit, GatewayCredentials, Registration};
use crate::error::PaymentsServiceError;
use crate::usecase::notify::{dispatch, recipient, registration_email};

pub struct VerifyPaymentInput {
    pub student_id: StudentId,
    pub event_id: EventId,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct VerifyPaymentOutput {
    pub registration: Registration,
    /// `true` when an earlier callback already committed this payment.
    pub replayed: bool,
}

pub struct VerifyPaymentUseCase<G, R, E, S, N>
where
    G: PaymentGateway,
    R: RegistrationRepository,
    E: EventRepository,
    S: StudentDirectory,
    N: Notifier,
{
    pub gateway: G,
    pub registrations: R,
    pub events: E,
    pub students: S,
    pub notifier: N,
    pub credentials: Option<GatewayCredentials>,
}

impl<G, R, E, S, N> VerifyPaymentUseCase<G, R, E, S, N>
where
    G: PaymentGateway,
    R: RegistrationRepository,
    E: EventRepository,
    S: StudentDirectory,
    N: Notifier,
{
    pub async fn execute(
        &self,
        input: VerifyPaymentInput,
    ) -> Result<VerifyPaymentOutput, PaymentsServiceError> {
        if input.order_id.trim().is_empty() {
            return Err(PaymentsServiceError::MissingField("order_id"));
        }
        if input.payment_id.trim().is_empty() {
            return Err(PaymentsServiceError::MissingField("payment_id"));
        }
        if input.signature.trim().is_empty() {
            return Err(PaymentsServiceError::MissingField("signature"));
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(PaymentsServiceError::Config("gateway credentials"))?;

        // 1. Authenticity gate: nothing is read or written before this passes.
        if !signature::verify(
            &input.order_id,
            &input.payment_id,
            &input.signature,
            &credentials.key_secret,
        ) {
            warn!(
                order_id = %input.order_id,
                student_id = %input.student_id,
                "rejected payment callback with invalid signature"
            );
            return Err(PaymentsServiceError::InvalidSignature);
        }

        // 2. Ask the gateway what actually happened. A failure here leaves the
        //    payment in `created`; the next callback retries.
        let gateway_payment = self.gateway.fetch_payment(&input.payment_id).await?;
        if gateway_payment.order_id != input.order_id {
            return Err(PaymentsServiceError::PaymentMismatch);
        }
        if !gateway_payment.is_captured() {
            info!(
                order_id = %input.order_id,
                payment_id = %input.payment_id,
                gateway_status = %gateway_payment.status,
                "payment not captured yet"
            );
            return Err(PaymentsServiceError::PaymentNotCaptured);
        }
        let amount = Money::from_minor(gateway_payment.amount)
            .map_err(|_| PaymentsServiceError::PaymentMismatch)?;

        // 3. Atomic commit: capture + registration + seat.
        let commit = CaptureCommit {
            event_id: input.event_id,
            student_id: input.student_id,
            order_id: input.order_id.clone(),
            payment_id: gateway_payment.id.clone(),
            method: gateway_payment.method.clone(),
            amount,
            committed_at: input.received_at,
        };
        let outcome = match self.registrations.commit_capture(&commit).await {
            Ok(outcome) => outcome,
            Err(
                e @ (PaymentsServiceError::CapacityLostAfterCapture { .. }
                | PaymentsServiceError::AlreadyRegistered),
            ) => {
                error!(
                    reconciliation = true,
                    event_id = %input.event_id,
                    student_id = %input.student_id,
                    order_id = %input.order_id,
                    payment_id = %input.payment_id,
                    amount = amount.minor(),
                    kind = e.kind(),
                    "payment captured but registration not granted"
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let replayed = outcome.is_replay();
        let registration = outcome.registration().clone();
        if replayed {
            info!(
                registration_id = %registration.id,
                payment_id = %input.payment_id,
                "duplicate payment callback, returning existing registration"
            );
        } else {
            info!(
                registration_id = %registration.id,
                event_id = %input.event_id,
                student_id = %input.student_id,
                payment_id = %input.payment_id,
                "registration committed"
            );
            self.send_confirmation(&registration).await;
        }

        Ok(VerifyPaymentOutput {
            registration,
            replayed,
        })
    }

    async fn send_confirmation(&self, registration: &Registration) {
        let event = match self.events.find_by_id(registration.event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "event lookup failed, skipping confirmation email");
                return;
            }
        };
        if let Some(contact) = recipient(&self.students, registration.student_id).await {
            dispatch(
                &self.notifier,
                registration_email(&contact, &event, registration),
            );
        }
    }
}
