use tracing::info;

use campus_domain::id::StudentId;

use crate::domain::repository::PaymentRepository;
use crate::domain::types::{Payment, PaymentStatus};
use crate::error::PaymentsServiceError;

/// Longest failure reason kept from the client.
const FAILURE_REASON_MAX_LEN: usize = 255;

pub struct ReportPaymentFailureInput {
    pub student_id: StudentId,
    pub order_id: String,
    pub reason: Option<String>,
}

/// Client-reported checkout failure (dismissed modal, declined card).
pub struct ReportPaymentFailureUseCase<P: PaymentRepository> {
    pub payments: P,
}

impl<P: PaymentRepository> ReportPaymentFailureUseCase<P> {
    pub async fn execute(
        &self,
        input: ReportPaymentFailureInput,
    ) -> Result<(), PaymentsServiceError> {
        if input.order_id.trim().is_empty() {
            return Err(PaymentsServiceError::MissingField("order_id"));
        }

        let payment = self
            .payments
            .find_by_order(&input.order_id, input.student_id)
            .await?
            .ok_or(PaymentsServiceError::PaymentNotFound)?;

        match payment.status {
            PaymentStatus::Failed => Ok(()),
            PaymentStatus::Captured => Err(PaymentsServiceError::PaymentClosed),
            PaymentStatus::Created => {
                let reason = input.reason.as_deref().map(|r| truncate(r.trim()));
                // `false` means a capture landed between the read and the update.
                if !self.payments.mark_failed(payment.id, reason).await? {
                    return Err(PaymentsServiceError::PaymentClosed);
                }
                info!(
                    order_id = %payment.order_id,
                    student_id = %input.student_id,
                    "payment marked failed"
                );
                Ok(())
            }
        }
    }
}

fn truncate(reason: &str) -> &str {
    match reason.char_indices().nth(FAILURE_REASON_MAX_LEN) {
        Some((idx, _)) => &reason[..idx],
        None => reason,
    }
}

pub struct GetPaymentUseCase<P: PaymentRepository> {
    pub payments: P,
}

impl<P: PaymentRepository> GetPaymentUseCase<P> {
    pub async fn execute(
        &self,
        order_id: &str,
        student_id: StudentId,
    ) -> Result<Payment, PaymentsServiceError> {
        self.payments
            .find_by_order(order_id, student_id)
            .await?
            .ok_or(PaymentsServiceError::PaymentNotFound)
    }
}
