//! Decision logic of the registration commit.
//!
//! Storage adapters load the locked event row, the payment row and any existing
//! registration inside one transaction, ask [`plan_commit`] what to do, and then
//! either write or roll back. Keeping the decision pure lets every adapter
//! (Postgres, in-memory) enforce the same rules.

use crate::domain::types::{CaptureCommit, Event, Payment, PaymentStatus, Registration};
use crate::error::PaymentsServiceError;

#[derive(Debug, Clone)]
pub enum CommitPlan {
    /// Capture the payment, insert the registration and take a seat.
    Insert,
    /// The same payment is already registered. Return it unchanged.
    Replay(Registration),
}

pub fn plan_commit(
    commit: &CaptureCommit,
    event: &Event,
    payment: Option<&Payment>,
    existing: Option<&Registration>,
) -> Result<CommitPlan, PaymentsServiceError> {
    if let Some(registration) = existing {
        if registration.payment_id.as_deref() == Some(commit.payment_id.as_str()) {
            return Ok(CommitPlan::Replay(registration.clone()));
        }
    }

    let payment = payment.ok_or(PaymentsServiceError::PaymentNotFound)?;
    if payment.event_id != commit.event_id {
        return Err(PaymentsServiceError::PaymentMismatch);
    }
    match payment.status {
        // A failed attempt can still be followed by a successful one on the same order.
        PaymentStatus::Created | PaymentStatus::Failed => {}
        PaymentStatus::Captured => return Err(PaymentsServiceError::PaymentClosed),
    }
    if payment.amount != commit.amount {
        return Err(PaymentsServiceError::PaymentMismatch);
    }

    if existing.is_some() {
        return Err(PaymentsServiceError::AlreadyRegistered);
    }
    if !event.has_seat() {
        return Err(PaymentsServiceError::CapacityLostAfterCapture {
            order_id: commit.order_id.clone(),
            payment_id: commit.payment_id.clone(),
        });
    }
    Ok(CommitPlan::Insert)
}
