#![allow(async_fn_in_trait)]

use std::future::Future;

use uuid::Uuid;

use campus_domain::id::{EventId, StudentId};

use crate::domain::types::{
    AttendanceRecord, CaptureCommit, CommitOutcome, DeliveryReport, EmailMessage, Event,
    GatewayOrder, GatewayOrderRequest, GatewayPayment, Payment, Registration, StudentContact,
};
use crate::error::PaymentsServiceError;

/// Read access to events. Seat counts are only written by [`RegistrationRepository`].
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, PaymentsServiceError>;
}

/// Repository for gateway payment records.
pub trait PaymentRepository: Send + Sync {
    /// Store a new payment. Returns `false` when a row for the same gateway order exists.
    async fn create(&self, payment: &Payment) -> Result<bool, PaymentsServiceError>;

    /// Find the caller's payment for a gateway order.
    async fn find_by_order(
        &self,
        order_id: &str,
        student_id: StudentId,
    ) -> Result<Option<Payment>, PaymentsServiceError>;

    /// Move a `created` payment to `failed`. Returns `false` if no `created` row matched.
    async fn mark_failed(
        &self,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<bool, PaymentsServiceError>;
}

/// Repository for registrations and the atomic capture commit.
pub trait RegistrationRepository: Send + Sync {
    async fn find(
        &self,
        event_id: EventId,
        student_id: StudentId,
    ) -> Result<Option<Registration>, PaymentsServiceError>;

    /// Capture the payment, insert the registration and increment the event's
    /// `registered_count` in one transaction. Either all of it happens or none.
    async fn commit_capture(
        &self,
        commit: &CaptureCommit,
    ) -> Result<CommitOutcome, PaymentsServiceError>;
}

/// Repository for attendance marks.
pub trait AttendanceRepository: Send + Sync {
    async fn find(
        &self,
        event_id: EventId,
        student_id: StudentId,
    ) -> Result<Option<AttendanceRecord>, PaymentsServiceError>;

    /// Insert a mark. A concurrent duplicate for the same (event, student) yields `AlreadyMarked`.
    async fn insert(&self, record: &AttendanceRecord) -> Result<(), PaymentsServiceError>;
}

/// Lookup of student contact details for notifications.
pub trait StudentDirectory: Send + Sync {
    async fn find_contact(
        &self,
        id: StudentId,
    ) -> Result<Option<StudentContact>, PaymentsServiceError>;
}

/// Port for the payment provider's HTTP API.
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentsServiceError>;

    /// Single attempt, never retried here. A repeated callback is the retry.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, PaymentsServiceError>;
}

/// Transactional email capability. Never fails: problems come back in the report.
pub trait Notifier: Clone + Send + Sync + 'static {
    fn send(&self, message: &EmailMessage) -> impl Future<Output = DeliveryReport> + Send;
}
