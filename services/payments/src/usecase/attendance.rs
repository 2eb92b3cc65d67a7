use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use campus_domain::id::{EventId, StudentId};

use crate::domain::repository::{
    AttendanceRepository, EventRepository, Notifier, RegistrationRepository, StudentDirectory,
};
use crate::domain::token::{self, ATTENDANCE_QR_TYPE};
use crate::domain::types::{AttendanceRecord, AttendanceStatus, RegistrationPaymentStatus};
use crate::error::PaymentsServiceError;
use crate::usecase::notify::{attendance_email, dispatch, recipient};

pub struct ScanAttendanceInput {
    /// From the authenticated session, never from the scanned payload.
    pub student_id: StudentId,
    pub qr_type: String,
    pub event_id: EventId,
    pub token: String,
    pub scanned_at: DateTime<Utc>,
}

pub struct ScanAttendanceUseCase<E, A, R, S, N>
where
    E: EventRepository,
    A: AttendanceRepository,
    R: RegistrationRepository,
    S: StudentDirectory,
    N: Notifier,
{
    pub events: E,
    pub attendance: A,
    pub registrations: R,
    pub students: S,
    pub notifier: N,
}

impl<E, A, R, S, N> ScanAttendanceUseCase<E, A, R, S, N>
where
    E: EventRepository,
    A: AttendanceRepository,
    R: RegistrationRepository,
    S: StudentDirectory,
    N: Notifier,
{
    pub async fn execute(
        &self,
        input: ScanAttendanceInput,
    ) -> Result<AttendanceRecord, PaymentsServiceError> {
        if input.qr_type != ATTENDANCE_QR_TYPE {
            return Err(PaymentsServiceError::InvalidQrType);
        }

        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .filter(|e| e.is_active)
            .ok_or(PaymentsServiceError::EventNotFound)?;

        if !event.within_attendance_window(input.scanned_at) {
            return Err(PaymentsServiceError::WindowClosed);
        }

        if self
            .attendance
            .find(event.id, input.student_id)
            .await?
            .is_some()
        {
            return Err(PaymentsServiceError::AlreadyMarked);
        }

        if !event.fee.is_zero() {
            let paid = self
                .registrations
                .find(event.id, input.student_id)
                .await?
                .is_some_and(|r| r.payment_status == RegistrationPaymentStatus::Paid);
            if !paid {
                return Err(PaymentsServiceError::PaymentRequired);
            }
        }

        let Some(origin) = token::classify(&input.token) else {
            warn!(
                event_id = %event.id,
                student_id = %input.student_id,
                "rejected attendance scan with unrecognized token"
            );
            return Err(PaymentsServiceError::InvalidToken);
        };

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            event_id: event.id,
            student_id: input.student_id,
            qr_token: token::mint_attendance_token(),
            status: AttendanceStatus::Present,
            scan_time: input.scanned_at,
            marked_by: origin.as_str().to_owned(),
        };
        // Unique (event, student) index catches a concurrent double scan.
        self.attendance.insert(&record).await?;

        info!(
            event_id = %event.id,
            student_id = %input.student_id,
            marked_by = %record.marked_by,
            "attendance marked"
        );

        if let Some(contact) = recipient(&self.students, input.student_id).await {
            dispatch(&self.notifier, attendance_email(&contact, &event, &record));
        }

        Ok(record)
    }
}
