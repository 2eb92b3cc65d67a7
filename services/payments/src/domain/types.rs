use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use campus_domain::id::{EventId, StudentId};
use campus_domain::money::Money;

/// Attendance may be marked from this long before the event starts until this long after.
pub const ATTENDANCE_WINDOW_SECS: i64 = 2 * 60 * 60;

/// Gateway status meaning funds have been collected.
pub const GATEWAY_STATUS_CAPTURED: &str = "captured";

/// Gateway receipts are limited to this many characters.
pub const RECEIPT_MAX_LEN: usize = 40;

/// Retries inside one bucket of this many seconds reuse the same receipt.
pub const RECEIPT_BUCKET_SECS: i64 = 300;

/// Campus event as seen by the payments core.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub fee: Money,
    /// `None` means unlimited seats.
    pub max_participants: Option<i32>,
    pub registered_count: i32,
    pub is_active: bool,
}

impl Event {
    /// Orders are accepted only for active events that have not started yet.
    pub fn is_open_for_orders(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.event_date > now
    }

    pub fn has_seat(&self) -> bool {
        match self.max_participants {
            Some(max) => self.registered_count < max,
            None => true,
        }
    }

    /// Inclusive on both ends.
    pub fn within_attendance_window(&self, now: DateTime<Utc>) -> bool {
        let tolerance = Duration::seconds(ATTENDANCE_WINDOW_SECS);
        now >= self.event_date - tolerance && now <= self.event_date + tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Created,
    Captured,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Captured => "captured",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "captured" => Some(Self::Captured),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local record of a gateway order for one student and one event.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub student_id: StudentId,
    pub event_id: EventId,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub receipt: String,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPaymentStatus {
    Unpaid,
    Paid,
}

impl RegistrationPaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(Self::Unpaid),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// A student's seat at an event.
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: EventId,
    pub student_id: StudentId,
    pub payment_status: RegistrationPaymentStatus,
    pub payment_id: Option<String>,
    pub amount_paid: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Self::Present),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub event_id: EventId,
    pub student_id: StudentId,
    /// Minted when attendance is marked. Identifies this attendance, not the scanned code.
    pub qr_token: String,
    pub status: AttendanceStatus,
    pub scan_time: DateTime<Utc>,
    pub marked_by: String,
}

/// Recipient details for confirmation emails.
#[derive(Debug, Clone)]
pub struct StudentContact {
    pub id: StudentId,
    pub name: String,
    pub email: String,
}

/// Key pair for the payment gateway. The secret also keys callback signatures.
#[derive(Clone)]
pub struct GatewayCredentials {
    pub key_id: String,
    pub key_secret: String,
}

// Keeps the secret out of logs and panics.
impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

/// Outbound create-order request.
#[derive(Debug, Clone)]
pub struct GatewayOrderRequest {
    pub amount: Money,
    pub currency: String,
    pub receipt: String,
    pub event_id: EventId,
    pub student_id: StudentId,
}

/// Order as issued by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Payment as reported by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub id: String,
    pub order_id: String,
    pub status: String,
    pub amount: i64,
    pub method: Option<String>,
}

impl GatewayPayment {
    pub fn is_captured(&self) -> bool {
        self.status == GATEWAY_STATUS_CAPTURED
    }
}

/// Everything the commit transaction needs, gathered after the gateway confirmed capture.
#[derive(Debug, Clone)]
pub struct CaptureCommit {
    pub event_id: EventId,
    pub student_id: StudentId,
    pub order_id: String,
    pub payment_id: String,
    pub method: Option<String>,
    pub amount: Money,
    pub committed_at: DateTime<Utc>,
}

/// Result of the commit transaction.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// This call created the registration.
    Committed(Registration),
    /// The same payment was already committed by an earlier call.
    Replayed(Registration),
}

impl CommitOutcome {
    pub fn registration(&self) -> &Registration {
        match self {
            Self::Committed(r) | Self::Replayed(r) => r,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

/// A transactional email handed to the notification dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Outcome of a send attempt. Delivery problems are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub success: bool,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}
