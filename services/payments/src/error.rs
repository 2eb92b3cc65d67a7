use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use campus_core::response::failure;

/// Payments service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum PaymentsServiceError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("amount does not match the event fee")]
    InvalidAmount,
    #[error("payment signature is not authentic")]
    InvalidSignature,
    #[error("payment has not been captured")]
    PaymentNotCaptured,
    #[error("gateway payment does not match the order")]
    PaymentMismatch,
    #[error("not an attendance code")]
    InvalidQrType,
    #[error("attendance window is closed")]
    WindowClosed,
    #[error("payment is required before attendance can be marked")]
    PaymentRequired,
    #[error("attendance token is not recognised")]
    InvalidToken,
    #[error("event not found")]
    EventNotFound,
    #[error("payment not found")]
    PaymentNotFound,
    #[error("already registered for this event")]
    AlreadyRegistered,
    #[error("event is full")]
    EventFull,
    /// Money was captured but the seat went to someone else between order and commit.
    /// Nothing was written; the payment needs manual reconciliation.
    #[error("event filled before payment {payment_id} could be committed")]
    CapacityLostAfterCapture { order_id: String, payment_id: String },
    #[error("attendance already marked")]
    AlreadyMarked,
    #[error("payment is already closed")]
    PaymentClosed,
    #[error("payment gateway unavailable")]
    Gateway { status: Option<u16> },
    #[error("service misconfigured: {0}")]
    Config(&'static str),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl PaymentsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::PaymentNotCaptured => "PAYMENT_NOT_CAPTURED",
            Self::PaymentMismatch => "PAYMENT_MISMATCH",
            Self::InvalidQrType => "INVALID_QR_TYPE",
            Self::WindowClosed => "WINDOW_CLOSED",
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::PaymentNotFound => "PAYMENT_NOT_FOUND",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::EventFull => "EVENT_FULL",
            Self::CapacityLostAfterCapture { .. } => "CAPACITY_LOST_AFTER_CAPTURE",
            Self::AlreadyMarked => "ALREADY_MARKED",
            Self::PaymentClosed => "PAYMENT_CLOSED",
            Self::Gateway { .. } => "GATEWAY_UNAVAILABLE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_)
            | Self::InvalidBody(_)
            | Self::InvalidAmount
            | Self::InvalidSignature
            | Self::PaymentNotCaptured
            | Self::PaymentMismatch
            | Self::InvalidQrType
            | Self::WindowClosed
            | Self::PaymentRequired
            | Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::EventNotFound | Self::PaymentNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered
            | Self::EventFull
            | Self::CapacityLostAfterCapture { .. }
            | Self::AlreadyMarked
            | Self::PaymentClosed => StatusCode::CONFLICT,
            Self::Gateway { .. } | Self::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for PaymentsServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for PaymentsServiceError {
    fn into_response(self) -> Response {
        // 4xx are already recorded by TraceLayer. Upstream, config and internal
        // failures need their cause logged here.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = "INTERNAL", "internal error");
            }
            Self::Gateway { status } => {
                tracing::warn!(upstream_status = ?status, kind = self.kind(), "gateway error");
            }
            Self::Config(what) => {
                tracing::error!(missing = what, kind = self.kind(), "configuration error");
            }
            _ => {}
        }
        failure(self.status(), self.kind(), self.to_string())
    }
}
