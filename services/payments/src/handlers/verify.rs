use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use campus_auth_types::identity::IdentityHeaders;
use campus_core::response::success;
use campus_domain::id::EventId;
use campus_domain::money::Money;

use crate::error::PaymentsServiceError;
use crate::state::AppState;
use crate::usecase::verify::{VerifyPaymentInput, VerifyPaymentUseCase};

// ── POST /payments/verify ────────────────────────────────────────────────────

/// Callback relayed by the client after checkout. Unknown fields are ignored.
#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub signature: String,
    pub event_id: Option<i32>,
}

#[derive(Serialize)]
pub struct VerifyPaymentResponse {
    pub registration_id: String,
    pub event_id: i32,
    pub payment_id: Option<String>,
    pub amount_paid: Money,
    pub replayed: bool,
}

pub async fn verify_payment(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<VerifyPaymentRequest>, PaymentsServiceError>,
) -> Result<Response, PaymentsServiceError> {
    let event_id = body
        .event_id
        .ok_or(PaymentsServiceError::MissingField("event_id"))?;

    let usecase = VerifyPaymentUseCase {
        gateway: state.gateway.clone(),
        registrations: state.registration_repo(),
        events: state.event_repo(),
        students: state.student_directory(),
        notifier: state.mailer.clone(),
        credentials: state.credentials.clone(),
    };
    let output = usecase
        .execute(VerifyPaymentInput {
            student_id: identity.student_id(),
            event_id: EventId(event_id),
            order_id: body.order_id,
            payment_id: body.payment_id,
            signature: body.signature,
            received_at: Utc::now(),
        })
        .await?;

    let message = if output.replayed {
        "payment already verified"
    } else {
        "payment verified, registration confirmed"
    };
    let registration = output.registration;
    Ok(success(
        StatusCode::OK,
        message,
        VerifyPaymentResponse {
            registration_id: registration.id.to_string(),
            event_id: registration.event_id.0,
            payment_id: registration.payment_id,
            amount_paid: registration.amount_paid,
            replayed: output.replayed,
        },
    ))
}
