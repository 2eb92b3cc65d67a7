use axum::{
    Json,
    extract::{Path, State},
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
use crate::usecase::order::{CreateOrderInput, CreateOrderUseCase};
use crate::usecase::payment::{
    GetPaymentUseCase, ReportPaymentFailureInput, ReportPaymentFailureUseCase,
};

// ── POST /payments/orders ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub event_id: Option<i32>,
    /// Minor units.
    pub amount: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub amount: Money,
    pub currency: String,
    pub key_id: String,
    pub event_id: i32,
    pub event_name: String,
    pub receipt: String,
}

pub async fn create_order(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<CreateOrderRequest>, PaymentsServiceError>,
) -> Result<Response, PaymentsServiceError> {
    let event_id = body
        .event_id
        .ok_or(PaymentsServiceError::MissingField("event_id"))?;
    let amount = body
        .amount
        .ok_or(PaymentsServiceError::MissingField("amount"))?;

    let usecase = CreateOrderUseCase {
        events: state.event_repo(),
        payments: state.payment_repo(),
        registrations: state.registration_repo(),
        gateway: state.gateway.clone(),
        credentials: state.credentials.clone(),
        currency: state.currency.clone(),
    };
    let order = usecase
        .execute(CreateOrderInput {
            student_id: identity.student_id(),
            event_id: EventId(event_id),
            amount,
            currency: body.currency,
            requested_at: Utc::now(),
        })
        .await?;

    Ok(success(
        StatusCode::CREATED,
        "order created",
        OrderResponse {
            order_id: order.order_id,
            amount: order.amount,
            currency: order.currency,
            key_id: order.key_id,
            event_id: order.event_id.0,
            event_name: order.event_name,
            receipt: order.receipt,
        },
    ))
}

// ── GET /payments/orders/{order_id} ──────────────────────────────────────────

#[derive(Serialize)]
pub struct PaymentResponse {
    pub order_id: String,
    pub payment_id: Option<String>,
    pub event_id: i32,
    pub amount: Money,
    pub currency: String,
    pub status: &'static str,
    pub method: Option<String>,
    pub failure_reason: Option<String>,
    #[serde(serialize_with = "campus_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<Utc>,
    #[serde(serialize_with = "campus_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<Utc>,
}

pub async fn get_order(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Response, PaymentsServiceError> {
    let usecase = GetPaymentUseCase {
        payments: state.payment_repo(),
    };
    let payment = usecase.execute(&order_id, identity.student_id()).await?;
    Ok(success(
        StatusCode::OK,
        "payment found",
        PaymentResponse {
            order_id: payment.order_id,
            payment_id: payment.payment_id,
            event_id: payment.event_id.0,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status.as_str(),
            method: payment.method,
            failure_reason: payment.failure_reason,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        },
    ))
}

// ── POST /payments/failure ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReportFailureRequest {
    #[serde(default)]
    pub order_id: String,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct ReportFailureResponse {
    pub order_id: String,
    pub status: &'static str,
}

pub async fn report_failure(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<ReportFailureRequest>, PaymentsServiceError>,
) -> Result<Response, PaymentsServiceError> {
    let usecase = ReportPaymentFailureUseCase {
        payments: state.payment_repo(),
    };
    usecase
        .execute(ReportPaymentFailureInput {
            student_id: identity.student_id(),
            order_id: body.order_id.clone(),
            reason: body.reason,
        })
        .await?;
    Ok(success(
        StatusCode::OK,
        "payment failure recorded",
        ReportFailureResponse {
            order_id: body.order_id,
            status: "failed",
        },
    ))
}
