//! HTTP client for the payment gateway's REST API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::repository::PaymentGateway;
use crate::domain::types::{GatewayCredentials, GatewayOrder, GatewayOrderRequest, GatewayPayment};
use crate::error::PaymentsServiceError;

#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<GatewayCredentials>,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        credentials: Option<GatewayCredentials>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            credentials,
        })
    }

    fn credentials(&self) -> Result<&GatewayCredentials, PaymentsServiceError> {
        self.credentials
            .as_ref()
            .ok_or(PaymentsServiceError::Config("gateway credentials"))
    }

    async fn read<T: for<'de> Deserialize<'de>>(
        &self,
        call: &'static str,
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, PaymentsServiceError> {
        let resp = sent.map_err(|e| {
            warn!(call, timeout = e.is_timeout(), error = %e, "gateway request failed");
            PaymentsServiceError::Gateway { status: None }
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(call, status = status.as_u16(), "gateway returned error status");
            return Err(PaymentsServiceError::Gateway {
                status: Some(status.as_u16()),
            });
        }

        resp.json::<T>().await.map_err(|e| {
            warn!(call, error = %e, "gateway response could not be decoded");
            PaymentsServiceError::Gateway {
                status: Some(status.as_u16()),
            }
        })
    }
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: OrderNotes,
}

#[derive(Serialize)]
struct OrderNotes {
    event_id: String,
    student_id: String,
}

#[derive(Deserialize)]
struct OrderBody {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Deserialize)]
struct PaymentBody {
    id: String,
    order_id: String,
    status: String,
    amount: i64,
    #[serde(default)]
    method: Option<String>,
}

impl PaymentGateway for HttpGateway {
    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentsServiceError> {
        let credentials = self.credentials()?;
        let body = CreateOrderBody {
            amount: request.amount.minor(),
            currency: &request.currency,
            receipt: &request.receipt,
            notes: OrderNotes {
                event_id: request.event_id.to_string(),
                student_id: request.student_id.to_string(),
            },
        };
        let sent = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .json(&body)
            .send()
            .await;
        let order: OrderBody = self.read("create_order", sent).await?;
        Ok(GatewayOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, PaymentsServiceError> {
        let credentials = self.credentials()?;
        let sent = self
            .client
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .send()
            .await;
        let payment: PaymentBody = self.read("fetch_payment", sent).await?;
        Ok(GatewayPayment {
            id: payment.id,
            order_id: payment.order_id,
            status: payment.status,
            amount: payment.amount,
            method: payment.method,
        })
    }
}
