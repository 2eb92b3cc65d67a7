use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use campus_core::health::healthz;
use campus_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    attendance::scan_attendance,
    health::readyz,
    order::{create_order, get_order, report_failure},
    verify::verify_payment,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Payments
        .route("/payments/orders", post(create_order))
        .route("/payments/orders/{order_id}", get(get_order))
        .route("/payments/verify", post(verify_payment))
        .route("/payments/failure", post(report_failure))
        // Attendance
        .route("/attendance/scan", post(scan_attendance))
        .with_state(state)
        // The last layer wraps the others: the id is set before the trace span opens.
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
