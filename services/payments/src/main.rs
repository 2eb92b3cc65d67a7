use sea_orm::Database;
use tracing::{info, warn};

use campus_core::tracing::init_tracing;
use campus_payments::config::{MailMode, PaymentsConfig};
use campus_payments::infra::gateway::HttpGateway;
use campus_payments::infra::mailer::{HttpMailer, Mailer, SandboxNotifier};
use campus_payments::router::build_router;
use campus_payments::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = PaymentsConfig::from_env();
    if config.gateway_credentials.is_none() {
        warn!("gateway credentials not configured, payment endpoints will answer 503");
    }

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let gateway = HttpGateway::new(
        &config.gateway_base_url,
        config.gateway_credentials.clone(),
        config.gateway_timeout,
    )
    .expect("failed to build gateway client");

    let mailer = match &config.mail_mode {
        MailMode::Sandbox => {
            info!("mail mode: sandbox, emails are recorded but not sent");
            Mailer::Sandbox(SandboxNotifier::new())
        }
        MailMode::Http { relay_url } => Mailer::Http(
            HttpMailer::new(relay_url, &config.mail_from, config.gateway_timeout)
                .expect("failed to build mail client"),
        ),
    };

    let state = AppState {
        db,
        gateway,
        credentials: config.gateway_credentials,
        mailer,
        currency: config.currency,
    };

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.payments_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("payments service listening on {http_addr}");
    axum::serve(listener, router).await.expect("server error");
}
