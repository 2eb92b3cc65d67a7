use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::domain::repository::Notifier;
use crate::domain::types::{DeliveryReport, EmailMessage};

/// Posts messages as JSON to a mail relay.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(relay_url: &str, from: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            relay_url: relay_url.to_owned(),
            from: from.to_owned(),
        })
    }

    async fn deliver(&self, message: &EmailMessage) -> DeliveryReport {
        let body = RelayMessage {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html_body,
        };
        match self.client.post(&self.relay_url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => DeliveryReport::delivered(),
            Ok(resp) => DeliveryReport::failed(format!("relay returned {}", resp.status())),
            Err(e) => DeliveryReport::failed(e.to_string()),
        }
    }
}

/// Records every message instead of sending it. No network I/O.
#[derive(Clone, Default)]
pub struct SandboxNotifier {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl SandboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn record(&self, message: &EmailMessage) -> DeliveryReport {
        match self.sent.lock() {
            Ok(mut sent) => {
                sent.push(message.clone());
                DeliveryReport::delivered()
            }
            Err(_) => DeliveryReport::failed("sandbox outbox poisoned"),
        }
    }
}

impl Notifier for SandboxNotifier {
    async fn send(&self, message: &EmailMessage) -> DeliveryReport {
        self.record(message)
    }
}

/// Notifier selected by `MAIL_MODE`.
#[derive(Clone)]
pub enum Mailer {
    Http(HttpMailer),
    Sandbox(SandboxNotifier),
}

impl Notifier for Mailer {
    async fn send(&self, message: &EmailMessage) -> DeliveryReport {
        match self {
            Self::Http(mailer) => mailer.deliver(message).await,
            Self::Sandbox(sandbox) => sandbox.record(message),
        }
    }
}
