//! Chat webhook alerts: target validation, message text, and delivery

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::io::HttpClient;

pub const MISSING_URL_MESSAGE: &str = "Webhook URL is not provided.";
pub const INVALID_URL_MESSAGE: &str = "Webhook URL isn't a valid URL. Please check again";

/// A validated absolute `http`/`https` webhook URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget(Url);

impl WebhookTarget {
    /// Validate a webhook URL. `None`, blank, relative and non-HTTP URLs are rejected.
    pub fn parse(raw: Option<&str>) -> crate::Result<Self> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(crate::NotifierError::Config(MISSING_URL_MESSAGE.to_string())),
        };

        let url = Url::parse(raw).map_err(|e| {
            tracing::debug!("Rejecting webhook URL '{}': {}", raw, e);
            crate::NotifierError::Config(INVALID_URL_MESSAGE.to_string())
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            tracing::debug!("Rejecting webhook URL '{}': not an http(s) URL", raw);
            return Err(crate::NotifierError::Config(INVALID_URL_MESSAGE.to_string()));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for WebhookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body posted to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub text: String,
}

/// Outcome of a delivery that reached the webhook server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub body: String,
}

impl DeliveryReceipt {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Alert text for the monitored instance labelled `host`
pub fn format_message(host: &str, is_successful: bool) -> String {
    if is_successful {
        format!("SRN: Connection to {}'s redis instance is successful", host)
    } else {
        format!(
            "SRN: Failed to connect to {}'s redis instance. Please check the server.",
            host
        )
    }
}

/// Posts formatted alerts for one monitored instance
pub struct AlertSender {
    target: WebhookTarget,
    host: String,
    http: Arc<dyn HttpClient>,
}

impl fmt::Debug for AlertSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertSender")
            .field("target", &self.target)
            .field("host", &self.host)
            .finish()
    }
}

impl AlertSender {
    pub fn new(target: WebhookTarget, host: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            target,
            host: host.into(),
            http,
        }
    }

    pub fn target(&self) -> &WebhookTarget {
        &self.target
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn format_message(&self, is_successful: bool) -> String {
        format_message(&self.host, is_successful)
    }

    /// Post one alert. Non-2xx responses still resolve to a receipt;
    /// only transport failures are reported as [`crate::NotifierError::Delivery`].
    pub async fn send_alert(&self, is_successful: bool) -> crate::Result<DeliveryReceipt> {
        let payload = AlertPayload {
            text: self.format_message(is_successful),
        };
        let body = serde_json::to_value(&payload)?;

        tracing::debug!("Posting alert to webhook: {}", payload.text);
        let response = self
            .http
            .post_json(self.target.as_str(), &body)
            .await
            .map_err(|e| crate::NotifierError::Delivery(e.to_string()))?;

        let receipt = DeliveryReceipt {
            status: response.status,
            body: response.body,
        };
        if !receipt.is_success() {
            tracing::warn!(
                "Webhook returned status {}: {}",
                receipt.status,
                receipt.body
            );
        }
        Ok(receipt)
    }
}
