//! Notification gateway
//!
//! Composes the stage hand-off message and defines the delivery trait.
//! Delivery is out-of-band relative to the persisted transition: at most
//! once, no retry, and a failed send never unwinds the state change.

use crate::config::NotifyConfig;
use crate::models::{Customer, Item, Order, Stage};
use crate::{Colorize, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A composed message ready for the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery capability; implementations are external collaborators
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, note: &Notification) -> Result<()>;
}

/// Compose the hand-off message for a stage transition
///
/// Fails only when no responsible address is configured for the stage; the
/// caller reports that separately from the (already persisted) transition.
pub fn compose(
    config: &NotifyConfig,
    order: &Order,
    customer: &Customer,
    item: &Item,
    next_stage: Stage,
    notes: &str,
) -> Result<Notification> {
    let to = config
        .stage_recipient(next_stage)
        .ok_or_else(|| anyhow::anyhow!("no recipient configured for stage {}", next_stage))?
        .to_string();

    let subject = format!(
        "Supply Chain Notification: Order {} -> {}",
        order.order_id, next_stage
    );

    let body = format!(
        "Hello,\n\n\
         The following item has reached your stage in the supply chain:\n\n\
         Order ID: {}\n\
         Customer Name: {}\n\
         Item: {}\n\
         Quantity: {}\n\
         Next Stage: {}\n\
         Notes: {}\n\n\
         Please proceed with your processing.\n\n\
         Thank you,\n\
         Supply Chain System\n",
        order.order_id,
        customer.name,
        item.name,
        item.quantity,
        next_stage,
        if notes.is_empty() { "None" } else { notes },
    );

    Ok(Notification { to, subject, body })
}

/// Logs composed messages to the console; stands in for a real gateway
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, note: &Notification) -> Result<()> {
        println!(
            "{}",
            format!("📧 [{}] {}", note.to, note.subject).cyan()
        );
        Ok(())
    }
}

/// Mail API client (JSON POST, bearer-key auth)
#[cfg(feature = "email")]
pub struct HttpNotifier {
    endpoint: String,
    api_key: String,
    sender: String,
    client: reqwest::Client,
}

#[cfg(feature = "email")]
impl HttpNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            sender: sender.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "email")]
#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, note: &Notification) -> Result<()> {
        let payload = serde_json::json!({
            "personalizations": [{ "to": [{ "email": note.to }] }],
            "from": { "email": self.sender },
            "subject": note.subject,
            "content": [{ "type": "text/plain", "value": note.body }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("mail API returned {}", response.status());
        }
        Ok(())
    }
}

/// Build the notifier for the given config
///
/// Uses the mail API client when the `email` feature is enabled and both the
/// endpoint and key are configured; otherwise falls back to console logging.
pub fn build_notifier(config: &NotifyConfig) -> Arc<dyn Notifier> {
    #[cfg(feature = "email")]
    if let (Some(endpoint), Some(api_key)) = (&config.mail_endpoint, &config.api_key) {
        return Arc::new(HttpNotifier::new(endpoint, api_key, &config.sender));
    }

    let _ = config;
    Arc::new(ConsoleNotifier)
}
