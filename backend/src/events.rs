//! Transition events
//!
//! Each committed transition is announced to every registered [`EventSink`].
//! Delivery happens on detached tasks after the commit; a failing sink is
//! logged and never affects the transition.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared::{Actor, EntityKind};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EventsConfig;

pub const SIGNATURE_HEADER: &str = "X-Procurement-Signature";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub entity: EntityKind,
    pub entity_id: Uuid,
    pub action: String,
    /// `None` for newly created documents
    pub from_status: Option<String>,
    /// `None` for deleted documents
    pub to_status: Option<String>,
    pub actor_id: Uuid,
    pub vendor_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn new(
        entity: EntityKind,
        entity_id: Uuid,
        action: &str,
        from_status: Option<&str>,
        to_status: Option<&str>,
        actor: &Actor,
        vendor_id: Uuid,
    ) -> Self {
        Self {
            entity,
            entity_id,
            action: action.to_string(),
            from_status: from_status.map(str::to_string),
            to_status: to_status.map(str::to_string),
            actor_id: actor.user_id,
            vendor_id,
            occurred_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, event: &TransitionEvent) -> Result<(), String>;
}

/// Writes every transition to the log
pub struct TracingSink;

#[async_trait]
impl EventSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn deliver(&self, event: &TransitionEvent) -> Result<(), String> {
        info!(
            entity = %event.entity,
            id = %event.entity_id,
            action = %event.action,
            from = event.from_status.as_deref().unwrap_or("-"),
            to = event.to_status.as_deref().unwrap_or("-"),
            actor = %event.actor_id,
            "transition committed"
        );
        Ok(())
    }
}

/// POSTs the JSON event to a webhook, signed with HMAC-SHA256
pub struct WebhookSink {
    url: String,
    secret: Option<String>,
    http_client: reqwest::Client,
}

type HmacSha256 = Hmac<Sha256>;

/// Base64 HMAC-SHA256 of `body` under `secret`
pub fn sign(secret: &str, body: &[u8]) -> Result<String, String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "Failed to create HMAC")?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

impl WebhookSink {
    pub fn new(url: String, secret: Option<String>, timeout: Duration) -> Result<Self, String> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build webhook client: {}", e))?;
        Ok(Self {
            url,
            secret,
            http_client,
        })
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, event: &TransitionEvent) -> Result<(), String> {
        let body = serde_json::to_vec(event).map_err(|e| format!("Failed to encode event: {}", e))?;

        let mut request = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body)?);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| format!("Failed to send webhook: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Webhook returned {}", response.status()))
        }
    }
}

/// Keeps delivered events in memory
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<TransitionEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn deliver(&self, event: &TransitionEvent) -> Result<(), String> {
        self.events
            .lock()
            .map_err(|_| "event buffer poisoned".to_string())?
            .push(event.clone());
        Ok(())
    }
}

/// Fans events out to the configured sinks
#[derive(Clone, Default)]
pub struct EventPublisher {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventPublisher {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    /// Tracing sink plus the webhook when one is configured
    pub fn from_config(config: &EventsConfig) -> Self {
        let mut sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(TracingSink)];
        if let Some(url) = &config.webhook_url {
            match WebhookSink::new(
                url.clone(),
                config.webhook_secret.clone(),
                Duration::from_secs(config.timeout_secs),
            ) {
                Ok(sink) => sinks.push(Arc::new(sink)),
                Err(e) => warn!("Webhook sink disabled: {}", e),
            }
        }
        Self::new(sinks)
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Fire and forget
    pub fn publish(&self, events: Vec<TransitionEvent>) {
        for event in events {
            for sink in &self.sinks {
                let sink = Arc::clone(sink);
                let event = event.clone();
                tokio::spawn(async move {
                    if let Err(e) = sink.deliver(&event).await {
                        warn!(
                            sink = sink.name(),
                            entity = %event.entity,
                            id = %event.entity_id,
                            "event delivery failed: {}",
                            e
                        );
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn deliver(&self, _event: &TransitionEvent) -> Result<(), String> {
            Err("unreachable".to_string())
        }
    }

    fn event() -> TransitionEvent {
        TransitionEvent::new(
            EntityKind::Invoice,
            Uuid::new_v4(),
            "accept",
            Some("received"),
            Some("accepted"),
            &Actor::purchasing_manager(Uuid::new_v4()),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn signature_is_stable_base64() {
        let a = sign("secret", b"{}").unwrap();
        let b = sign("secret", b"{}").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, sign("other", b"{}").unwrap());
        assert_eq!(BASE64.decode(&a).unwrap().len(), 32);
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_others() {
        let memory = Arc::new(MemorySink::new());
        let publisher = EventPublisher::new(vec![Arc::new(FailingSink), memory.clone()]);

        publisher.publish(vec![event(), event()]);
        for _ in 0..50 {
            if memory.events().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(memory.events().len(), 2);
    }
}
