use async_trait::async_trait;
use nostr_sdk::prelude::*;
use tracing::info;

use crate::config::RelayConfig;
use crate::draft::Draft;
use crate::events::NostrEvent;
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub event: NostrEvent,
    /// Relays that accepted the event.
    pub success: Vec<String>,
    pub failed: usize,
}

impl PublishResult {
    pub fn event_id(&self) -> &str {
        &self.event.event_id
    }
}

/// Signs a draft and sends it to relays.
#[async_trait]
pub trait DraftPublisher: Send + Sync {
    async fn publish(&self, draft: &Draft) -> Result<PublishResult, Error>;
}

#[derive(Clone)]
pub struct RelayPublisher {
    client: Client,
    keys: Keys,
    config: RelayConfig,
}

impl RelayPublisher {
    pub async fn new(config: RelayConfig) -> Result<Self, Error> {
        let keys = config.keys()?;
        let client = Client::default();

        for relay in &config.relays {
            client.add_relay(relay).await?;
        }

        client.connect().await;
        info!(
            relays = config.relays.len(),
            author = %keys.public_key(),
            "Relay publisher connected"
        );
        Ok(Self {
            client,
            keys,
            config,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }
}

#[async_trait]
impl DraftPublisher for RelayPublisher {
    async fn publish(&self, draft: &Draft) -> Result<PublishResult, Error> {
        let event = draft.sign(&self.keys)?;
        let output = tokio::time::timeout(self.config.timeout, self.client.send_event(&event))
            .await
            .map_err(|_| Error::Timeout)??;

        let success: Vec<String> = output.success.iter().map(|url| url.to_string()).collect();
        let failed = output.failed.len();
        if self.config.min_acks > 0 && success.len() < self.config.min_acks {
            return Err(Error::Quorum {
                required: self.config.min_acks,
                actual: success.len(),
            });
        }

        info!(
            event_id = %event.id,
            kind = draft.kind,
            success = success.len(),
            failed,
            "Published draft"
        );

        Ok(PublishResult {
            event: NostrEvent::from_event(&event),
            success,
            failed,
        })
    }
}
