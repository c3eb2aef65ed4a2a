use async_trait::async_trait;
use nostr_sdk::prelude::*;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::events::NostrEvent;
use crate::services::{EventFetcher, RelayList};
use crate::Error;

/// [`EventFetcher`] backed by a relay pool.
#[derive(Clone)]
pub struct RelayFetcher {
    client: Client,
    config: RelayConfig,
}

impl RelayFetcher {
    pub async fn new(config: RelayConfig) -> Result<Self, Error> {
        let client = Client::default();
        for relay in &config.relays {
            client.add_relay(relay).await?;
        }
        client.connect().await;

        info!(relays = config.relays.len(), "Relay fetcher connected");
        Ok(Self { client, config })
    }

    pub fn from_client(client: Client, config: RelayConfig) -> Self {
        Self { client, config }
    }

    /// Adds a hinted relay that is not already in the pool. Returns its URL
    /// when it was added, so the caller can drop it after the lookup.
    async fn attach_hint(&self, hint: &str) -> Option<RelayUrl> {
        let url = match RelayUrl::parse(hint) {
            Ok(url) => url,
            Err(err) => {
                debug!(relay = %hint, error = %err, "Ignoring unusable relay hint");
                return None;
            }
        };
        if self.client.relays().await.contains_key(&url) {
            return None;
        }
        match self.client.add_relay(url.clone()).await {
            Ok(true) => Some(url),
            Ok(false) => None,
            Err(err) => {
                debug!(relay = %hint, error = %err, "Ignoring unusable relay hint");
                None
            }
        }
    }

    async fn detach_hint(&self, url: RelayUrl) {
        if let Err(err) = self.client.remove_relay(url.clone()).await {
            warn!(relay = %url, error = %err, "Failed to drop hinted relay");
        }
    }

    async fn fetch_newest(&self, filter: Filter) -> Result<Option<Event>, Error> {
        let events = self
            .client
            .fetch_events(filter, self.config.timeout)
            .await?;
        Ok(events
            .iter()
            .max_by_key(|event| event.created_at)
            .cloned())
    }
}

#[async_trait]
impl EventFetcher for RelayFetcher {
    async fn fetch_event(
        &self,
        event_id: &str,
        relay_hint: Option<&str>,
    ) -> Result<Option<NostrEvent>, Error> {
        let id = EventId::parse(event_id).map_err(|err| Error::InvalidReference {
            value: event_id.to_string(),
            reason: err.to_string(),
        })?;

        let attached = match relay_hint {
            Some(hint) => self.attach_hint(hint).await,
            None => None,
        };
        if attached.is_some() {
            self.client.connect().await;
        }

        let filter = Filter::new().id(id).limit(1);
        let result = self.fetch_newest(filter).await;
        if let Some(url) = attached {
            self.detach_hint(url).await;
        }
        let event = result?;
        debug!(event_id = %event_id, found = event.is_some(), "Fetched event");
        Ok(event.as_ref().map(NostrEvent::from_event))
    }

    async fn fetch_relay_list(&self, pubkey: &str) -> Result<RelayList, Error> {
        let author = PublicKey::parse(pubkey)?;
        let filter = Filter::new()
            .author(author)
            .kind(Kind::RelayList)
            .limit(1);

        let list = match self.fetch_newest(filter).await? {
            Some(event) => RelayList::from_tags(&NostrEvent::from_event(&event).tags),
            None => RelayList::default(),
        };
        debug!(
            pubkey = %pubkey,
            read = list.read.len(),
            write = list.write.len(),
            "Fetched relay list"
        );
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(relays: &[&str]) -> RelayFetcher {
        let config = RelayConfig::new(relays.iter().map(|relay| relay.to_string()).collect());
        RelayFetcher::from_client(Client::default(), config)
    }

    #[tokio::test]
    async fn test_hint_relay_is_removed_after_lookup() {
        let fetcher = fetcher(&[]);
        let url = fetcher.attach_hint("wss://hint.example").await.unwrap();
        assert_eq!(fetcher.client.relays().await.len(), 1);

        fetcher.detach_hint(url).await;
        assert!(fetcher.client.relays().await.is_empty());
    }

    #[tokio::test]
    async fn test_configured_relay_is_not_reattached() {
        let fetcher = fetcher(&["wss://pool.example"]);
        fetcher.client.add_relay("wss://pool.example").await.unwrap();

        assert!(fetcher.attach_hint("wss://pool.example").await.is_none());
        assert!(fetcher.attach_hint("not a relay").await.is_none());
        assert_eq!(fetcher.client.relays().await.len(), 1);
    }
}
