//! Collaborator interfaces the drafting engine consults.
//!
//! Everything here answers "absent" rather than failing: a missing hint,
//! emoji, image description or event only degrades the draft.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::events::{NostrEvent, NostrTag};
use crate::Error;

/// Custom emoji resolved from the user's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub shortcode: String,
    pub url: String,
}

impl Emoji {
    pub fn new(shortcode: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            shortcode: shortcode.into(),
            url: url.into(),
        }
    }
}

/// Read and write relays published by a user (kind 10002).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayList {
    pub read: Vec<String>,
    pub write: Vec<String>,
}

impl RelayList {
    /// Builds a relay list from `r` tags; a tag without a scope marker is
    /// both a read and a write relay.
    pub fn from_tags(tags: &[NostrTag]) -> Self {
        let mut list = Self::default();
        for tag in tags.iter().filter(|tag| tag.name == "r") {
            let Some(url) = tag.value(0).filter(|url| !url.is_empty()) else {
                continue;
            };
            match tag.value(1) {
                Some("read") => list.read.push(url.to_string()),
                Some("write") => list.write.push(url.to_string()),
                _ => {
                    list.read.push(url.to_string());
                    list.write.push(url.to_string());
                }
            }
        }
        list
    }
}

/// Network lookups. Implementations may fail or hang; callers bound them
/// with a timeout and treat errors as absence.
#[async_trait]
pub trait EventFetcher: Send + Sync {
    async fn fetch_event(
        &self,
        event_id: &str,
        relay_hint: Option<&str>,
    ) -> Result<Option<NostrEvent>, Error>;
    async fn fetch_relay_list(&self, pubkey: &str) -> Result<RelayList, Error>;
}

/// In-memory knowledge about where events were seen.
pub trait HintLookup: Send + Sync {
    fn event_hint(&self, event_id: &str) -> Option<String>;
    fn replaceable_event(&self, coordinate: &str) -> Option<NostrEvent>;
}

pub trait EmojiCatalog: Send + Sync {
    fn emoji(&self, shortcode: &str) -> Option<Emoji>;
}

/// Media descriptions (`imeta` tags) for URLs the user uploaded.
pub trait MediaLookup: Send + Sync {
    fn imeta_tag(&self, url: &str) -> Option<NostrTag>;
}

/// Answers every lookup with "absent".
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopServices;

#[async_trait]
impl EventFetcher for NoopServices {
    async fn fetch_event(
        &self,
        _event_id: &str,
        _relay_hint: Option<&str>,
    ) -> Result<Option<NostrEvent>, Error> {
        Ok(None)
    }

    async fn fetch_relay_list(&self, _pubkey: &str) -> Result<RelayList, Error> {
        Ok(RelayList::default())
    }
}

impl HintLookup for NoopServices {
    fn event_hint(&self, _event_id: &str) -> Option<String> {
        None
    }

    fn replaceable_event(&self, _coordinate: &str) -> Option<NostrEvent> {
        None
    }
}

impl EmojiCatalog for NoopServices {
    fn emoji(&self, _shortcode: &str) -> Option<Emoji> {
        None
    }
}

impl MediaLookup for NoopServices {
    fn imeta_tag(&self, _url: &str) -> Option<NostrTag> {
        None
    }
}
