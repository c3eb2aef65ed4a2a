use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::NostrTag;
use crate::Error;

/// Unsigned event ready to be signed and sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub kind: u16,
    pub content: String,
    pub tags: Vec<NostrTag>,
    pub created_at: u64,
}

impl Draft {
    pub fn new(kind: u16, content: impl Into<String>, tags: Vec<NostrTag>, created_at: u64) -> Self {
        Self {
            kind,
            content: content.into(),
            tags,
            created_at,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }

    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a NostrTag> + 'a {
        self.tags.iter().filter(move |tag| tag.name == name)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Builder carrying the draft's kind, content, tags and timestamp, for
    /// signing with a [`Keys`] or any other signer.
    pub fn to_event_builder(&self) -> Result<EventBuilder, Error> {
        let tags = self
            .tags
            .iter()
            .map(NostrTag::to_sdk_tag)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EventBuilder::new(Kind::from(self.kind), self.content.clone())
            .custom_created_at(Timestamp::from(self.created_at))
            .tags(tags))
    }

    pub fn sign(&self, keys: &Keys) -> Result<Event, Error> {
        Ok(self.to_event_builder()?.sign_with_keys(keys)?)
    }
}
