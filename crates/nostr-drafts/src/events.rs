use std::time::{SystemTime, UNIX_EPOCH};

use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Error;

pub const KIND_METADATA: u16 = 0;
pub const KIND_SHORT_TEXT_NOTE: u16 = 1;
pub const KIND_CONTACTS: u16 = 3;
pub const KIND_EVENT_DELETION: u16 = 5;
pub const KIND_REPOST: u16 = 6;
pub const KIND_REACTION: u16 = 7;
pub const KIND_GENERIC_REPOST: u16 = 16;
pub const KIND_EXTERNAL_CONTENT_REACTION: u16 = 17;
pub const KIND_POLL_RESPONSE: u16 = 1018;
pub const KIND_POLL: u16 = 1068;
pub const KIND_COMMENT: u16 = 1111;
pub const KIND_VOICE_COMMENT: u16 = 1244;
pub const KIND_REPORT: u16 = 1984;
pub const KIND_HIGHLIGHT: u16 = 9802;
pub const KIND_MUTE_LIST: u16 = 10000;
pub const KIND_PIN_LIST: u16 = 10001;
pub const KIND_RELAY_LIST: u16 = 10002;
pub const KIND_BOOKMARK_LIST: u16 = 10003;
pub const KIND_FAVORITE_RELAYS: u16 = 10012;
pub const KIND_USER_EMOJI_LIST: u16 = 10030;
pub const KIND_BLOSSOM_SERVER_LIST: u16 = 10063;
pub const KIND_GROUP_JOIN_REQUEST: u16 = 28934;
pub const KIND_GROUP_LEAVE_REQUEST: u16 = 28936;
pub const KIND_RELAY_SET: u16 = 30002;
pub const KIND_APPLICATION_DATA: u16 = 30078;
pub const KIND_RELAY_REVIEW: u16 = 31987;

/// Ordered string array attached to an event, split into name and fields.
///
/// Serializes as the protocol's flat array form, e.g. `["e", "<id>", "", "root"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct NostrTag {
    pub name: String,
    pub values: Vec<String>,
}

impl NostrTag {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Drops empty fields from the end of the tag. Empty fields followed by a
    /// non-empty one keep their position.
    pub fn trimmed(mut self) -> Self {
        while self.values.last().is_some_and(|value| value.is_empty()) {
            self.values.pop();
        }
        self
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|s| s.as_str())
    }

    pub fn to_vec(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(1 + self.values.len());
        parts.push(self.name.clone());
        parts.extend(self.values.iter().cloned());
        parts
    }

    pub fn to_sdk_tag(&self) -> Result<Tag, Error> {
        Ok(Tag::parse(self.to_vec())?)
    }

    pub fn from_sdk_tag(tag: &Tag) -> Self {
        let parts = tag.clone().to_vec();
        let name = parts.first().cloned().unwrap_or_default();
        let values = parts.into_iter().skip(1).collect();
        Self { name, values }
    }
}

impl From<NostrTag> for Vec<String> {
    fn from(tag: NostrTag) -> Self {
        let mut parts = Vec::with_capacity(1 + tag.values.len());
        parts.push(tag.name);
        parts.extend(tag.values);
        parts
    }
}

impl TryFrom<Vec<String>> for NostrTag {
    type Error = Error;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        let mut iter = parts.into_iter();
        let name = iter.next().ok_or(Error::EmptyTag)?;
        Ok(Self {
            name,
            values: iter.collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NostrEvent {
    pub event_id: String,
    pub kind: u16,
    pub pubkey: String,
    pub created_at: u64,
    pub content: String,
    pub tags: Vec<NostrTag>,
    pub raw_json: String,
}

impl NostrEvent {
    pub fn from_event(event: &Event) -> Self {
        let tags = event
            .tags
            .iter()
            .map(NostrTag::from_sdk_tag)
            .collect();

        Self {
            event_id: event.id.to_string(),
            kind: event.kind.as_u16(),
            pubkey: event.pubkey.to_string(),
            created_at: event.created_at.as_secs(),
            content: event.content.clone(),
            tags,
            raw_json: event.as_json(),
        }
    }

    pub fn find_tag(&self, name: &str) -> Option<&NostrTag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Events carrying a bare `["-"]` tag must not be rebroadcast by others.
    pub fn is_protected(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.name == "-" && tag.values.is_empty())
    }

    pub fn is_replaceable(&self) -> bool {
        is_replaceable_kind(self.kind)
    }

    /// `kind:pubkey:d` address of this event; the identifier is empty for
    /// plain replaceable kinds.
    pub fn coordinate(&self) -> String {
        let identifier = tag_value(&self.tags, "d").unwrap_or_default();
        coordinate(self.kind, &self.pubkey, identifier)
    }
}

/// Replaceable (0, 3, 10000..20000) and addressable (30000..40000) kinds.
pub fn is_replaceable_kind(kind: u16) -> bool {
    kind == KIND_METADATA
        || kind == KIND_CONTACTS
        || (10_000..20_000).contains(&kind)
        || (30_000..40_000).contains(&kind)
}

pub fn is_comment_kind(kind: u16) -> bool {
    kind == KIND_COMMENT || kind == KIND_VOICE_COMMENT
}

pub fn coordinate(kind: u16, pubkey: &str, identifier: &str) -> String {
    format!("{}:{}:{}", kind, pubkey, identifier)
}

/// NIP-73 kind of an external content identifier, when it is recognised.
pub fn external_content_kind(content: &str) -> Option<&'static str> {
    const PREFIXES: [(&str, &str); 8] = [
        ("podcast:item:guid:", "podcast:item:guid"),
        ("podcast:publisher:guid:", "podcast:publisher:guid"),
        ("podcast:guid:", "podcast:guid"),
        ("isbn:", "isbn"),
        ("isan:", "isan"),
        ("doi:", "doi"),
        ("geo:", "geo"),
        ("#", "#"),
    ];

    if content.starts_with("http://") || content.starts_with("https://") {
        return Some("web");
    }
    PREFIXES
        .iter()
        .find(|(prefix, _)| content.starts_with(prefix))
        .map(|(_, kind)| *kind)
}

pub fn tag_value<'a>(tags: &'a [NostrTag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.name == name)
        .and_then(|tag| tag.values.first().map(|s| s.as_str()))
}

pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
