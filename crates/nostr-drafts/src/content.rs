//! Free-text scanning: custom emoji, embedded quotes, hashtags and images.

use std::collections::HashSet;
use std::sync::LazyLock;

use nostr_sdk::prelude::*;
use regex::Regex;
use tracing::warn;

use crate::events::{coordinate, NostrTag};
use crate::services::{EmojiCatalog, HintLookup, MediaLookup};
use crate::tags::{emoji_tag, q_tag};
use crate::Error;

static EMOJI_SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[a-zA-Z0-9]+:").unwrap());

static EMBEDDED_EVENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"nostr:(note1[a-z0-9]{58}|nevent1[a-z0-9]+|naddr1[a-z0-9]+)").unwrap()
});

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#[\p{L}\p{N}\p{M}]+").unwrap());

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"']+\.(jpg|jpeg|png|gif|webp|heic)"#).unwrap()
});

/// Result of running the full content pipeline over user text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformedContent {
    pub content: String,
    pub emoji_tags: Vec<NostrTag>,
    pub quote_tags: Vec<NostrTag>,
    pub hashtags: Vec<String>,
    pub images: Vec<String>,
}

/// Target of an embedded `nostr:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteReference {
    Event {
        id: String,
        relay: Option<String>,
        author: Option<String>,
    },
    Coordinate {
        coordinate: String,
        relay: Option<String>,
    },
}

impl QuoteReference {
    /// Identity used for de-duplication: the event id or the coordinate.
    pub fn identity(&self) -> &str {
        match self {
            QuoteReference::Event { id, .. } => id,
            QuoteReference::Coordinate { coordinate, .. } => coordinate,
        }
    }
}

pub fn transform_content(
    text: &str,
    emojis: &dyn EmojiCatalog,
    hints: &dyn HintLookup,
) -> TransformedContent {
    let (content, emoji_tags) = transform_custom_emojis(text, emojis);
    let quote_tags = extract_quote_tags(&content, hints);
    let hashtags = extract_hashtags(&content);
    let images = extract_images(&content);
    TransformedContent {
        content,
        emoji_tags,
        quote_tags,
        hashtags,
        images,
    }
}

/// Rewrites resolvable `:shortcode:` tokens to the catalog's canonical
/// shortcode and returns one `emoji` tag per distinct resolved token.
pub fn transform_custom_emojis(text: &str, emojis: &dyn EmojiCatalog) -> (String, Vec<NostrTag>) {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    let mut content = text.to_string();

    for token in EMOJI_SHORTCODE.find_iter(text).map(|m| m.as_str()) {
        if !seen.insert(token) {
            continue;
        }
        let shortcode = &token[1..token.len() - 1];
        if let Some(emoji) = emojis.emoji(shortcode) {
            tags.push(emoji_tag(&emoji));
            content = content.replace(token, &format!(":{}:", emoji.shortcode));
        }
    }

    (content, tags)
}

/// Decodes a bech32 `note`, `nevent` or `naddr` entity.
pub fn decode_quote(entity: &str) -> Result<QuoteReference, Error> {
    match Nip19::from_bech32(entity)? {
        Nip19::EventId(id) => Ok(QuoteReference::Event {
            id: id.to_hex(),
            relay: None,
            author: None,
        }),
        Nip19::Event(event) => Ok(QuoteReference::Event {
            id: event.event_id.to_hex(),
            relay: event.relays.first().map(|relay| relay.to_string()),
            author: event.author.map(|author| author.to_hex()),
        }),
        Nip19::Coordinate(naddr) => Ok(QuoteReference::Coordinate {
            coordinate: coordinate(
                naddr.coordinate.kind.as_u16(),
                &naddr.coordinate.public_key.to_hex(),
                &naddr.coordinate.identifier,
            ),
            relay: naddr.relays.first().map(|relay| relay.to_string()),
        }),
        _ => Err(Error::UnsupportedUri(entity.to_string())),
    }
}

/// One `q` tag per distinct embedded event or coordinate, in source order.
/// Undecodable URIs are logged and skipped.
pub fn extract_quote_tags(content: &str, hints: &dyn HintLookup) -> Vec<NostrTag> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for captures in EMBEDDED_EVENT.captures_iter(content) {
        let entity = &captures[1];
        let reference = match decode_quote(entity) {
            Ok(reference) => reference,
            Err(err) => {
                warn!(entity = %entity, error = %err, "Skipping undecodable nostr uri");
                continue;
            }
        };
        if !seen.insert(reference.identity().to_string()) {
            continue;
        }

        let tag = match reference {
            QuoteReference::Event { id, relay, author } => {
                let relay = relay.or_else(|| hints.event_hint(&id));
                q_tag(&id, relay.as_deref(), author.as_deref())
            }
            QuoteReference::Coordinate { coordinate, relay } => {
                q_tag(&coordinate, relay.as_deref(), None)
            }
        };
        tags.push(tag);
    }

    tags
}

/// Lowercased hashtags in source order. Repeats are kept.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    HASHTAG
        .find_iter(content)
        .map(|m| m.as_str()[1..].to_lowercase())
        .filter(|hashtag| !hashtag.is_empty())
        .collect()
}

pub fn extract_images(content: &str) -> Vec<String> {
    IMAGE_URL
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `imeta` tags for the images that have a known media description.
pub fn imeta_tags(images: &[String], media: &dyn MediaLookup) -> Vec<NostrTag> {
    images.iter().filter_map(|url| media.imeta_tag(url)).collect()
}
