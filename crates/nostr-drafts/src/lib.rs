//! Unsigned Nostr event drafting and tag resolution.
//!
//! This crate turns user intent (react to this, reply to that, publish a
//! poll) into unsigned event drafts whose tags follow the NIP conventions
//! for threading, quoting, mentions, and custom emoji. Drafts are plain
//! data; signing and publishing happen at the edges.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        NOSTR-DRAFTS                              │
//! │                                                                  │
//! │  ┌─────────────────────┐       ┌─────────────────────┐          │
//! │  │      Drafter        │──────▶│     DraftCache      │          │
//! │  │  (one assembler     │       │  (stable created_at │          │
//! │  │   per kind)         │       │   per draft)        │          │
//! │  └──────────┬──────────┘       └─────────────────────┘          │
//! │             │                                                    │
//! │   content / thread / tags                                        │
//! │             │                                                    │
//! │             ▼                                                    │
//! │  EventFetcher   HintLookup   EmojiCatalog   MediaLookup          │
//! │  (RelayFetcher) (SqliteEventIndex)                               │
//! │                                                                  │
//! │  Draft ──▶ DraftPublisher (RelayPublisher) ──▶ Nostr Relays      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Drafted Kinds
//!
//! | Kind | Constant | Purpose | Cached |
//! |------|----------|---------|--------|
//! | 1 | `KIND_SHORT_TEXT_NOTE` | Note or threaded reply | yes |
//! | 6 / 16 | `KIND_REPOST` / `KIND_GENERIC_REPOST` | Repost | no |
//! | 7 / 17 | `KIND_REACTION` / `KIND_EXTERNAL_CONTENT_REACTION` | Reaction | no |
//! | 1068 / 1018 | `KIND_POLL` / `KIND_POLL_RESPONSE` | Poll and vote | poll only |
//! | 1111 | `KIND_COMMENT` | Comment on any event or URL | yes |
//! | 9802 | `KIND_HIGHLIGHT` | Highlight | yes |
//! | 5 / 1984 | `KIND_EVENT_DELETION` / `KIND_REPORT` | Moderation | no |
//! | 10000..=10063, 30002 | lists | Mute, pin, relay, bookmark, emoji, server lists | no |
//! | 28934 / 28936 | `KIND_GROUP_JOIN_REQUEST` / `KIND_GROUP_LEAVE_REQUEST` | Relay membership | no |
//!
//! Cached drafts keep their `created_at` for as long as kind, content, and
//! tags are unchanged, so re-rendering a composer does not mint a new event.
//!
//! # Example: Drafting a reply
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nostr_drafts::{DraftConfig, Drafter, PostOptions, RelayConfig, RelayFetcher, ReplyTarget};
//!
//! let relays = RelayConfig::new(vec!["wss://relay.damus.io".to_string()]);
//! let fetcher = RelayFetcher::new(relays).await?;
//! let drafter = Drafter::new(DraftConfig::from_env()?).with_fetcher(Arc::new(fetcher));
//!
//! let parent = ReplyTarget::Event(parent_event);
//! let draft = drafter
//!     .short_text_note("gm #nostr", &[], Some(&parent), PostOptions::default())
//!     .await;
//! println!("{}", draft.to_json()?);
//! ```
//!
//! # Example: Publishing
//!
//! ```rust,ignore
//! use nostr_drafts::{DraftPublisher, RelayConfig, RelayPublisher};
//!
//! let config = RelayConfig::from_env()?.expect("NOSTR_RELAYS");
//! let publisher = RelayPublisher::new(config).await?;
//! let result = publisher.publish(&draft).await?;
//! ```
//!
//! # Traits
//!
//! - [`EventFetcher`] - Look up events and relay lists on the network
//! - [`HintLookup`] - Local relay hints and cached replaceable events
//! - [`EmojiCatalog`] / [`MediaLookup`] - Custom emoji and `imeta` metadata
//! - [`DraftPublisher`] - Sign and send a finished draft

mod assemble;
mod cache;
mod config;
mod content;
mod draft;
mod error;
mod events;
mod fetch;
mod index;
mod publish;
mod services;
pub mod tags;
mod thread;

pub use assemble::{
    DraftRequest, Drafter, MailboxRelay, PollInput, PostOptions, Reaction, RelaySet,
    RelaySetRef, NOTIFICATIONS_SEEN_AT_KEY,
};
pub use cache::{cache_key, DraftCache};
pub use config::{parse_relays, DraftConfig, RelayConfig};
pub use content::{
    decode_quote, extract_hashtags, extract_images, extract_quote_tags, imeta_tags,
    transform_content, transform_custom_emojis, QuoteReference, TransformedContent,
};
pub use draft::Draft;
pub use error::Error;
pub use events::{
    coordinate, external_content_kind, is_comment_kind, is_replaceable_kind, tag_value,
    unix_timestamp, NostrEvent, NostrTag, KIND_APPLICATION_DATA, KIND_BLOSSOM_SERVER_LIST,
    KIND_BOOKMARK_LIST, KIND_COMMENT, KIND_CONTACTS, KIND_EVENT_DELETION,
    KIND_EXTERNAL_CONTENT_REACTION, KIND_FAVORITE_RELAYS, KIND_GENERIC_REPOST,
    KIND_GROUP_JOIN_REQUEST, KIND_GROUP_LEAVE_REQUEST, KIND_HIGHLIGHT, KIND_METADATA,
    KIND_MUTE_LIST, KIND_PIN_LIST, KIND_POLL, KIND_POLL_RESPONSE, KIND_REACTION,
    KIND_RELAY_LIST, KIND_RELAY_REVIEW, KIND_RELAY_SET, KIND_REPORT, KIND_REPOST,
    KIND_SHORT_TEXT_NOTE, KIND_USER_EMOJI_LIST, KIND_VOICE_COMMENT,
};
pub use fetch::RelayFetcher;
pub use index::SqliteEventIndex;
pub use publish::{DraftPublisher, PublishResult, RelayPublisher};
pub use services::{
    Emoji, EmojiCatalog, EventFetcher, HintLookup, MediaLookup, NoopServices, RelayList,
};
pub use tags::{Marker, RelayScope};
pub use thread::{
    comment_parent_tags, resolve_comment, resolve_reply, root_tag, CommentLineage,
    ReplyLineage, ReplyTarget, RootTag,
};

/// Crate version, as recorded in Cargo.toml.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
