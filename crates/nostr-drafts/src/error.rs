use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("nostr client error: {0}")]
    NostrClient(#[from] nostr_sdk::client::Error),
    #[error("nostr key error: {0}")]
    NostrKey(#[from] nostr_sdk::nostr::key::Error),
    #[error("nostr event builder error: {0}")]
    NostrBuilder(#[from] nostr_sdk::nostr::event::builder::Error),
    #[error("nostr tag error: {0}")]
    NostrTag(#[from] nostr_sdk::nostr::event::tag::Error),
    #[error("invalid reference {value}: {reason}")]
    InvalidReference { value: String, reason: String },
    #[error("nip19 error: {0}")]
    Nip19(#[from] nostr_sdk::nostr::nips::nip19::Error),
    #[error("serde json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing env var: {0}")]
    MissingEnv(&'static str),
    #[error("invalid env var {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("tag has no name")]
    EmptyTag,
    #[error("unsupported nostr uri: {0}")]
    UnsupportedUri(String),
    #[error("publish quorum failed: required {required}, got {actual}")]
    Quorum { required: usize, actual: usize },
    #[error("mutex poisoned")]
    MutexPoisoned,
    #[error("operation timed out")]
    Timeout,
}
