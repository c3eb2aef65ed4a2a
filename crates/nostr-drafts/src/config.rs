use std::env;
use std::time::Duration;

use nostr_sdk::prelude::*;

use crate::Error;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MIN_ACKS: usize = 1;
const DEFAULT_CLIENT_TAG: &str = "marked";
const DEFAULT_POLL_RELAY_LIMIT: usize = 4;
const DEFAULT_POLL_OPTION_ID_LEN: usize = 9;

/// Knobs for the drafting engine itself.
#[derive(Debug, Clone)]
pub struct DraftConfig {
    /// Upper bound for the thread-root and relay-list lookups.
    pub fetch_timeout: Duration,
    /// Value written into `["client", ...]` when a draft asks for it.
    pub client_tag: String,
    /// Read relays taken from the author's relay list when a poll names none.
    pub poll_relay_limit: usize,
    pub poll_option_id_len: usize,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            client_tag: DEFAULT_CLIENT_TAG.to_string(),
            poll_relay_limit: DEFAULT_POLL_RELAY_LIMIT,
            poll_option_id_len: DEFAULT_POLL_OPTION_ID_LEN,
        }
    }
}

impl DraftConfig {
    /// Reads overrides from the environment:
    ///
    /// - `NOSTR_DRAFT_FETCH_TIMEOUT_SECS` (default 5)
    /// - `NOSTR_DRAFT_CLIENT_TAG` (default `marked`)
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        if let Ok(value) = env::var("NOSTR_DRAFT_FETCH_TIMEOUT_SECS") {
            let secs = value.trim().parse().map_err(|_| Error::InvalidEnv {
                name: "NOSTR_DRAFT_FETCH_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            config.fetch_timeout = Duration::from_secs(secs);
        }

        if let Ok(value) = env::var("NOSTR_DRAFT_CLIENT_TAG") {
            if !value.trim().is_empty() {
                config.client_tag = value.trim().to_string();
            }
        }

        Ok(config)
    }
}

/// Relay connection settings shared by the fetcher and the publisher.
#[derive(Clone)]
pub struct RelayConfig {
    pub relays: Vec<String>,
    pub secret_key: Option<String>,
    pub min_acks: usize,
    pub timeout: Duration,
}

impl RelayConfig {
    pub fn new(relays: Vec<String>) -> Self {
        Self {
            relays,
            secret_key: None,
            min_acks: DEFAULT_MIN_ACKS,
            timeout: Duration::from_secs(DEFAULT_RELAY_TIMEOUT_SECS),
        }
    }

    /// `NOSTR_RELAYS` (comma or whitespace separated) and optional
    /// `NOSTR_SECRET_KEY`. Returns `None` when no relays are configured.
    pub fn from_env() -> Result<Option<Self>, Error> {
        let relays = match env::var("NOSTR_RELAYS") {
            Ok(value) => parse_relays(&value),
            Err(_) => Vec::new(),
        };
        if relays.is_empty() {
            return Ok(None);
        }

        let mut config = Self::new(relays);
        config.secret_key = env::var("NOSTR_SECRET_KEY").ok();
        Ok(Some(config))
    }

    pub fn keys(&self) -> Result<Keys, Error> {
        let secret = self
            .secret_key
            .as_deref()
            .ok_or(Error::MissingEnv("NOSTR_SECRET_KEY"))?;
        Ok(Keys::parse(secret)?)
    }
}

pub fn parse_relays(value: &str) -> Vec<String> {
    value
        .split(',')
        .flat_map(|chunk| chunk.split_whitespace())
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
