use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use nostr_sdk::prelude::*;
use tracing::info;

use nostr_drafts::{
    Draft, DraftConfig, DraftPublisher, Drafter, NostrEvent, PollInput, PostOptions, Reaction,
    RelayConfig, RelayFetcher, RelayPublisher, ReplyTarget, SqliteEventIndex,
};

#[derive(Debug, Parser)]
#[command(name = "nostr-draft")]
#[command(about = "Draft Nostr events, print them as JSON, and optionally publish them")]
struct Args {
    /// Relays used for lookups and publishing. Falls back to NOSTR_RELAYS.
    #[arg(long)]
    relay: Vec<String>,
    /// Secret key (hex or nsec). Falls back to NOSTR_SECRET_KEY.
    #[arg(long)]
    key: Option<String>,
    /// SQLite event index used for relay hints.
    #[arg(long)]
    index: Option<PathBuf>,
    #[arg(long)]
    publish: bool,
    #[arg(long, default_value_t = 1)]
    min_acks: usize,
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Short text note, optionally replying to an event read from a JSON file.
    Note {
        content: String,
        #[arg(long)]
        reply_to: Option<PathBuf>,
        #[arg(long)]
        mention: Vec<String>,
        #[command(flatten)]
        markers: Markers,
    },
    /// Comment on an event file or an external URL.
    Comment {
        content: String,
        #[arg(long, conflicts_with = "url")]
        on: Option<PathBuf>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        mention: Vec<String>,
        #[command(flatten)]
        markers: Markers,
    },
    React {
        target: PathBuf,
        #[arg(long, default_value = "+")]
        content: String,
    },
    Repost {
        target: PathBuf,
    },
    Delete {
        target: PathBuf,
    },
    Report {
        target: PathBuf,
        #[arg(long)]
        reason: String,
    },
    Poll {
        question: String,
        #[arg(long = "option")]
        options: Vec<String>,
        #[arg(long)]
        multiple: bool,
        #[arg(long)]
        ends_at: Option<u64>,
        /// Relays for responses. Defaults to the author's read relays.
        #[arg(long = "poll-relay")]
        relays: Vec<String>,
        /// Poll author; defaults to the public key of --key.
        #[arg(long)]
        author: Option<String>,
        #[command(flatten)]
        markers: Markers,
    },
}

#[derive(Debug, clap::Args)]
struct Markers {
    #[arg(long)]
    client_tag: bool,
    #[arg(long)]
    protected: bool,
    #[arg(long)]
    nsfw: bool,
}

impl From<Markers> for PostOptions {
    fn from(markers: Markers) -> Self {
        PostOptions {
            add_client_tag: markers.client_tag,
            protected: markers.protected,
            nsfw: markers.nsfw,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut relay_config = if args.relay.is_empty() {
        RelayConfig::from_env()?
    } else {
        Some(RelayConfig::new(args.relay.clone()))
    };
    if let Some(config) = relay_config.as_mut() {
        config.min_acks = args.min_acks;
        config.timeout = Duration::from_secs(args.timeout_secs);
        if args.key.is_some() {
            config.secret_key = args.key.clone();
        }
    }

    let index = args
        .index
        .as_deref()
        .map(SqliteEventIndex::open)
        .transpose()?;

    let mut drafter = Drafter::new(DraftConfig::from_env()?);
    if let Some(config) = &relay_config {
        drafter = drafter.with_fetcher(Arc::new(RelayFetcher::new(config.clone()).await?));
    }
    if let Some(index) = &index {
        drafter = drafter.with_hints(Arc::new(index.clone()));
    }

    let index_ref = index.as_ref();
    let draft: Draft = match args.command {
        Command::Note {
            content,
            reply_to,
            mention,
            markers,
        } => {
            let parent = reply_to
                .map(|path| load_event(&path, index_ref).map(ReplyTarget::Event))
                .transpose()?;
            drafter
                .short_text_note(&content, &mention, parent.as_ref(), markers.into())
                .await
        }
        Command::Comment {
            content,
            on,
            url,
            mention,
            markers,
        } => {
            let target = match (on, url) {
                (Some(path), _) => ReplyTarget::Event(load_event(&path, index_ref)?),
                (None, Some(url)) => ReplyTarget::External(url),
                (None, None) => return Err("comment needs --on <event.json> or --url".into()),
            };
            drafter.comment(&content, &target, &mention, markers.into())
        }
        Command::React { target, content } => {
            let target = load_event(&target, index_ref)?;
            drafter.reaction(&target, &Reaction::Symbol(content))
        }
        Command::Repost { target } => drafter.repost(&load_event(&target, index_ref)?),
        Command::Delete { target } => drafter.deletion_request(&load_event(&target, index_ref)?),
        Command::Report { target, reason } => {
            drafter.report(&load_event(&target, index_ref)?, &reason)
        }
        Command::Poll {
            question,
            options,
            multiple,
            ends_at,
            relays,
            author,
            markers,
        } => {
            let author = author
                .or_else(|| {
                    relay_config
                        .as_ref()
                        .and_then(|config| config.keys().ok())
                        .map(|keys| keys.public_key().to_hex())
                })
                .unwrap_or_default();
            let poll = PollInput {
                options,
                multiple_choice: multiple,
                relays,
                ends_at,
            };
            drafter
                .poll(&author, &question, &[], &poll, markers.into())
                .await
        }
    };

    println!("{}", draft.to_json()?);

    if args.publish {
        let config = relay_config.ok_or("--publish needs --relay or NOSTR_RELAYS")?;
        let publisher = RelayPublisher::new(config).await?;
        let result = publisher.publish(&draft).await?;
        if let Some(index) = &index {
            index.record(&result.event, result.success.first().map(String::as_str))?;
        }
        info!(
            event_id = %result.event_id(),
            success = result.success.len(),
            failed = result.failed,
            "Published draft"
        );
    }

    Ok(())
}

/// Reads a signed event from a JSON file and remembers it in the index.
fn load_event(
    path: &Path,
    index: Option<&SqliteEventIndex>,
) -> Result<NostrEvent, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let event = NostrEvent::from_event(&Event::from_json(&json)?);
    if let Some(index) = index {
        index.record(&event, None)?;
    }
    Ok(event)
}
