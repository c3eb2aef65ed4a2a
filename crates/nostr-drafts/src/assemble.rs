//! One assembler per interaction kind.
//!
//! [`Drafter`] owns the collaborators and the session's [`DraftCache`].
//! Drafting never fails: unresolved references only degrade the tags.

use std::collections::HashSet;
use std::sync::Arc;

use rand_core::{OsRng, RngCore};
use tracing::{debug, warn};

use crate::cache::DraftCache;
use crate::config::DraftConfig;
use crate::content::{
    extract_hashtags, extract_images, extract_quote_tags, imeta_tags, transform_content,
    transform_custom_emojis,
};
use crate::draft::Draft;
use crate::events::{
    external_content_kind, unix_timestamp, NostrEvent, NostrTag, KIND_APPLICATION_DATA,
    KIND_BLOSSOM_SERVER_LIST, KIND_BOOKMARK_LIST, KIND_COMMENT, KIND_CONTACTS,
    KIND_EVENT_DELETION, KIND_EXTERNAL_CONTENT_REACTION, KIND_FAVORITE_RELAYS,
    KIND_GENERIC_REPOST, KIND_GROUP_JOIN_REQUEST, KIND_GROUP_LEAVE_REQUEST, KIND_HIGHLIGHT,
    KIND_METADATA, KIND_MUTE_LIST, KIND_PIN_LIST, KIND_POLL, KIND_POLL_RESPONSE,
    KIND_REACTION, KIND_RELAY_LIST, KIND_RELAY_REVIEW, KIND_RELAY_SET, KIND_REPORT,
    KIND_REPOST, KIND_SHORT_TEXT_NOTE, KIND_USER_EMOJI_LIST,
};
use crate::services::{Emoji, EmojiCatalog, EventFetcher, HintLookup, MediaLookup, NoopServices};
use crate::tags::{
    a_tag, claim_tag, client_tag, comment_tag, d_tag, e_tag, emoji_tag, ends_at_tag, i_tag,
    k_tag, nsfw_tag, option_tag, p_tag, p_tag_with_role, poll_type_tag, protected_tag,
    r_tag, rating_tag, reference_tag, relay_tag, report_tag, response_tag, server_tag,
    source_tag, t_tag, title_tag, RelayScope,
};
use crate::thread::{comment_parent_tags, resolve_comment, resolve_reply, ReplyTarget};

pub const NOTIFICATIONS_SEEN_AT_KEY: &str = "seen_notifications_at";
const NOTIFICATIONS_SEEN_AT_CONTENT: &str =
    "Records read time to sync notification status across devices.";
const DELETION_REQUEST_CONTENT: &str = "Request for deletion of the event.";

const OPTION_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const OPTION_ID_BYTE_LIMIT: usize = 256 - 256 % OPTION_ID_ALPHABET.len();
const OPTION_ID_MAX_MISSES: usize = 16;

/// Marker tags appended to user-authored drafts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostOptions {
    pub add_client_tag: bool,
    pub protected: bool,
    pub nsfw: bool,
}

/// Reaction content: a literal symbol such as `+`, or a custom emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    Symbol(String),
    Emoji(Emoji),
}

impl Default for Reaction {
    fn default() -> Self {
        Reaction::Symbol("+".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollInput {
    pub options: Vec<String>,
    pub multiple_choice: bool,
    /// Relays voters should publish responses to. Empty means "use the
    /// author's read relays".
    pub relays: Vec<String>,
    pub ends_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySet {
    pub id: String,
    pub name: String,
    pub relay_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxRelay {
    pub url: String,
    pub scope: RelayScope,
}

/// Favorite relay sets, either as the set events or as ready `a` tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaySetRef {
    Event(NostrEvent),
    Tag(NostrTag),
}

/// Every draft the engine can build, dispatched by [`Drafter::draft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftRequest {
    Reaction {
        target: NostrEvent,
        reaction: Reaction,
    },
    ExternalContentReaction {
        content: String,
        reaction: Reaction,
    },
    Repost {
        target: NostrEvent,
    },
    ShortTextNote {
        content: String,
        mentions: Vec<String>,
        parent: Option<ReplyTarget>,
        options: PostOptions,
    },
    Comment {
        content: String,
        target: ReplyTarget,
        mentions: Vec<String>,
        options: PostOptions,
    },
    Highlight {
        text: String,
        comment: String,
        source: NostrEvent,
        mentions: Vec<String>,
        options: PostOptions,
    },
    Poll {
        author: String,
        question: String,
        mentions: Vec<String>,
        poll: PollInput,
        options: PostOptions,
    },
    PollResponse {
        poll: NostrEvent,
        selected: Vec<String>,
    },
    RelaySet(RelaySet),
    RelayList(Vec<MailboxRelay>),
    FollowList {
        tags: Vec<NostrTag>,
        content: String,
    },
    MuteList {
        tags: Vec<NostrTag>,
        content: String,
    },
    Profile {
        content: String,
        tags: Vec<NostrTag>,
    },
    FavoriteRelays {
        relays: Vec<String>,
        sets: Vec<RelaySetRef>,
    },
    SeenNotificationsAt,
    BookmarkList {
        tags: Vec<NostrTag>,
        content: String,
    },
    PinList {
        tags: Vec<NostrTag>,
        content: String,
    },
    UserEmojiList {
        tags: Vec<NostrTag>,
        content: String,
    },
    BlossomServerList(Vec<String>),
    DeletionRequest {
        target: NostrEvent,
    },
    Report {
        target: NostrEvent,
        reason: String,
    },
    RelayReview {
        relay: String,
        review: String,
        stars: u8,
    },
    GroupJoin {
        invite_code: String,
    },
    GroupLeave,
}

#[derive(Clone)]
pub struct Drafter {
    config: DraftConfig,
    cache: DraftCache,
    fetcher: Arc<dyn EventFetcher>,
    hints: Arc<dyn HintLookup>,
    emojis: Arc<dyn EmojiCatalog>,
    media: Arc<dyn MediaLookup>,
}

impl Default for Drafter {
    fn default() -> Self {
        Self::new(DraftConfig::default())
    }
}

impl Drafter {
    /// A drafter whose collaborators all answer "absent".
    pub fn new(config: DraftConfig) -> Self {
        Self {
            config,
            cache: DraftCache::new(),
            fetcher: Arc::new(NoopServices),
            hints: Arc::new(NoopServices),
            emojis: Arc::new(NoopServices),
            media: Arc::new(NoopServices),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn EventFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_hints(mut self, hints: Arc<dyn HintLookup>) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_emojis(mut self, emojis: Arc<dyn EmojiCatalog>) -> Self {
        self.emojis = emojis;
        self
    }

    pub fn with_media(mut self, media: Arc<dyn MediaLookup>) -> Self {
        self.media = media;
        self
    }

    pub fn with_cache(mut self, cache: DraftCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &DraftConfig {
        &self.config
    }

    pub fn cache(&self) -> &DraftCache {
        &self.cache
    }

    /// Forgets a cached draft so the next identical build gets a new timestamp.
    pub fn invalidate(&self, draft: &Draft) -> bool {
        self.cache.invalidate(draft)
    }

    pub async fn draft(&self, request: DraftRequest) -> Draft {
        match request {
            DraftRequest::Reaction { target, reaction } => self.reaction(&target, &reaction),
            DraftRequest::ExternalContentReaction { content, reaction } => {
                self.external_content_reaction(&content, &reaction)
            }
            DraftRequest::Repost { target } => self.repost(&target),
            DraftRequest::ShortTextNote {
                content,
                mentions,
                parent,
                options,
            } => {
                self.short_text_note(&content, &mentions, parent.as_ref(), options)
                    .await
            }
            DraftRequest::Comment {
                content,
                target,
                mentions,
                options,
            } => self.comment(&content, &target, &mentions, options),
            DraftRequest::Highlight {
                text,
                comment,
                source,
                mentions,
                options,
            } => self.highlight(&text, &comment, &source, &mentions, options),
            DraftRequest::Poll {
                author,
                question,
                mentions,
                poll,
                options,
            } => self.poll(&author, &question, &mentions, &poll, options).await,
            DraftRequest::PollResponse { poll, selected } => self.poll_response(&poll, &selected),
            DraftRequest::RelaySet(set) => self.relay_set(&set),
            DraftRequest::RelayList(relays) => self.relay_list(&relays),
            DraftRequest::FollowList { tags, content } => self.follow_list(tags, content),
            DraftRequest::MuteList { tags, content } => self.mute_list(tags, content),
            DraftRequest::Profile { content, tags } => self.profile(content, tags),
            DraftRequest::FavoriteRelays { relays, sets } => self.favorite_relays(&relays, &sets),
            DraftRequest::SeenNotificationsAt => self.seen_notifications_at(),
            DraftRequest::BookmarkList { tags, content } => self.bookmark_list(tags, content),
            DraftRequest::PinList { tags, content } => self.pin_list(tags, content),
            DraftRequest::UserEmojiList { tags, content } => self.user_emoji_list(tags, content),
            DraftRequest::BlossomServerList(servers) => self.blossom_server_list(&servers),
            DraftRequest::DeletionRequest { target } => self.deletion_request(&target),
            DraftRequest::Report { target, reason } => self.report(&target, &reason),
            DraftRequest::RelayReview {
                relay,
                review,
                stars,
            } => self.relay_review(&relay, &review, stars),
            DraftRequest::GroupJoin { invite_code } => self.group_join(&invite_code),
            DraftRequest::GroupLeave => self.group_leave(),
        }
    }

    // NIP-25
    pub fn reaction(&self, target: &NostrEvent, reaction: &Reaction) -> Draft {
        let hints = self.hints.as_ref();
        let mut tags = vec![
            e_tag(hints, &target.event_id, &target.pubkey, "", false),
            p_tag(&target.pubkey, false),
        ];
        if target.kind != KIND_SHORT_TEXT_NOTE {
            tags.push(k_tag(target.kind, false));
        }
        if target.is_replaceable() {
            tags.push(a_tag(hints, target, false));
        }

        let content = reaction_content(reaction, &mut tags);
        Draft::new(KIND_REACTION, content, tags, unix_timestamp())
    }

    pub fn external_content_reaction(&self, external: &str, reaction: &Reaction) -> Draft {
        let mut tags = vec![i_tag(external, false)];
        if let Some(kind) = external_content_kind(external) {
            tags.push(k_tag(kind, false));
        }

        let content = reaction_content(reaction, &mut tags);
        Draft::new(KIND_EXTERNAL_CONTENT_REACTION, content, tags, unix_timestamp())
    }

    // NIP-18
    pub fn repost(&self, target: &NostrEvent) -> Draft {
        let hints = self.hints.as_ref();
        let protected = target.is_protected();
        let mut tags = vec![
            e_tag(hints, &target.event_id, &target.pubkey, "", false),
            p_tag(&target.pubkey, false),
        ];

        if target.kind == KIND_SHORT_TEXT_NOTE {
            let content = if protected {
                String::new()
            } else {
                target.raw_json.clone()
            };
            return Draft::new(KIND_REPOST, content, tags, unix_timestamp());
        }

        tags.push(k_tag(target.kind, false));
        let replaceable = target.is_replaceable();
        if replaceable {
            tags.push(a_tag(hints, target, false));
        }

        let content = if protected || replaceable {
            String::new()
        } else {
            target.raw_json.clone()
        };
        Draft::new(KIND_GENERIC_REPOST, content, tags, unix_timestamp())
    }

    pub async fn short_text_note(
        &self,
        content: &str,
        mentions: &[String],
        parent: Option<&ReplyTarget>,
        options: PostOptions,
    ) -> Draft {
        let transformed = transform_content(content, self.emojis.as_ref(), self.hints.as_ref());
        let lineage = resolve_reply(
            parent,
            self.hints.as_ref(),
            self.fetcher.as_ref(),
            self.config.fetch_timeout,
        )
        .await;

        let mut tags = transformed.emoji_tags;
        tags.extend(transformed.hashtags.iter().map(|hashtag| t_tag(hashtag)));
        tags.extend(imeta_tags(&transformed.images, self.media.as_ref()));
        tags.extend(transformed.quote_tags);
        tags.extend(lineage.into_tags());
        tags.extend(mentions.iter().map(|pubkey| p_tag(pubkey, false)));
        self.push_post_markers(&mut tags, options);

        self.cache
            .get_or_create(KIND_SHORT_TEXT_NOTE, transformed.content, tags)
    }

    // NIP-22
    pub fn comment(
        &self,
        content: &str,
        target: &ReplyTarget,
        mentions: &[String],
        options: PostOptions,
    ) -> Draft {
        let hints = self.hints.as_ref();
        let transformed = transform_content(content, self.emojis.as_ref(), hints);
        let lineage = resolve_comment(target, hints);
        let parent_pubkey = match target {
            ReplyTarget::Event(parent) => Some(parent.pubkey.as_str()),
            ReplyTarget::External(_) => None,
        };

        let mut tags = transformed.emoji_tags;
        tags.extend(transformed.hashtags.iter().map(|hashtag| t_tag(hashtag)));
        tags.extend(transformed.quote_tags);
        tags.extend(imeta_tags(&transformed.images, self.media.as_ref()));
        tags.extend(
            mentions
                .iter()
                .filter(|pubkey| Some(pubkey.as_str()) != parent_pubkey)
                .map(|pubkey| p_tag(pubkey, false)),
        );
        tags.extend(lineage.root_tags(hints));
        tags.extend(comment_parent_tags(target, &lineage, hints));
        self.push_post_markers(&mut tags, options);

        self.cache.get_or_create(KIND_COMMENT, transformed.content, tags)
    }

    // NIP-84
    pub fn highlight(
        &self,
        text: &str,
        comment: &str,
        source: &NostrEvent,
        mentions: &[String],
        options: PostOptions,
    ) -> Draft {
        let hints = self.hints.as_ref();
        let (comment_content, emoji_tags) = transform_custom_emojis(comment, self.emojis.as_ref());
        let quote_tags = extract_quote_tags(comment, hints);

        let mut tags = emoji_tags;
        tags.extend(
            extract_hashtags(&comment_content)
                .iter()
                .map(|hashtag| t_tag(hashtag)),
        );
        tags.extend(imeta_tags(
            &extract_images(&comment_content),
            self.media.as_ref(),
        ));
        tags.extend(quote_tags);
        tags.extend(
            mentions
                .iter()
                .filter(|pubkey| **pubkey != source.pubkey)
                .map(|pubkey| p_tag_with_role(pubkey, "mention")),
        );
        if !comment_content.is_empty() {
            tags.push(comment_tag(&comment_content));
        }
        tags.push(source_tag(hints, source));
        tags.push(p_tag_with_role(&source.pubkey, "author"));
        self.push_post_markers(&mut tags, options);

        self.cache.get_or_create(KIND_HIGHLIGHT, text.to_string(), tags)
    }

    /// NIP-88 poll. Only the client and NSFW markers of `options` apply;
    /// `protected` is ignored and polls never carry a `["-"]` tag.
    pub async fn poll(
        &self,
        author: &str,
        question: &str,
        mentions: &[String],
        poll: &PollInput,
        options: PostOptions,
    ) -> Draft {
        let transformed = transform_content(question, self.emojis.as_ref(), self.hints.as_ref());

        let mut tags = transformed.emoji_tags;
        tags.extend(transformed.hashtags.iter().map(|hashtag| t_tag(hashtag)));
        tags.extend(imeta_tags(&transformed.images, self.media.as_ref()));
        tags.extend(transformed.quote_tags);
        tags.extend(mentions.iter().map(|pubkey| p_tag(pubkey, false)));

        let labels: Vec<&str> = poll
            .options
            .iter()
            .map(|option| option.trim())
            .filter(|option| !option.is_empty())
            .collect();
        let ids = option_ids(labels.len(), self.config.poll_option_id_len);
        tags.extend(
            ids.iter()
                .zip(&labels)
                .map(|(id, label)| option_tag(id, label)),
        );
        tags.push(poll_type_tag(poll.multiple_choice));
        if let Some(ends_at) = poll.ends_at {
            tags.push(ends_at_tag(ends_at));
        }

        let relays = if poll.relays.is_empty() {
            self.default_poll_relays(author).await
        } else {
            poll.relays.clone()
        };
        tags.extend(relays.iter().map(|relay| relay_tag(relay)));

        if options.add_client_tag {
            tags.push(client_tag(&self.config.client_tag));
        }
        if options.nsfw {
            tags.push(nsfw_tag());
        }

        self.cache
            .get_or_create(KIND_POLL, transformed.content.trim().to_string(), tags)
    }

    async fn default_poll_relays(&self, author: &str) -> Vec<String> {
        let fetch = self.fetcher.fetch_relay_list(author);
        let read = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(list)) => list.read,
            Ok(Err(err)) => {
                warn!(author = %author, error = %err, "Failed to fetch relay list for poll");
                Vec::new()
            }
            Err(_) => {
                warn!(author = %author, "Timed out fetching relay list for poll");
                Vec::new()
            }
        };
        debug!(author = %author, relays = read.len(), "Using author read relays for poll");
        read.into_iter().take(self.config.poll_relay_limit).collect()
    }

    pub fn poll_response(&self, poll: &NostrEvent, selected: &[String]) -> Draft {
        let mut tags = vec![
            e_tag(self.hints.as_ref(), &poll.event_id, &poll.pubkey, "", false),
            p_tag(&poll.pubkey, false),
        ];
        tags.extend(selected.iter().map(|id| response_tag(id)));
        Draft::new(KIND_POLL_RESPONSE, "", tags, unix_timestamp())
    }

    // NIP-51
    pub fn relay_set(&self, set: &RelaySet) -> Draft {
        let mut tags = vec![d_tag(&set.id), title_tag(&set.name)];
        tags.extend(set.relay_urls.iter().map(|url| relay_tag(url)));
        Draft::new(KIND_RELAY_SET, "", tags, unix_timestamp())
    }

    // NIP-65
    pub fn relay_list(&self, relays: &[MailboxRelay]) -> Draft {
        let tags = relays
            .iter()
            .map(|relay| r_tag(&relay.url, relay.scope))
            .collect();
        Draft::new(KIND_RELAY_LIST, "", tags, unix_timestamp())
    }

    pub fn follow_list(&self, tags: Vec<NostrTag>, content: String) -> Draft {
        Draft::new(KIND_CONTACTS, content, tags, unix_timestamp())
    }

    pub fn mute_list(&self, tags: Vec<NostrTag>, content: String) -> Draft {
        Draft::new(KIND_MUTE_LIST, content, tags, unix_timestamp())
    }

    pub fn profile(&self, content: String, tags: Vec<NostrTag>) -> Draft {
        Draft::new(KIND_METADATA, content, tags, unix_timestamp())
    }

    pub fn favorite_relays(&self, relays: &[String], sets: &[RelaySetRef]) -> Draft {
        let mut tags: Vec<NostrTag> = relays.iter().map(|url| relay_tag(url)).collect();
        tags.extend(sets.iter().map(|set| match set {
            RelaySetRef::Event(event) => a_tag(self.hints.as_ref(), event, false),
            RelaySetRef::Tag(tag) => tag.clone(),
        }));
        Draft::new(KIND_FAVORITE_RELAYS, "", tags, unix_timestamp())
    }

    pub fn seen_notifications_at(&self) -> Draft {
        Draft::new(
            KIND_APPLICATION_DATA,
            NOTIFICATIONS_SEEN_AT_CONTENT,
            vec![d_tag(NOTIFICATIONS_SEEN_AT_KEY)],
            unix_timestamp(),
        )
    }

    pub fn bookmark_list(&self, tags: Vec<NostrTag>, content: String) -> Draft {
        Draft::new(KIND_BOOKMARK_LIST, content, tags, unix_timestamp())
    }

    pub fn pin_list(&self, tags: Vec<NostrTag>, content: String) -> Draft {
        Draft::new(KIND_PIN_LIST, content, tags, unix_timestamp())
    }

    pub fn user_emoji_list(&self, tags: Vec<NostrTag>, content: String) -> Draft {
        Draft::new(KIND_USER_EMOJI_LIST, content, tags, unix_timestamp())
    }

    pub fn blossom_server_list(&self, servers: &[String]) -> Draft {
        let tags = servers.iter().map(|server| server_tag(server)).collect();
        Draft::new(KIND_BLOSSOM_SERVER_LIST, "", tags, unix_timestamp())
    }

    // NIP-09
    pub fn deletion_request(&self, target: &NostrEvent) -> Draft {
        let mut tags = vec![k_tag(target.kind, false)];
        if target.is_replaceable() {
            tags.push(reference_tag("a", &target.coordinate()));
        } else {
            tags.push(reference_tag("e", &target.event_id));
        }
        Draft::new(
            KIND_EVENT_DELETION,
            DELETION_REQUEST_CONTENT,
            tags,
            unix_timestamp(),
        )
    }

    // NIP-56
    pub fn report(&self, target: &NostrEvent, reason: &str) -> Draft {
        let tags = if target.kind == KIND_METADATA {
            vec![report_tag("p", &target.pubkey, reason)]
        } else {
            let mut tags = vec![
                p_tag(&target.pubkey, false),
                report_tag("e", &target.event_id, reason),
            ];
            if target.is_replaceable() {
                tags.push(report_tag("a", &target.coordinate(), reason));
            }
            tags
        };
        Draft::new(KIND_REPORT, "", tags, unix_timestamp())
    }

    pub fn relay_review(&self, relay: &str, review: &str, stars: u8) -> Draft {
        Draft::new(
            KIND_RELAY_REVIEW,
            review,
            vec![d_tag(relay), rating_tag(stars)],
            unix_timestamp(),
        )
    }

    // NIP-43. Membership requests carry wall-clock intent and are never cached.
    pub fn group_join(&self, invite_code: &str) -> Draft {
        Draft::new(
            KIND_GROUP_JOIN_REQUEST,
            "",
            vec![claim_tag(invite_code), protected_tag()],
            unix_timestamp(),
        )
    }

    pub fn group_leave(&self) -> Draft {
        Draft::new(
            KIND_GROUP_LEAVE_REQUEST,
            "",
            vec![protected_tag()],
            unix_timestamp(),
        )
    }

    fn push_post_markers(&self, tags: &mut Vec<NostrTag>, options: PostOptions) {
        if options.add_client_tag {
            tags.push(client_tag(&self.config.client_tag));
        }
        if options.nsfw {
            tags.push(nsfw_tag());
        }
        if options.protected {
            tags.push(protected_tag());
        }
    }
}

fn reaction_content(reaction: &Reaction, tags: &mut Vec<NostrTag>) -> String {
    match reaction {
        Reaction::Symbol(symbol) => symbol.clone(),
        Reaction::Emoji(emoji) => {
            tags.push(emoji_tag(emoji));
            format!(":{}:", emoji.shortcode)
        }
    }
}

/// `count` distinct random alphanumeric identifiers, at least one character
/// long. After repeated collisions the length grows by one, so short
/// configured lengths still yield enough distinct ids.
fn option_ids(count: usize, len: usize) -> Vec<String> {
    let mut len = len.max(1);
    let mut seen = HashSet::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    let mut misses = 0;
    while ids.len() < count {
        let id = random_id(len);
        if seen.insert(id.clone()) {
            ids.push(id);
            misses = 0;
            continue;
        }
        misses += 1;
        if misses >= OPTION_ID_MAX_MISSES {
            debug!(len, "Poll option id space exhausted, lengthening ids");
            len += 1;
            misses = 0;
        }
    }
    ids
}

/// Draws characters by rejection sampling: bytes at or above
/// `OPTION_ID_BYTE_LIMIT` are discarded so every character is equally likely.
fn random_id(len: usize) -> String {
    let mut id = String::with_capacity(len);
    let mut bytes = [0u8; 32];
    while id.len() < len {
        OsRng.fill_bytes(&mut bytes);
        let wanted = len - id.len();
        id.extend(
            bytes
                .iter()
                .map(|byte| usize::from(*byte))
                .filter(|byte| *byte < OPTION_ID_BYTE_LIMIT)
                .take(wanted)
                .map(|byte| OPTION_ID_ALPHABET[byte % OPTION_ID_ALPHABET.len()] as char),
        );
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, kind: u16, tags: Vec<NostrTag>) -> NostrEvent {
        NostrEvent {
            event_id: id.to_string(),
            kind,
            pubkey: format!("{id}-pk"),
            created_at: 1,
            content: String::new(),
            tags,
            raw_json: format!(r#"{{"id":"{id}"}}"#),
        }
    }

    fn parts(tags: &[NostrTag]) -> Vec<Vec<String>> {
        tags.iter().map(NostrTag::to_vec).collect()
    }

    #[test]
    fn test_option_ids_are_distinct_and_sized() {
        let ids = option_ids(50, 9);
        assert_eq!(ids.len(), 50);
        assert!(ids.iter().all(|id| id.len() == 9));
        assert!(ids.iter().all(|id| id.chars().all(|c| c.is_ascii_alphanumeric())));
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn test_option_ids_with_zero_length_are_nonempty_and_distinct() {
        let ids = option_ids(2, 0);
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| !id.is_empty()));
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_option_ids_grow_past_single_character_space() {
        let ids = option_ids(100, 1);
        assert_eq!(ids.len(), 100);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 100);
        assert!(ids.iter().any(|id| id.len() > 1));
        assert!(ids
            .iter()
            .all(|id| id.bytes().all(|byte| OPTION_ID_ALPHABET.contains(&byte))));
    }

    #[test]
    fn test_random_id_length_and_alphabet() {
        assert_eq!(random_id(0), "");
        let id = random_id(200);
        assert_eq!(id.len(), 200);
        assert!(id.bytes().all(|byte| OPTION_ID_ALPHABET.contains(&byte)));
        assert_eq!(OPTION_ID_BYTE_LIMIT, 248);
    }

    #[tokio::test]
    async fn test_poll_ignores_protected_marker() {
        let drafter = Drafter::new(DraftConfig {
            poll_option_id_len: 0,
            ..DraftConfig::default()
        });
        let poll = PollInput {
            options: vec!["a".to_string(), "b".to_string()],
            relays: vec!["wss://votes".to_string()],
            ..PollInput::default()
        };
        let draft = drafter
            .poll(
                "author",
                "pick",
                &[],
                &poll,
                PostOptions {
                    protected: true,
                    nsfw: true,
                    add_client_tag: false,
                },
            )
            .await;

        assert_eq!(draft.tags_named("option").count(), 2);
        assert!(draft.has_tag("content-warning"));
        assert!(!draft.has_tag("-"));
    }

    #[test]
    fn test_reaction_with_custom_emoji() {
        let drafter = Drafter::default();
        let target = event("abc", 20, vec![]);
        let draft = drafter.reaction(
            &target,
            &Reaction::Emoji(Emoji::new("party", "https://x/party.png")),
        );
        assert_eq!(draft.content, ":party:");
        assert_eq!(
            parts(&draft.tags),
            vec![
                vec!["e", "abc", "", "abc-pk"],
                vec!["p", "abc-pk"],
                vec!["k", "20"],
                vec!["emoji", "party", "https://x/party.png"],
            ]
        );
    }

    #[test]
    fn test_external_content_reaction_tags_kind() {
        let draft = Drafter::default()
            .external_content_reaction("https://example.com", &Reaction::default());
        assert_eq!(draft.kind, KIND_EXTERNAL_CONTENT_REACTION);
        assert_eq!(draft.content, "+");
        assert_eq!(
            parts(&draft.tags),
            vec![vec!["i", "https://example.com"], vec!["k", "web"]]
        );
    }

    #[test]
    fn test_generic_repost_of_replaceable_has_empty_content() {
        let target = event(
            "art",
            30_023,
            vec![NostrTag::new("d", vec!["slug".to_string()])],
        );
        let draft = Drafter::default().repost(&target);
        assert_eq!(draft.kind, KIND_GENERIC_REPOST);
        assert_eq!(draft.content, "");
        assert_eq!(
            parts(&draft.tags),
            vec![
                vec!["e", "art", "", "art-pk"],
                vec!["p", "art-pk"],
                vec!["k", "30023"],
                vec!["a", "30023:art-pk:slug"],
            ]
        );
    }

    #[test]
    fn test_generic_repost_embeds_regular_event() {
        let target = event("pic", 20, vec![]);
        let draft = Drafter::default().repost(&target);
        assert_eq!(draft.kind, KIND_GENERIC_REPOST);
        assert_eq!(draft.content, target.raw_json);
    }

    #[test]
    fn test_deletion_request_references_coordinate_or_id() {
        let drafter = Drafter::default();
        let note = drafter.deletion_request(&event("n", 1, vec![]));
        assert_eq!(parts(&note.tags), vec![vec!["k", "1"], vec!["e", "n"]]);

        let list = drafter.deletion_request(&event("l", 10_000, vec![]));
        assert_eq!(
            parts(&list.tags),
            vec![vec!["k", "10000"], vec!["a", "10000:l-pk:"]]
        );
        assert_eq!(list.content, DELETION_REQUEST_CONTENT);
    }

    #[test]
    fn test_report_profile_and_replaceable() {
        let drafter = Drafter::default();
        let profile = drafter.report(&event("m", KIND_METADATA, vec![]), "spam");
        assert_eq!(parts(&profile.tags), vec![vec!["p", "m-pk", "spam"]]);

        let article = drafter.report(
            &event("a", 30_023, vec![NostrTag::new("d", vec!["x".to_string()])]),
            "illegal",
        );
        assert_eq!(
            parts(&article.tags),
            vec![
                vec!["p", "a-pk"],
                vec!["e", "a", "illegal"],
                vec!["a", "30023:a-pk:x", "illegal"],
            ]
        );
    }

    #[test]
    fn test_relay_list_and_set() {
        let drafter = Drafter::default();
        let list = drafter.relay_list(&[
            MailboxRelay {
                url: "wss://a".to_string(),
                scope: RelayScope::Both,
            },
            MailboxRelay {
                url: "wss://b".to_string(),
                scope: RelayScope::Write,
            },
        ]);
        assert_eq!(
            parts(&list.tags),
            vec![vec!["r", "wss://a"], vec!["r", "wss://b", "write"]]
        );

        let set = drafter.relay_set(&RelaySet {
            id: "set-1".to_string(),
            name: "Friends".to_string(),
            relay_urls: vec!["wss://a".to_string()],
        });
        assert_eq!(set.kind, KIND_RELAY_SET);
        assert_eq!(
            parts(&set.tags),
            vec![vec!["d", "set-1"], vec!["title", "Friends"], vec!["relay", "wss://a"]]
        );
    }

    #[test]
    fn test_favorite_relays_mix_events_and_tags() {
        let set_event = event("s", KIND_RELAY_SET, vec![NostrTag::new("d", vec!["x".into()])]);
        let draft = Drafter::default().favorite_relays(
            &["wss://fav".to_string()],
            &[
                RelaySetRef::Event(set_event),
                RelaySetRef::Tag(NostrTag::new("a", vec!["30002:o:y".into()])),
            ],
        );
        assert_eq!(
            parts(&draft.tags),
            vec![
                vec!["relay", "wss://fav"],
                vec!["a", "30002:s-pk:x"],
                vec!["a", "30002:o:y"],
            ]
        );
    }

    #[test]
    fn test_group_membership_is_protected() {
        let drafter = Drafter::default();
        let join = drafter.group_join("invite");
        assert_eq!(join.kind, KIND_GROUP_JOIN_REQUEST);
        assert_eq!(parts(&join.tags), vec![vec!["claim", "invite"], vec!["-"]]);
        let leave = drafter.group_leave();
        assert_eq!(parts(&leave.tags), vec![vec!["-"]]);
        assert!(drafter.cache().is_empty());
    }

    #[test]
    fn test_relay_review_and_seen_at() {
        let drafter = Drafter::default();
        let review = drafter.relay_review("wss://r", "solid", 4);
        assert_eq!(
            parts(&review.tags),
            vec![vec!["d", "wss://r"], vec!["rating", "0.8"]]
        );
        let seen = drafter.seen_notifications_at();
        assert_eq!(parts(&seen.tags), vec![vec!["d", NOTIFICATIONS_SEEN_AT_KEY]]);
    }
}
