use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nostr_drafts::{
    DraftCache, DraftRequest, Drafter, Emoji, EmojiCatalog, Error, EventFetcher, HintLookup,
    MediaLookup, NostrEvent, NostrTag, PollInput, PostOptions, Reaction, RelayList, ReplyTarget,
    SqliteEventIndex, KIND_COMMENT, KIND_GENERIC_REPOST, KIND_GROUP_LEAVE_REQUEST,
    KIND_HIGHLIGHT, KIND_POLL, KIND_REACTION, KIND_REPOST, KIND_SHORT_TEXT_NOTE,
};

#[derive(Default)]
struct Hints {
    relays: HashMap<String, String>,
    replaceable: HashMap<String, NostrEvent>,
}

impl Hints {
    fn with(mut self, event_id: &str, relay: &str) -> Self {
        self.relays.insert(event_id.to_string(), relay.to_string());
        self
    }

    fn with_replaceable(mut self, event: NostrEvent) -> Self {
        self.replaceable.insert(event.coordinate(), event);
        self
    }
}

impl HintLookup for Hints {
    fn event_hint(&self, event_id: &str) -> Option<String> {
        self.relays.get(event_id).cloned()
    }

    fn replaceable_event(&self, coordinate: &str) -> Option<NostrEvent> {
        self.replaceable.get(coordinate).cloned()
    }
}

struct Catalog;

impl EmojiCatalog for Catalog {
    fn emoji(&self, shortcode: &str) -> Option<Emoji> {
        (shortcode == "smile").then(|| Emoji::new("smile", "https://x/smile.png"))
    }
}

struct Media;

impl MediaLookup for Media {
    fn imeta_tag(&self, url: &str) -> Option<NostrTag> {
        Some(NostrTag::new(
            "imeta",
            vec![format!("url {url}"), "m image/png".to_string()],
        ))
    }
}

enum Behavior {
    Found(NostrEvent),
    Fail,
    Hang,
}

struct StubFetcher {
    behavior: Behavior,
    relay_list: RelayList,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            relay_list: RelayList::default(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EventFetcher for StubFetcher {
    async fn fetch_event(
        &self,
        event_id: &str,
        _relay_hint: Option<&str>,
    ) -> Result<Option<NostrEvent>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Found(event) => Ok(Some(event.clone())),
            Behavior::Fail => Err(Error::InvalidReference {
                value: event_id.to_string(),
                reason: "relay unreachable".to_string(),
            }),
            Behavior::Hang => std::future::pending().await,
        }
    }

    async fn fetch_relay_list(&self, _pubkey: &str) -> Result<RelayList, Error> {
        match &self.behavior {
            Behavior::Hang => std::future::pending().await,
            _ => Ok(self.relay_list.clone()),
        }
    }
}

fn event(id: &str, kind: u16, tags: Vec<NostrTag>) -> NostrEvent {
    NostrEvent {
        event_id: id.to_string(),
        kind,
        pubkey: format!("{id}-pk"),
        created_at: 1_700_000_000,
        content: format!("content of {id}"),
        tags,
        raw_json: format!(r#"{{"id":"{id}"}}"#),
    }
}

fn tag(parts: &[&str]) -> NostrTag {
    NostrTag::try_from(parts.iter().map(|s| s.to_string()).collect::<Vec<_>>()).unwrap()
}

fn parts(tags: &[NostrTag]) -> Vec<Vec<String>> {
    tags.iter().map(NostrTag::to_vec).collect()
}

fn article() -> NostrEvent {
    event("art", 30_023, vec![tag(&["d", "slug"])])
}

fn article_hints() -> Arc<Hints> {
    Arc::new(
        Hints::default()
            .with("art", "wss://art")
            .with_replaceable(article()),
    )
}

fn ticking_cache() -> DraftCache {
    let tick = AtomicU64::new(100);
    DraftCache::with_clock(move || tick.fetch_add(1, Ordering::SeqCst))
}

#[test]
fn reaction_uses_relay_hint_and_author() {
    let drafter = Drafter::default().with_hints(Arc::new(Hints::default().with("abc", "wss://hint")));
    let mut target = event("abc", KIND_SHORT_TEXT_NOTE, vec![]);
    target.pubkey = "def".to_string();

    let draft = drafter.reaction(&target, &Reaction::default());
    assert_eq!(draft.kind, KIND_REACTION);
    assert_eq!(draft.content, "+");
    assert_eq!(
        parts(&draft.tags),
        vec![vec!["e", "abc", "wss://hint", "def"], vec!["p", "def"]]
    );
}

#[tokio::test]
async fn note_collects_emoji_and_hashtag_tags() {
    let drafter = Drafter::default()
        .with_emojis(Arc::new(Catalog))
        .with_media(Arc::new(Media));

    let draft = drafter
        .short_text_note(
            "hello :smile: #Nostr https://img.example/cat.png",
            &["friend".to_string()],
            None,
            PostOptions {
                add_client_tag: true,
                ..PostOptions::default()
            },
        )
        .await;

    assert_eq!(draft.kind, KIND_SHORT_TEXT_NOTE);
    assert_eq!(draft.content, "hello :smile: #Nostr https://img.example/cat.png");
    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["emoji", "smile", "https://x/smile.png"],
            vec!["t", "nostr"],
            vec!["imeta", "url https://img.example/cat.png", "m image/png"],
            vec!["p", "friend"],
            vec!["client", "marked"],
        ]
    );
}

#[tokio::test]
async fn hashtag_and_emoji_leave_content_unchanged() {
    let drafter = Drafter::default().with_emojis(Arc::new(Catalog));
    let draft = drafter
        .short_text_note("hello #nostr :smile:", &[], None, PostOptions::default())
        .await;

    assert_eq!(draft.content, "hello #nostr :smile:");
    assert!(draft.tags.contains(&tag(&["t", "nostr"])));
    assert!(draft
        .tags
        .contains(&tag(&["emoji", "smile", "https://x/smile.png"])));
}

#[tokio::test]
async fn reply_to_root_note_marks_parent_as_root() {
    let parent = event("root1", KIND_SHORT_TEXT_NOTE, vec![]);
    let draft = Drafter::default()
        .short_text_note(
            "first!",
            &[],
            Some(&ReplyTarget::Event(parent)),
            PostOptions::default(),
        )
        .await;
    assert_eq!(
        parts(&draft.tags),
        vec![vec!["e", "root1", "", "root", "root1-pk"]]
    );
}

#[tokio::test]
async fn reply_keeps_known_root_author_without_fetching() {
    let fetcher = Arc::new(StubFetcher::new(Behavior::Fail));
    let parent = event(
        "p1",
        KIND_SHORT_TEXT_NOTE,
        vec![tag(&["e", "root1", "wss://hint", "root", "root-pk"])],
    );
    let draft = Drafter::default()
        .with_fetcher(fetcher.clone())
        .short_text_note("re", &[], Some(&parent.into()), PostOptions::default())
        .await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["e", "root1", "wss://hint", "root", "root-pk"],
            vec!["e", "p1", "", "reply", "p1-pk"],
        ]
    );
}

#[tokio::test]
async fn reply_fetches_missing_root_author() {
    let mut root = event("root1", KIND_SHORT_TEXT_NOTE, vec![]);
    root.pubkey = "fetched-pk".to_string();
    let fetcher = Arc::new(StubFetcher::new(Behavior::Found(root)));
    let parent = event(
        "p1",
        KIND_SHORT_TEXT_NOTE,
        vec![tag(&["e", "root1", "wss://hint", "root"])],
    );

    let draft = Drafter::default()
        .with_fetcher(fetcher.clone())
        .short_text_note("re", &[], Some(&parent.into()), PostOptions::default())
        .await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        parts(&draft.tags)[0],
        vec!["e", "root1", "wss://hint", "root", "fetched-pk"]
    );
}

#[tokio::test]
async fn reply_survives_root_fetch_failure() {
    let parent = event(
        "p1",
        KIND_SHORT_TEXT_NOTE,
        vec![tag(&["e", "root1", "wss://hint", "root"])],
    );
    let draft = Drafter::default()
        .with_fetcher(Arc::new(StubFetcher::new(Behavior::Fail)))
        .short_text_note("re", &[], Some(&parent.into()), PostOptions::default())
        .await;

    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["e", "root1", "wss://hint", "root"],
            vec!["e", "p1", "", "reply", "p1-pk"],
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn reply_survives_hanging_root_fetch() {
    let parent = event(
        "p1",
        KIND_SHORT_TEXT_NOTE,
        vec![tag(&["e", "root1", "wss://hint", "root"])],
    );
    let draft = Drafter::default()
        .with_fetcher(Arc::new(StubFetcher::new(Behavior::Hang)))
        .short_text_note("re", &[], Some(&parent.into()), PostOptions::default())
        .await;

    assert_eq!(
        parts(&draft.tags)[0],
        vec!["e", "root1", "wss://hint", "root"]
    );
}

#[tokio::test]
async fn identical_notes_share_timestamp_until_invalidated() {
    let drafter = Drafter::default().with_cache(ticking_cache());

    let first = drafter
        .short_text_note("gm", &[], None, PostOptions::default())
        .await;
    let second = drafter
        .short_text_note("gm", &[], None, PostOptions::default())
        .await;
    assert_eq!(first, second);
    assert_eq!(first.created_at, 100);

    let other = drafter
        .short_text_note("gn", &[], None, PostOptions::default())
        .await;
    assert_eq!(other.created_at, 101);

    assert!(drafter.invalidate(&first));
    let third = drafter
        .short_text_note("gm", &[], None, PostOptions::default())
        .await;
    assert_eq!(third.created_at, 102);
}

#[test]
fn repost_of_protected_note_has_empty_content() {
    let drafter = Drafter::default();
    let protected = event("n1", KIND_SHORT_TEXT_NOTE, vec![tag(&["-"])]);
    let draft = drafter.repost(&protected);
    assert_eq!(draft.kind, KIND_REPOST);
    assert_eq!(draft.content, "");
    assert_eq!(
        parts(&draft.tags),
        vec![vec!["e", "n1", "", "n1-pk"], vec!["p", "n1-pk"]]
    );

    let open = event("n2", KIND_SHORT_TEXT_NOTE, vec![]);
    assert_eq!(drafter.repost(&open).content, open.raw_json);

    let picture = event("pic", 20, vec![tag(&["-"])]);
    let generic = drafter.repost(&picture);
    assert_eq!(generic.kind, KIND_GENERIC_REPOST);
    assert_eq!(generic.content, "");
}

#[test]
fn comment_on_note_roots_at_note() {
    let parent = event("n1", KIND_SHORT_TEXT_NOTE, vec![]);
    let draft = Drafter::default().comment(
        "agreed",
        &ReplyTarget::Event(parent),
        &["n1-pk".to_string(), "other".to_string()],
        PostOptions::default(),
    );

    assert_eq!(draft.kind, KIND_COMMENT);
    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["p", "other"],
            vec!["E", "n1", "", "n1-pk"],
            vec!["P", "n1-pk"],
            vec!["K", "1"],
            vec!["e", "n1", "", "n1-pk"],
            vec!["p", "n1-pk"],
            vec!["k", "1"],
        ]
    );
}

#[test]
fn comment_on_comment_inherits_root() {
    let parent = event(
        "c1",
        KIND_COMMENT,
        vec![
            tag(&["E", "n1", "wss://root", "n1-pk"]),
            tag(&["P", "n1-pk"]),
            tag(&["K", "1"]),
            tag(&["e", "n1", "wss://root", "n1-pk"]),
            tag(&["p", "n1-pk"]),
            tag(&["k", "1"]),
        ],
    );
    let draft = Drafter::default().comment(
        "me too",
        &ReplyTarget::Event(parent),
        &[],
        PostOptions {
            protected: true,
            ..PostOptions::default()
        },
    );

    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["E", "n1", "wss://root", "n1-pk"],
            vec!["P", "n1-pk"],
            vec!["K", "1"],
            vec!["e", "c1", "", "c1-pk"],
            vec!["p", "c1-pk"],
            vec!["k", "1111"],
            vec!["-"],
        ]
    );
}

#[test]
fn highlight_credits_source_author() {
    let source = event("src", KIND_SHORT_TEXT_NOTE, vec![]);
    let draft = Drafter::default().highlight(
        "quoted passage",
        "nice #Take",
        &source,
        &["src-pk".to_string(), "m1".to_string()],
        PostOptions::default(),
    );

    assert_eq!(draft.kind, KIND_HIGHLIGHT);
    assert_eq!(draft.content, "quoted passage");
    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["t", "take"],
            vec!["p", "m1", "", "mention"],
            vec!["comment", "nice #Take"],
            vec!["e", "src", "", "source"],
            vec!["p", "src-pk", "", "author"],
        ]
    );
}

#[tokio::test]
async fn poll_defaults_to_first_four_read_relays() {
    let mut fetcher = StubFetcher::new(Behavior::Fail);
    fetcher.relay_list = RelayList {
        read: (1..=6).map(|n| format!("wss://read{n}")).collect(),
        write: vec!["wss://write".to_string()],
    };
    let drafter = Drafter::default().with_fetcher(Arc::new(fetcher));

    let poll = PollInput {
        options: vec!["Yes".to_string(), "  ".to_string(), "No".to_string()],
        ..PollInput::default()
    };
    let draft = drafter
        .poll("author", "Ship it?", &[], &poll, PostOptions::default())
        .await;

    assert_eq!(draft.kind, KIND_POLL);
    let options: Vec<_> = draft.tags_named("option").collect();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].value(1), Some("Yes"));
    assert_eq!(options[1].value(1), Some("No"));
    assert!(options.iter().all(|tag| tag.value(0).map(str::len) == Some(9)));

    let relays: Vec<_> = draft
        .tags_named("relay")
        .filter_map(|tag| tag.value(0))
        .collect();
    assert_eq!(
        relays,
        vec!["wss://read1", "wss://read2", "wss://read3", "wss://read4"]
    );
    assert_eq!(
        draft.tags_named("polltype").next().and_then(|tag| tag.value(0)),
        Some("singlechoice")
    );
}

#[tokio::test(start_paused = true)]
async fn poll_without_options_or_relays_still_drafts() {
    let drafter = Drafter::default().with_fetcher(Arc::new(StubFetcher::new(Behavior::Hang)));
    let draft = drafter
        .poll("author", "?", &[], &PollInput::default(), PostOptions::default())
        .await;

    assert!(!draft.has_tag("option"));
    assert!(!draft.has_tag("relay"));
    assert!(draft.has_tag("polltype"));
}

#[tokio::test]
async fn draft_request_dispatches_to_assembler() {
    let drafter = Drafter::default();
    let leave = drafter.draft(DraftRequest::GroupLeave).await;
    assert_eq!(leave.kind, KIND_GROUP_LEAVE_REQUEST);
    assert_eq!(parts(&leave.tags), vec![vec!["-"]]);

    let reaction = drafter
        .draft(DraftRequest::Reaction {
            target: event("abc", 1, vec![]),
            reaction: Reaction::Symbol("🔥".to_string()),
        })
        .await;
    assert_eq!(reaction.content, "🔥");
}

#[test]
fn sqlite_index_supplies_relay_hints() {
    let index = SqliteEventIndex::in_memory().unwrap();
    let target = event("abc", KIND_SHORT_TEXT_NOTE, vec![]);
    index.record(&target, Some("wss://seen.example")).unwrap();

    let drafter = Drafter::default().with_hints(Arc::new(index));
    let draft = drafter.reaction(&target, &Reaction::default());
    assert_eq!(
        parts(&draft.tags)[0],
        vec!["e", "abc", "wss://seen.example", "abc-pk"]
    );
}

#[tokio::test]
async fn legacy_a_root_takes_hint_from_cached_replaceable_event() {
    let parent = event(
        "p1",
        KIND_SHORT_TEXT_NOTE,
        vec![tag(&["a", "30023:art-pk:slug", "", "root"])],
    );
    let draft = Drafter::default()
        .with_hints(article_hints())
        .short_text_note("re", &[], Some(&parent.into()), PostOptions::default())
        .await;

    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["a", "30023:art-pk:slug", "wss://art", "root"],
            vec!["e", "p1", "", "reply", "p1-pk"],
        ]
    );
}

#[test]
fn reaction_to_replaceable_target_adds_coordinate() {
    let draft = Drafter::default()
        .with_hints(article_hints())
        .reaction(&article(), &Reaction::default());

    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["e", "art", "wss://art", "art-pk"],
            vec!["p", "art-pk"],
            vec!["k", "30023"],
            vec!["a", "30023:art-pk:slug", "wss://art"],
        ]
    );
}

#[test]
fn comment_on_replaceable_parent_roots_at_coordinate() {
    let draft = Drafter::default().with_hints(article_hints()).comment(
        "great read",
        &ReplyTarget::Event(article()),
        &[],
        PostOptions::default(),
    );

    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["A", "30023:art-pk:slug", "wss://art"],
            vec!["P", "art-pk"],
            vec!["K", "30023"],
            vec!["a", "30023:art-pk:slug", "wss://art"],
            vec!["p", "art-pk"],
            vec!["k", "30023"],
        ]
    );
}

#[test]
fn comment_on_comment_propagates_root_coordinate_verbatim() {
    let parent = event(
        "c1",
        KIND_COMMENT,
        vec![
            tag(&["A", "30023:art-pk:slug", "wss://root-hint"]),
            tag(&["P", "art-pk"]),
            tag(&["K", "30023"]),
            tag(&["a", "30023:art-pk:slug", "wss://root-hint"]),
            tag(&["p", "art-pk"]),
            tag(&["k", "30023"]),
        ],
    );
    let draft = Drafter::default().with_hints(article_hints()).comment(
        "replying to you",
        &ReplyTarget::Event(parent),
        &[],
        PostOptions::default(),
    );

    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["A", "30023:art-pk:slug", "wss://root-hint"],
            vec!["P", "art-pk"],
            vec!["K", "30023"],
            vec!["e", "c1", "", "c1-pk"],
            vec!["p", "c1-pk"],
            vec!["k", "1111"],
        ]
    );
}

#[test]
fn highlight_of_replaceable_source_uses_coordinate() {
    let draft = Drafter::default().with_hints(article_hints()).highlight(
        "a fine sentence",
        "",
        &article(),
        &[],
        PostOptions::default(),
    );

    assert_eq!(
        parts(&draft.tags),
        vec![
            vec!["a", "30023:art-pk:slug", "wss://art", "source"],
            vec!["p", "art-pk", "", "author"],
        ]
    );
}
