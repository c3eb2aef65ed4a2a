//! Root/parent lineage for replies and comments.

use std::time::Duration;

use tracing::{debug, warn};

use crate::events::{
    external_content_kind, is_comment_kind, NostrEvent, NostrTag, KIND_SHORT_TEXT_NOTE,
};
use crate::services::{EventFetcher, HintLookup};
use crate::tags::{a_tag, e_tag, e_tag_with_marker, i_tag, k_tag, legacy_root_a_tag, p_tag, Marker};

/// What a reply or comment points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    Event(NostrEvent),
    /// Non-native content such as a web URL or an ISBN.
    External(String),
}

impl From<NostrEvent> for ReplyTarget {
    fn from(event: NostrEvent) -> Self {
        ReplyTarget::Event(event)
    }
}

/// Root tag of an event's own thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootTag<'a> {
    Event(&'a NostrTag),
    Coordinate(&'a NostrTag),
}

/// Finds the thread root an event replies to.
///
/// Prefers an `e` tag marked `root`; with no marked `e` tags at all, the
/// first `e` tag is the root (positional scheme). Otherwise an `a` tag
/// marked `root` is the legacy addressable root.
pub fn root_tag(event: &NostrEvent) -> Option<RootTag<'_>> {
    if event.kind == KIND_SHORT_TEXT_NOTE {
        let e_tags: Vec<&NostrTag> = event.tags.iter().filter(|tag| tag.name == "e").collect();
        if let Some(tag) = e_tags.iter().find(|tag| tag.value(2) == Some("root")) {
            return Some(RootTag::Event(tag));
        }
        let marked = e_tags
            .iter()
            .any(|tag| matches!(tag.value(2), Some("reply") | Some("mention")));
        if !marked {
            if let Some(tag) = e_tags.first() {
                return Some(RootTag::Event(tag));
            }
        }
    }

    event
        .tags
        .iter()
        .find(|tag| tag.name == "a" && tag.value(2) == Some("root"))
        .map(RootTag::Coordinate)
}

/// Thread tags of a reply, in emission order (root first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyLineage {
    pub root: Option<NostrTag>,
    pub parent: Option<NostrTag>,
}

impl ReplyLineage {
    pub fn into_tags(self) -> impl Iterator<Item = NostrTag> {
        self.root.into_iter().chain(self.parent)
    }
}

/// Resolves reply lineage. Only a root `e` tag lacking its author triggers a
/// network fetch, bounded by `timeout`; failures leave the author empty.
pub async fn resolve_reply(
    target: Option<&ReplyTarget>,
    hints: &dyn HintLookup,
    fetcher: &dyn EventFetcher,
    timeout: Duration,
) -> ReplyLineage {
    let parent = match target {
        None => return ReplyLineage::default(),
        Some(ReplyTarget::External(url)) => {
            return ReplyLineage {
                root: None,
                parent: Some(i_tag(url, false)),
            }
        }
        Some(ReplyTarget::Event(parent)) => parent,
    };

    let reply = || e_tag_with_marker(hints, &parent.event_id, &parent.pubkey, "", Marker::Reply);

    match root_tag(parent) {
        Some(RootTag::Event(tag)) => {
            let root_id = tag.value(0).unwrap_or_default();
            let hint = tag.value(1).unwrap_or_default();
            let root_pubkey = tag.value(3).unwrap_or_default();

            let root = if !root_pubkey.is_empty() {
                e_tag_with_marker(hints, root_id, root_pubkey, hint, Marker::Root)
            } else {
                match fetch_root(fetcher, root_id, hint, timeout).await {
                    Some(root_event) => e_tag_with_marker(
                        hints,
                        &root_event.event_id,
                        &root_event.pubkey,
                        hint,
                        Marker::Root,
                    ),
                    None => e_tag_with_marker(hints, root_id, "", hint, Marker::Root),
                }
            };
            ReplyLineage {
                root: Some(root),
                parent: Some(reply()),
            }
        }
        Some(RootTag::Coordinate(tag)) => {
            let coordinate = tag.value(0).unwrap_or_default();
            let hint = tag.value(1).unwrap_or_default();
            ReplyLineage {
                root: Some(legacy_root_a_tag(hints, coordinate, hint)),
                parent: Some(reply()),
            }
        }
        None => ReplyLineage {
            root: Some(e_tag_with_marker(
                hints,
                &parent.event_id,
                &parent.pubkey,
                "",
                Marker::Root,
            )),
            parent: None,
        },
    }
}

async fn fetch_root(
    fetcher: &dyn EventFetcher,
    event_id: &str,
    hint: &str,
    timeout: Duration,
) -> Option<NostrEvent> {
    if event_id.is_empty() {
        return None;
    }
    let relay_hint = Some(hint).filter(|hint| !hint.is_empty());
    match tokio::time::timeout(timeout, fetcher.fetch_event(event_id, relay_hint)).await {
        Ok(Ok(Some(event))) => Some(event),
        Ok(Ok(None)) => {
            debug!(event_id = %event_id, "Thread root not found");
            None
        }
        Ok(Err(err)) => {
            warn!(event_id = %event_id, error = %err, "Failed to fetch thread root");
            None
        }
        Err(_) => {
            warn!(event_id = %event_id, "Timed out fetching thread root");
            None
        }
    }
}

/// Comment lineage. Root facts use uppercase tag names, the immediate
/// parent lowercase ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentLineage {
    pub root_coordinate: Option<NostrTag>,
    pub root_event_id: Option<String>,
    pub root_hint: String,
    pub root_kind: Option<String>,
    pub root_pubkey: Option<String>,
    pub root_url: Option<String>,
    pub parent_kind: Option<String>,
}

/// Derives comment root facts from the target. A comment parent passes its
/// own root down; any other event becomes the root.
pub fn resolve_comment(target: &ReplyTarget, hints: &dyn HintLookup) -> CommentLineage {
    let parent = match target {
        ReplyTarget::External(url) => {
            let kind = external_content_kind(url).map(str::to_string);
            return CommentLineage {
                root_kind: kind.clone(),
                root_url: Some(url.clone()),
                parent_kind: kind,
                ..CommentLineage::default()
            };
        }
        ReplyTarget::Event(parent) => parent,
    };

    let parent_kind = Some(parent.kind.to_string());
    if is_comment_kind(parent.kind) {
        let root_value = |name: &str| {
            parent
                .find_tag(name)
                .and_then(|tag| tag.value(0))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let root_hint = parent
            .find_tag("E")
            .and_then(|tag| tag.value(1))
            .unwrap_or_default()
            .to_string();
        CommentLineage {
            root_coordinate: parent.find_tag("A").cloned(),
            root_event_id: root_value("E"),
            root_hint,
            root_kind: root_value("K"),
            root_pubkey: root_value("P"),
            root_url: root_value("I"),
            parent_kind,
        }
    } else {
        CommentLineage {
            root_coordinate: parent
                .is_replaceable()
                .then(|| a_tag(hints, parent, true)),
            root_event_id: Some(parent.event_id.clone()),
            root_hint: String::new(),
            root_kind: Some(parent.kind.to_string()),
            root_pubkey: Some(parent.pubkey.clone()),
            root_url: None,
            parent_kind,
        }
    }
}

impl CommentLineage {
    /// Root tags: `A` (or `E`), then `P`, `K`, `I`.
    pub fn root_tags(&self, hints: &dyn HintLookup) -> Vec<NostrTag> {
        let mut tags = Vec::new();
        if let Some(tag) = &self.root_coordinate {
            tags.push(tag.clone());
        } else if let Some(event_id) = &self.root_event_id {
            let pubkey = self.root_pubkey.as_deref().unwrap_or_default();
            tags.push(e_tag(hints, event_id, pubkey, &self.root_hint, true));
        }
        if let Some(pubkey) = &self.root_pubkey {
            tags.push(p_tag(pubkey, true));
        }
        if let Some(kind) = &self.root_kind {
            tags.push(k_tag(kind, true));
        }
        if let Some(url) = &self.root_url {
            tags.push(i_tag(url, true));
        }
        tags
    }
}

/// Lowercase tags pointing at the immediate parent, ending with its kind.
pub fn comment_parent_tags(
    target: &ReplyTarget,
    lineage: &CommentLineage,
    hints: &dyn HintLookup,
) -> Vec<NostrTag> {
    let mut tags = match target {
        ReplyTarget::Event(parent) => {
            let reference = if parent.is_replaceable() {
                a_tag(hints, parent, false)
            } else {
                e_tag(hints, &parent.event_id, &parent.pubkey, "", false)
            };
            vec![reference, p_tag(&parent.pubkey, false)]
        }
        ReplyTarget::External(url) => vec![i_tag(url, false)],
    };
    if let Some(kind) = &lineage.parent_kind {
        tags.push(k_tag(kind, false));
    }
    tags
}
