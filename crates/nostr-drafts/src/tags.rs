//! Canonical tag constructors.
//!
//! Every builder returns a trimmed tag. Builders taking an `upper_case` flag
//! emit the root-scope (`E`, `A`, `I`, `K`, `P`) variant used by comments.

use crate::events::{NostrEvent, NostrTag};
use crate::services::{Emoji, HintLookup};

pub const POLL_TYPE_SINGLE_CHOICE: &str = "singlechoice";
pub const POLL_TYPE_MULTIPLE_CHOICE: &str = "multiplechoice";

/// Thread marker carried in the fourth field of an `e` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Root,
    Reply,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::Root => "root",
            Marker::Reply => "reply",
        }
    }
}

/// Scope of a mailbox relay in a kind 10002 list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayScope {
    Read,
    Write,
    Both,
}

fn tag<I, S>(name: &str, values: I) -> NostrTag
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    NostrTag::new(name, values.into_iter().map(Into::into).collect()).trimmed()
}

fn scoped(upper_case: bool, lower: &'static str, upper: &'static str) -> &'static str {
    if upper_case {
        upper
    } else {
        lower
    }
}

fn resolve_hint(hints: &dyn HintLookup, event_id: &str, hint: &str) -> String {
    if hint.is_empty() {
        hints.event_hint(event_id).unwrap_or_default()
    } else {
        hint.to_string()
    }
}

/// `["e", id, hint, pubkey]`; the hint is looked up when not given.
pub fn e_tag(
    hints: &dyn HintLookup,
    event_id: &str,
    pubkey: &str,
    hint: &str,
    upper_case: bool,
) -> NostrTag {
    let hint = resolve_hint(hints, event_id, hint);
    tag(
        scoped(upper_case, "e", "E"),
        [event_id, hint.as_str(), pubkey],
    )
}

/// `["e", id, hint, marker, pubkey]`.
pub fn e_tag_with_marker(
    hints: &dyn HintLookup,
    event_id: &str,
    pubkey: &str,
    hint: &str,
    marker: Marker,
) -> NostrTag {
    let hint = resolve_hint(hints, event_id, hint);
    tag("e", [event_id, hint.as_str(), marker.as_str(), pubkey])
}

/// `["a", coordinate, hint]` for a replaceable event.
pub fn a_tag(hints: &dyn HintLookup, event: &NostrEvent, upper_case: bool) -> NostrTag {
    let hint = hints.event_hint(&event.event_id).unwrap_or_default();
    tag(
        scoped(upper_case, "a", "A"),
        [event.coordinate(), hint],
    )
}

/// `["a", coordinate, hint, "root"]` as written by older clients. Without a
/// hint, the cached replaceable event supplies one.
pub fn legacy_root_a_tag(hints: &dyn HintLookup, coordinate: &str, hint: &str) -> NostrTag {
    let hint = if hint.is_empty() {
        hints
            .replaceable_event(coordinate)
            .and_then(|event| hints.event_hint(&event.event_id))
            .unwrap_or_default()
    } else {
        hint.to_string()
    };
    tag("a", [coordinate, hint.as_str(), "root"])
}

/// `["a", coordinate, hint, "source"]` or `["e", id, hint, "source"]`.
pub fn source_tag(hints: &dyn HintLookup, event: &NostrEvent) -> NostrTag {
    let hint = hints.event_hint(&event.event_id).unwrap_or_default();
    if event.is_replaceable() {
        tag("a", [event.coordinate(), hint, "source".to_string()])
    } else {
        tag("e", [event.event_id.clone(), hint, "source".to_string()])
    }
}

/// Bare `[name, value]` reference without hints, as used by deletions.
pub fn reference_tag(name: &str, value: &str) -> NostrTag {
    tag(name, [value])
}

/// `[name, target, reason]` for reports.
pub fn report_tag(name: &str, target: &str, reason: &str) -> NostrTag {
    tag(name, [target, reason])
}

pub fn d_tag(identifier: &str) -> NostrTag {
    tag("d", [identifier])
}

pub fn i_tag(url: &str, upper_case: bool) -> NostrTag {
    tag(scoped(upper_case, "i", "I"), [url])
}

pub fn k_tag(kind: impl ToString, upper_case: bool) -> NostrTag {
    tag(scoped(upper_case, "k", "K"), [kind.to_string()])
}

pub fn p_tag(pubkey: &str, upper_case: bool) -> NostrTag {
    tag(scoped(upper_case, "p", "P"), [pubkey])
}

/// `["p", pubkey, "", role]`, e.g. `mention` or `author` on highlights.
pub fn p_tag_with_role(pubkey: &str, role: &str) -> NostrTag {
    tag("p", [pubkey, "", role])
}

/// `["q", id-or-coordinate, relay, pubkey]`. The author is only written
/// when a relay is present.
pub fn q_tag(target: &str, relay: Option<&str>, pubkey: Option<&str>) -> NostrTag {
    let mut values = vec![target.to_string()];
    if let Some(relay) = relay.filter(|relay| !relay.is_empty()) {
        values.push(relay.to_string());
        if let Some(pubkey) = pubkey.filter(|pubkey| !pubkey.is_empty()) {
            values.push(pubkey.to_string());
        }
    }
    tag("q", values)
}

pub fn r_tag(url: &str, scope: RelayScope) -> NostrTag {
    match scope {
        RelayScope::Read => tag("r", [url, "read"]),
        RelayScope::Write => tag("r", [url, "write"]),
        RelayScope::Both => tag("r", [url]),
    }
}

pub fn t_tag(hashtag: &str) -> NostrTag {
    tag("t", [hashtag])
}

pub fn emoji_tag(emoji: &Emoji) -> NostrTag {
    tag("emoji", [emoji.shortcode.as_str(), emoji.url.as_str()])
}

pub fn title_tag(title: &str) -> NostrTag {
    tag("title", [title])
}

pub fn relay_tag(url: &str) -> NostrTag {
    tag("relay", [url])
}

pub fn server_tag(url: &str) -> NostrTag {
    tag("server", [url])
}

pub fn response_tag(option_id: &str) -> NostrTag {
    tag("response", [option_id])
}

pub fn client_tag(client: &str) -> NostrTag {
    tag("client", [client])
}

pub fn nsfw_tag() -> NostrTag {
    tag("content-warning", ["NSFW"])
}

pub fn protected_tag() -> NostrTag {
    NostrTag::new("-", Vec::new())
}

pub fn option_tag(id: &str, label: &str) -> NostrTag {
    tag("option", [id, label])
}

pub fn poll_type_tag(multiple_choice: bool) -> NostrTag {
    if multiple_choice {
        tag("polltype", [POLL_TYPE_MULTIPLE_CHOICE])
    } else {
        tag("polltype", [POLL_TYPE_SINGLE_CHOICE])
    }
}

pub fn ends_at_tag(ends_at: u64) -> NostrTag {
    tag("endsAt", [ends_at.to_string()])
}

pub fn claim_tag(invite_code: &str) -> NostrTag {
    tag("claim", [invite_code])
}

pub fn comment_tag(comment: &str) -> NostrTag {
    tag("comment", [comment])
}

/// Star rating out of five, stored as a fraction (`4` stars -> `"0.8"`).
pub fn rating_tag(stars: u8) -> NostrTag {
    let rating = f64::from(stars) / 5.0;
    tag("rating", [rating.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NoopServices;

    struct FixedHint;

    impl HintLookup for FixedHint {
        fn event_hint(&self, _event_id: &str) -> Option<String> {
            Some("wss://hint.example".to_string())
        }

        fn replaceable_event(&self, _coordinate: &str) -> Option<NostrEvent> {
            None
        }
    }

    fn parts(tag: &NostrTag) -> Vec<String> {
        tag.to_vec()
    }

    #[test]
    fn test_e_tag_keeps_empty_hint_before_pubkey() {
        let tag = e_tag(&NoopServices, "abc", "def", "", false);
        assert_eq!(parts(&tag), vec!["e", "abc", "", "def"]);
    }

    #[test]
    fn test_e_tag_uses_hint_lookup_and_upper_case() {
        let tag = e_tag(&FixedHint, "abc", "", "", true);
        assert_eq!(parts(&tag), vec!["E", "abc", "wss://hint.example"]);
    }

    #[test]
    fn test_e_tag_with_marker_trims_missing_pubkey() {
        let tag = e_tag_with_marker(&NoopServices, "abc", "", "", Marker::Root);
        assert_eq!(parts(&tag), vec!["e", "abc", "", "root"]);
    }

    #[test]
    fn test_q_tag_drops_author_without_relay() {
        assert_eq!(parts(&q_tag("abc", None, Some("def"))), vec!["q", "abc"]);
        assert_eq!(
            parts(&q_tag("abc", Some("wss://r"), Some("def"))),
            vec!["q", "abc", "wss://r", "def"]
        );
    }

    #[test]
    fn test_r_tag_scopes() {
        assert_eq!(parts(&r_tag("wss://r", RelayScope::Both)), vec!["r", "wss://r"]);
        assert_eq!(
            parts(&r_tag("wss://r", RelayScope::Read)),
            vec!["r", "wss://r", "read"]
        );
    }

    #[test]
    fn test_rating_is_fraction_of_five() {
        assert_eq!(parts(&rating_tag(4)), vec!["rating", "0.8"]);
        assert_eq!(parts(&rating_tag(5)), vec!["rating", "1"]);
    }

    #[test]
    fn test_protected_tag_is_bare() {
        assert_eq!(parts(&protected_tag()), vec!["-"]);
    }
}
