use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::events::{is_replaceable_kind, unix_timestamp, NostrEvent, NostrTag};
use crate::services::HintLookup;
use crate::Error;

/// Local record of events and the relays they were seen on. Serves relay
/// hints and cached replaceable events to the drafting engine.
#[derive(Clone)]
pub struct SqliteEventIndex {
    db: Arc<Mutex<Connection>>,
}

impl SqliteEventIndex {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, Error> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        init_schema(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Stores `event` and, when given, the relay it came from.
    pub fn record(&self, event: &NostrEvent, relay_url: Option<&str>) -> Result<(), Error> {
        let now = unix_timestamp() as i64;
        let coordinate = is_replaceable_kind(event.kind).then(|| event.coordinate());
        let tags_json = serde_json::to_string(&event.tags)?;

        let mut conn = self.db.lock().map_err(|_| Error::MutexPoisoned)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO nostr_events (event_id, kind, author, coordinate, created_at, content, tags_json, raw_json, seen_at) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
            ON CONFLICT(event_id) DO UPDATE SET seen_at = excluded.seen_at",
            params![
                &event.event_id,
                event.kind as i64,
                &event.pubkey,
                coordinate,
                event.created_at as i64,
                &event.content,
                tags_json,
                &event.raw_json,
                now
            ],
        )?;

        if let Some(relay_url) = relay_url.filter(|url| !url.is_empty()) {
            tx.execute(
                "INSERT INTO event_relays (event_id, relay_url, seen_at) VALUES (?1, ?2, ?3) \
                ON CONFLICT(event_id, relay_url) DO UPDATE SET seen_at = excluded.seen_at",
                params![&event.event_id, relay_url, now],
            )?;
        }
        tx.commit()?;

        debug!(event_id = %event.event_id, relay = ?relay_url, "Recorded nostr event");
        Ok(())
    }

    fn query_hint(&self, event_id: &str) -> Result<Option<String>, Error> {
        let conn = self.db.lock().map_err(|_| Error::MutexPoisoned)?;
        let hint = conn
            .query_row(
                "SELECT relay_url FROM event_relays WHERE event_id = ?1 \
                ORDER BY seen_at DESC, relay_url ASC LIMIT 1",
                params![event_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hint)
    }

    fn query_replaceable(&self, coordinate: &str) -> Result<Option<NostrEvent>, Error> {
        let conn = self.db.lock().map_err(|_| Error::MutexPoisoned)?;
        let row = conn
            .query_row(
                "SELECT event_id, kind, author, created_at, content, tags_json, raw_json \
                FROM nostr_events WHERE coordinate = ?1 \
                ORDER BY created_at DESC LIMIT 1",
                params![coordinate],
                read_event_row,
            )
            .optional()?;

        match row {
            Some((mut event, tags_json)) => {
                event.tags = serde_json::from_str(&tags_json)?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }
}

impl HintLookup for SqliteEventIndex {
    fn event_hint(&self, event_id: &str) -> Option<String> {
        self.query_hint(event_id).unwrap_or_else(|err| {
            warn!(event_id = %event_id, error = %err, "Relay hint lookup failed");
            None
        })
    }

    fn replaceable_event(&self, coordinate: &str) -> Option<NostrEvent> {
        self.query_replaceable(coordinate).unwrap_or_else(|err| {
            warn!(coordinate = %coordinate, error = %err, "Replaceable event lookup failed");
            None
        })
    }
}

fn read_event_row(row: &Row<'_>) -> rusqlite::Result<(NostrEvent, String)> {
    let kind: i64 = row.get(1)?;
    let created_at: i64 = row.get(3)?;
    let event = NostrEvent {
        event_id: row.get(0)?,
        kind: kind as u16,
        pubkey: row.get(2)?,
        created_at: created_at as u64,
        content: row.get(4)?,
        tags: Vec::<NostrTag>::new(),
        raw_json: row.get(6)?,
    };
    Ok((event, row.get(5)?))
}

fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS nostr_events (\
            event_id TEXT PRIMARY KEY,\
            kind INTEGER NOT NULL,\
            author TEXT NOT NULL,\
            coordinate TEXT,\
            created_at INTEGER NOT NULL,\
            content TEXT NOT NULL,\
            tags_json TEXT NOT NULL,\
            raw_json TEXT NOT NULL,\
            seen_at INTEGER NOT NULL\
        );\
        CREATE INDEX IF NOT EXISTS idx_nostr_events_coordinate ON nostr_events(coordinate, created_at);\
        CREATE TABLE IF NOT EXISTS event_relays (\
            event_id TEXT NOT NULL,\
            relay_url TEXT NOT NULL,\
            seen_at INTEGER NOT NULL,\
            PRIMARY KEY (event_id, relay_url)\
        );",
    )?;
    Ok(())
}
