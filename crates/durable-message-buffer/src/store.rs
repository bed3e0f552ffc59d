//! SQLite-backed FIFO of messages awaiting delivery.

use crate::{migrations, BufferError, BufferResult};
use chrono::{DateTime, Utc};
use omf_protocol_types::{DeliveryOutcome, Message, MessageAction, MessageCategory, MessageParts};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "seq, message_id, category, action, label, payload, created_at, \
                              enqueued_at, attempts, last_outcome";

/// A message held in the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferRecord {
    /// Arrival order; strictly increasing, never reused.
    pub seq: i64,
    pub message: Message,
    pub enqueued_at: DateTime<Utc>,
    /// Replay attempts that did not deliver.
    pub attempts: u32,
    pub last_outcome: Option<DeliveryOutcome>,
}

/// The record a drain stopped on.
#[derive(Debug, Clone, PartialEq)]
pub struct HaltedOn {
    pub seq: i64,
    pub label: String,
    pub outcome: DeliveryOutcome,
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    /// Records delivered and removed during this pass.
    pub delivered: usize,
    /// Records still buffered after the pass.
    pub remaining: usize,
    pub halted_on: Option<HaltedOn>,
}

impl DrainReport {
    /// True when the buffer was emptied.
    pub fn is_complete(&self) -> bool {
        self.halted_on.is_none() && self.remaining == 0
    }
}

/// Durable, ordered store of undelivered messages.
///
/// Every mutation commits as one statement or one transaction, so a record
/// is either fully present or absent after a crash.
pub struct BufferStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl BufferStore {
    /// Open the buffer file at `path`, creating it and running migrations.
    pub fn open(path: &Path) -> BufferResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // FULL makes each committed enqueue survive power loss, not only a crash.
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        migrations::run_migrations(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        let pending = store.len()?;
        info!(path = %path.display(), pending, "Message buffer opened");
        Ok(store)
    }

    /// Open an in-memory buffer for testing.
    pub fn open_in_memory() -> BufferResult<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append a message at the tail.
    ///
    /// Buffering a message that is already present is allowed; the relay
    /// treats a repeated create as idempotent.
    pub fn enqueue(&self, message: &Message) -> BufferResult<BufferRecord> {
        let enqueued_at = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO buffered_messages
                (message_id, category, action, label, payload, created_at, enqueued_at, attempts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
            params![
                message.message_id().to_string(),
                message.category().as_str(),
                message.action().as_str(),
                message.label(),
                message.payload(),
                message.created_at().to_rfc3339(),
                enqueued_at.to_rfc3339(),
            ],
        )?;
        let seq = conn.last_insert_rowid();

        debug!(seq, message_id = %message.message_id(), label = message.label(), "Message enqueued");

        Ok(BufferRecord {
            seq,
            message: message.clone(),
            enqueued_at,
            attempts: 0,
            last_outcome: None,
        })
    }

    /// Oldest record, if any.
    pub fn front(&self) -> BufferResult<Option<BufferRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM buffered_messages ORDER BY seq ASC LIMIT 1",
            SELECT_COLUMNS
        );
        let raw = conn.query_row(&sql, [], RawRecord::from_row).optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// Snapshot of every record in FIFO order.
    pub fn records(&self) -> BufferResult<Vec<BufferRecord>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM buffered_messages ORDER BY seq ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawRecord::from_row)?;

        let mut records = Vec::new();
        for raw in rows {
            records.push(raw?.into_record()?);
        }
        Ok(records)
    }

    pub fn len(&self) -> BufferResult<usize> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM buffered_messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> BufferResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Delete a record after it was delivered.
    pub fn remove(&self, seq: i64) -> BufferResult<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM buffered_messages WHERE seq = ?1", params![seq])?;
        Ok(removed > 0)
    }

    /// Record a replay that did not deliver.
    pub fn note_failure(&self, seq: i64, outcome: &DeliveryOutcome) -> BufferResult<()> {
        let outcome_json = serde_json::to_string(outcome)?;
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE buffered_messages
             SET attempts = attempts + 1, last_outcome = ?2
             WHERE seq = ?1",
            params![seq, outcome_json],
        )?;
        Ok(())
    }

    /// Move a record the relay refused out of the buffer into
    /// `rejected_messages`, so it no longer blocks the records behind it.
    ///
    /// Returns false when no buffered record has `seq`.
    pub fn reject(&self, seq: i64, outcome: &DeliveryOutcome) -> BufferResult<bool> {
        let outcome_json = serde_json::to_string(outcome)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let moved = tx.execute(
            "INSERT INTO rejected_messages
                (seq, message_id, category, action, label, payload, created_at, enqueued_at,
                 attempts, last_outcome, rejected_at)
             SELECT seq, message_id, category, action, label, payload, created_at, enqueued_at,
                    attempts, ?2, ?3
             FROM buffered_messages WHERE seq = ?1",
            params![seq, outcome_json, Utc::now().to_rfc3339()],
        )?;
        tx.execute("DELETE FROM buffered_messages WHERE seq = ?1", params![seq])?;
        tx.commit()?;

        if moved > 0 {
            debug!(seq, "Message moved to rejected_messages");
        }
        Ok(moved > 0)
    }

    /// Records the relay refused, oldest first. `last_outcome` holds the
    /// rejection.
    pub fn rejected(&self) -> BufferResult<Vec<BufferRecord>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM rejected_messages ORDER BY seq ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawRecord::from_row)?;

        let mut records = Vec::new();
        for raw in rows {
            records.push(raw?.into_record()?);
        }
        Ok(records)
    }

    /// Replay buffered records front to back until one is not delivered.
    ///
    /// `attempt` is called with each front message in turn. A `Delivered`
    /// outcome removes the record; any other outcome is recorded on it and
    /// stops the pass, leaving that record and everything behind it in place.
    /// The connection lock is never held while `attempt` runs.
    pub async fn drain_once<F, Fut>(&self, mut attempt: F) -> BufferResult<DrainReport>
    where
        F: FnMut(Message) -> Fut,
        Fut: Future<Output = DeliveryOutcome>,
    {
        let mut report = DrainReport::default();

        while let Some(record) = self.front()? {
            let outcome = attempt(record.message.clone()).await;

            if outcome.is_delivered() {
                self.remove(record.seq)?;
                report.delivered += 1;
                debug!(seq = record.seq, label = record.message.label(), "Buffered message delivered");
                continue;
            }

            self.note_failure(record.seq, &outcome)?;
            warn!(
                seq = record.seq,
                label = record.message.label(),
                attempts = record.attempts + 1,
                outcome = outcome.numeric_code(),
                "Drain halted"
            );
            report.halted_on = Some(HaltedOn {
                seq: record.seq,
                label: record.message.label().to_string(),
                outcome,
            });
            break;
        }

        report.remaining = self.len()?;
        info!(
            delivered = report.delivered,
            remaining = report.remaining,
            "Buffer drain pass finished"
        );
        Ok(report)
    }
}

/// Row as stored, before the text columns are validated.
struct RawRecord {
    seq: i64,
    message_id: String,
    category: String,
    action: String,
    label: String,
    payload: String,
    created_at: String,
    enqueued_at: String,
    attempts: i64,
    last_outcome: Option<String>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            seq: row.get(0)?,
            message_id: row.get(1)?,
            category: row.get(2)?,
            action: row.get(3)?,
            label: row.get(4)?,
            payload: row.get(5)?,
            created_at: row.get(6)?,
            enqueued_at: row.get(7)?,
            attempts: row.get(8)?,
            last_outcome: row.get(9)?,
        })
    }

    fn into_record(self) -> BufferResult<BufferRecord> {
        let message_id = Uuid::parse_str(&self.message_id).map_err(|e| {
            BufferError::InvalidData(format!("seq {}: message id: {}", self.seq, e))
        })?;
        let category = MessageCategory::parse(&self.category).ok_or_else(|| {
            BufferError::InvalidData(format!("seq {}: unknown category '{}'", self.seq, self.category))
        })?;
        let action = MessageAction::parse(&self.action).ok_or_else(|| {
            BufferError::InvalidData(format!("seq {}: unknown action '{}'", self.seq, self.action))
        })?;
        let last_outcome = self
            .last_outcome
            .as_deref()
            .map(serde_json::from_str::<DeliveryOutcome>)
            .transpose()?;

        let message = Message::from_parts(MessageParts {
            message_id,
            category,
            action,
            label: self.label,
            payload: self.payload,
            created_at: parse_datetime(self.seq, &self.created_at)?,
        });

        Ok(BufferRecord {
            seq: self.seq,
            message,
            enqueued_at: parse_datetime(self.seq, &self.enqueued_at)?,
            attempts: u32::try_from(self.attempts).unwrap_or(u32::MAX),
            last_outcome,
        })
    }
}

fn parse_datetime(seq: i64, s: &str) -> BufferResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BufferError::InvalidData(format!("seq {}: timestamp '{}': {}", seq, s, e)))
}
