//! Durable FIFO buffer for the OMF relay publisher.
//!
//! Messages that could not reach the relay are written to a single SQLite
//! file (WAL journal) and replayed strictly in arrival order once the relay
//! recovers. A record leaves the buffer only after a replay of it was
//! delivered, or after the relay refused it, in which case it is moved to
//! the `rejected_messages` table.
//!
//! ```ignore
//! let buffer = BufferStore::open(&paths.buffer_file())?;
//! buffer.enqueue(&message)?;
//! let report = buffer.drain_once(|m| async move { attempt.attempt(&m).await }).await?;
//! ```

mod error;
mod migrations;
mod store;

pub use error::{BufferError, BufferResult};
pub use store::{BufferRecord, BufferStore, DrainReport, HaltedOn};
