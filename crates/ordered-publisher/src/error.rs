//! Publisher error types.

use crate::publisher::PlanAborted;
use durable_message_buffer::BufferError;
use omf_protocol_types::{MessageCategory, PayloadError};
use thiserror::Error;

/// A plan whose steps violate the Type → Container → Data dependency order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Plan has no steps")]
    Empty,

    #[error("Step {index} ({label}) is a {found} message after a {previous} message")]
    OutOfOrder {
        index: usize,
        label: String,
        previous: MessageCategory,
        found: MessageCategory,
    },
}

/// Publisher error type.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The relay answered with a status that is neither success nor 503.
    #[error("{label}: rejected by relay with status {status}")]
    EndpointRejected { label: String, status: u16 },

    /// The durable buffer could not be read or written.
    #[error("Buffer error: {0}")]
    BufferPersistence(#[from] BufferError),

    #[error("{0}")]
    PlanAborted(Box<PlanAborted>),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),
}

impl PublishError {
    /// True when the failure is confined to the message in hand: it could
    /// not be built, or the relay refused it. Anything else means the
    /// relay or the buffer cannot be relied on.
    pub fn is_message_local(&self) -> bool {
        matches!(self, Self::EndpointRejected { .. } | Self::Payload(_))
    }
}

impl From<PlanAborted> for PublishError {
    fn from(aborted: PlanAborted) -> Self {
        Self::PlanAborted(Box::new(aborted))
    }
}

/// Result type alias using PublishError.
pub type PublishResult<T> = Result<T, PublishError>;
