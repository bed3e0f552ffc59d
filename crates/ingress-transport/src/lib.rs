//! Transport layer for the OMF relay publisher.
//!
//! This crate provides:
//! - `Transport`: the one-request seam the publisher talks to
//! - `ServerParams`: connection parameters fixed for the process lifetime
//! - `HttpsTransport`: reqwest-backed implementation with OMF headers
//!
//! A transport never retries. It reports either the HTTP status it received
//! or a `TransportError` meaning no response was obtained; retry policy
//! belongs to the publisher.

mod error;
mod https;
mod params;

pub use error::{TransportError, TransportResult};
pub use https::HttpsTransport;
pub use params::{ServerParams, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

use async_trait::async_trait;
use omf_protocol_types::Message;

/// Sends one serialized message and reports the HTTP status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &Message) -> TransportResult<u16>;
}
