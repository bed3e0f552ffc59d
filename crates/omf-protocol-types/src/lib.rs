//! Pure OMF relay protocol types.
//!
//! This crate contains only data types: no I/O, no async, no transport. It
//! defines the shared language between the payload builders, the transport,
//! the durable buffer and the publisher.

mod message;
mod outcome;
mod selector;

pub use message::{Message, MessageAction, MessageCategory, MessageParts};
pub use outcome::{DeliveryOutcome, UnreachableCause};
pub use selector::{AssetLink, Measurement, PayloadBuilder, PayloadError, PayloadSelector};

/// Default ingress path on a PI Connector Relay.
pub const DEFAULT_INGRESS_URN: &str = "/ingress/messages";

/// OMF header version sent with every message.
pub const OMF_HEADER_VERSION: &str = "1.0";

/// Message format label sent with every message.
pub const MESSAGE_FORMAT_JSON: &str = "JSON";

/// Header names understood by the ingress endpoint.
pub mod headers {
    pub const PRODUCER_TOKEN: &str = "producertoken";
    pub const MESSAGE_TYPE: &str = "messagetype";
    pub const ACTION: &str = "action";
    pub const MESSAGE_FORMAT: &str = "messageformat";
    pub const OMF_VERSION: &str = "omfversion";
}
