//! The immutable unit of transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// OMF message category, sent as the `messagetype` header.
///
/// The declaration order is also the dependency order: a container
/// references a type, and data is written into containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Type,
    Container,
    Data,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Container => "container",
            Self::Data => "data",
        }
    }

    /// Parse a header value; unlike settings, an unknown category is never
    /// defaulted because a buffered message must replay exactly as written.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "type" => Some(Self::Type),
            "container" => Some(Self::Container),
            "data" => Some(Self::Data),
            _ => None,
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OMF action, sent as the `action` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAction {
    Create,
    Update,
}

impl MessageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

impl fmt::Display for MessageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw fields of a message, used to rebuild one that was persisted.
#[derive(Debug, Clone)]
pub struct MessageParts {
    pub message_id: Uuid,
    pub category: MessageCategory,
    pub action: MessageAction,
    pub label: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

/// A fully formed OMF message.
///
/// The payload is produced by an external builder before construction and
/// never changes afterwards; all fields are private and read through getters.
/// Only the `label` is meant to appear in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    message_id: Uuid,
    category: MessageCategory,
    action: MessageAction,
    label: String,
    payload: String,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message stamped with a fresh id and the current time.
    pub fn new(
        category: MessageCategory,
        action: MessageAction,
        label: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            category,
            action,
            label: label.into(),
            payload: payload.into(),
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a `Data`/`Create` message, the bulk of steady-state traffic.
    pub fn data(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(MessageCategory::Data, MessageAction::Create, label, payload)
    }

    /// Rebuild a message from persisted fields, keeping its original identity.
    pub fn from_parts(parts: MessageParts) -> Self {
        Self {
            message_id: parts.message_id,
            category: parts.category,
            action: parts.action,
            label: parts.label,
            payload: parts.payload,
            created_at: parts.created_at,
        }
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn category(&self) -> MessageCategory {
        self.category
    }

    pub fn action(&self) -> MessageAction {
        self.action
    }

    /// Human-readable label, e.g. "Stream (Engine RPM) message".
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
