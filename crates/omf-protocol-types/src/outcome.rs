//! Result of a single delivery attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a message could not reach the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnreachableCause {
    /// No HTTP response was obtained (DNS, TCP, TLS, timeout).
    Transport(String),
    /// The endpoint answered 503 and asked us to come back later.
    ServiceUnavailable,
}

impl fmt::Display for UnreachableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "transport failure: {}", detail),
            Self::ServiceUnavailable => f.write_str("service unavailable (503)"),
        }
    }
}

/// Tagged outcome of one transport call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// 200, 202 or 204.
    Delivered { status_code: u16 },
    /// The endpoint understood and declined; not retried automatically.
    Rejected { status_code: u16 },
    /// Retryable: buffer and try again later.
    Unreachable { cause: UnreachableCause },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// HTTP status code, if a response was obtained.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Delivered { status_code } | Self::Rejected { status_code } => Some(*status_code),
            Self::Unreachable {
                cause: UnreachableCause::ServiceUnavailable,
            } => Some(503),
            Self::Unreachable {
                cause: UnreachableCause::Transport(_),
            } => None,
        }
    }

    /// Numeric outcome for log lines: the status code, or -1 without a response.
    pub fn numeric_code(&self) -> i32 {
        self.status_code().map(i32::from).unwrap_or(-1)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered { status_code } => write!(f, "delivered ({})", status_code),
            Self::Rejected { status_code } => write!(f, "rejected ({})", status_code),
            Self::Unreachable { cause } => write!(f, "unreachable: {}", cause),
        }
    }
}
