//! One transport call, classified.

use ingress_transport::{Transport, TransportResult};
use omf_protocol_types::{DeliveryOutcome, Message, UnreachableCause};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Map a transport result to a delivery outcome.
///
/// | result            | outcome                          |
/// |-------------------|----------------------------------|
/// | transport error   | Unreachable (transport failure)  |
/// | 200, 202, 204     | Delivered                        |
/// | 503               | Unreachable (service unavailable)|
/// | any other status  | Rejected                         |
pub fn classify(result: &TransportResult<u16>) -> DeliveryOutcome {
    match result {
        Err(e) => DeliveryOutcome::Unreachable {
            cause: UnreachableCause::Transport(e.to_string()),
        },
        Ok(code @ (200 | 202 | 204)) => DeliveryOutcome::Delivered { status_code: *code },
        Ok(503) => DeliveryOutcome::Unreachable {
            cause: UnreachableCause::ServiceUnavailable,
        },
        Ok(code) => DeliveryOutcome::Rejected { status_code: *code },
    }
}

/// Sends a message once and reports what happened.
///
/// Never retries and never buffers. Only the message label and id are
/// logged; payloads can be large and carry customer data.
#[derive(Clone)]
pub struct DeliveryAttempt {
    transport: Arc<dyn Transport>,
}

impl DeliveryAttempt {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn attempt(&self, message: &Message) -> DeliveryOutcome {
        let result = self.transport.send(message).await;
        let outcome = classify(&result);

        match &outcome {
            DeliveryOutcome::Delivered { status_code } => info!(
                label = message.label(),
                message_id = %message.message_id(),
                status = status_code,
                "Message delivered"
            ),
            DeliveryOutcome::Unreachable { cause } => warn!(
                label = message.label(),
                message_id = %message.message_id(),
                outcome = outcome.numeric_code(),
                cause = %cause,
                "Relay unreachable"
            ),
            DeliveryOutcome::Rejected { status_code } => error!(
                label = message.label(),
                message_id = %message.message_id(),
                status = status_code,
                "Message rejected by relay"
            ),
        }

        outcome
    }
}
