//! Recording transport used by the publisher tests.

use async_trait::async_trait;
use ingress_transport::{Transport, TransportError, TransportResult};
use omf_protocol_types::{
    AssetLink, Measurement, Message, PayloadBuilder, PayloadError, PayloadSelector,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Replays scripted results, then answers with a fallback status.
///
/// A fallback of `None` simulates a relay that refuses connections.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<TransportResult<u16>>>,
    fallback: Mutex<Option<u16>>,
    sent: Mutex<Vec<Message>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<TransportResult<u16>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(Some(204)),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// A relay that is down until told otherwise.
    pub fn down() -> Arc<Self> {
        let transport = Self::new(Vec::new());
        transport.set_fallback(None);
        transport
    }

    pub fn set_fallback(&self, status: Option<u16>) {
        *self.fallback.lock() = status;
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    pub fn sent_labels(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|m| m.label().to_string())
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, message: &Message) -> TransportResult<u16> {
        self.sent.lock().push(message.clone());
        if let Some(result) = self.script.lock().pop_front() {
            return result;
        }
        match *self.fallback.lock() {
            Some(status) => Ok(status),
            None => Err(TransportError::Connection("connection refused".to_string())),
        }
    }
}

/// Builds a tiny JSON body naming the selector.
pub struct EchoPayloads;

impl PayloadBuilder for EchoPayloads {
    fn build(&self, selector: PayloadSelector) -> Result<String, PayloadError> {
        let name = match selector {
            PayloadSelector::Types => "types".to_string(),
            PayloadSelector::Containers(m) => format!("containers:{}", m),
            PayloadSelector::VehicleAssets => "vehicles".to_string(),
            PayloadSelector::EngineAssets => "engines".to_string(),
            PayloadSelector::TransmissionAssets => "transmissions".to_string(),
            PayloadSelector::AssetLinks(link) => format!("links:{:?}", link),
            PayloadSelector::ValueLinks(m) => format!("values:{}", m),
        };
        Ok(format!(r#"[{{"selector":"{}"}}]"#, name))
    }
}

/// Fails for one selector, echoes the rest.
pub struct FailingPayloads(pub PayloadSelector);

impl PayloadBuilder for FailingPayloads {
    fn build(&self, selector: PayloadSelector) -> Result<String, PayloadError> {
        if selector == self.0 {
            return Err(PayloadError::Empty(format!("{:?}", selector)));
        }
        EchoPayloads.build(selector)
    }
}

pub const ROOT_LINKS: PayloadSelector = PayloadSelector::AssetLinks(AssetLink::RootVehicle);
pub const RPM_CONTAINERS: PayloadSelector = PayloadSelector::Containers(Measurement::EngineRpm);
