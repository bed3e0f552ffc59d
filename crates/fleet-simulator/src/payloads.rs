//! Payload builder and sample messages backed by the live fleet.

use crate::fleet::Fleet;
use crate::omf;
use chrono::Utc;
use omf_protocol_types::{
    Measurement, Message, MessageAction, MessageCategory, PayloadBuilder, PayloadError,
    PayloadSelector,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::debug;

/// Builds OMF bodies from the current state of a shared [`Fleet`].
pub struct FleetPayloads {
    fleet: Mutex<Fleet>,
}

impl FleetPayloads {
    pub fn new(fleet: Fleet) -> Self {
        Self {
            fleet: Mutex::new(fleet),
        }
    }

    /// Advance the simulation by one sampling period.
    pub fn advance(&self) {
        self.fleet.lock().advance();
    }

    /// Run `f` against the current fleet state.
    pub fn with_fleet<R>(&self, f: impl FnOnce(&Fleet) -> R) -> R {
        f(&*self.fleet.lock())
    }

    /// A single current value of one asset's stream.
    pub fn single_value(
        &self,
        measurement: Measurement,
        position: usize,
    ) -> Result<Message, PayloadError> {
        let fleet = self.fleet.lock();
        let indexes = omf::owner_indexes(&fleet, measurement);
        let index = indexes.get(position).ok_or_else(|| {
            PayloadError::Empty(format!("{} value for asset #{}", measurement, position))
        })?;
        let value = omf::sample_value(&fleet, measurement, position, Utc::now()).ok_or_else(
            || PayloadError::Empty(format!("{} value for asset #{}", measurement, position)),
        )?;

        let body = json!([{
            "containerid": omf::container_id(index, measurement),
            "values": [value]
        }]);
        let label = format!("Value ({}, {})", measurement, index);
        to_message(MessageCategory::Data, MessageAction::Create, label, &body)
    }

    /// Current values of every asset for one stream.
    pub fn batch(&self, measurement: Measurement) -> Result<Message, PayloadError> {
        let body = omf::stream_values(&self.fleet.lock(), measurement, Utc::now());
        let label = format!("Values ({})", measurement);
        to_message(MessageCategory::Data, MessageAction::Create, label, &body)
    }

    /// Current speed and odometer of every vehicle, with their status.
    pub fn vehicle_batch(&self) -> Result<Message, PayloadError> {
        let fleet = self.fleet.lock();
        let now = Utc::now();
        let mut entries = Vec::new();
        for measurement in [Measurement::VehicleMeasurements, Measurement::VehicleStatus] {
            if let Value::Array(values) = omf::stream_values(&fleet, measurement, now) {
                entries.extend(values);
            }
        }
        to_message(
            MessageCategory::Data,
            MessageAction::Create,
            "Values (vehicles)",
            &Value::Array(entries),
        )
    }

    /// Change one transmission's serial number and build the `Update`
    /// message announcing it.
    pub fn transmission_serial_update(
        &self,
        position: usize,
        serial_number: &str,
    ) -> Result<Message, PayloadError> {
        let mut fleet = self.fleet.lock();
        let transmission = fleet.transmission_mut(position).ok_or_else(|| {
            PayloadError::Empty(format!("transmission #{}", position))
        })?;
        transmission.serial_number = serial_number.to_string();
        let updated = transmission.clone();
        debug!(index = %updated.index, serial_number, "Transmission serial number changed");

        let body = omf::transmission_assets(std::slice::from_ref(&updated));
        to_message(
            MessageCategory::Data,
            MessageAction::Update,
            format!("Update ({} serial number)", updated.index),
            &body,
        )
    }
}

impl PayloadBuilder for FleetPayloads {
    fn build(&self, selector: PayloadSelector) -> Result<String, PayloadError> {
        let fleet = self.fleet.lock();
        let body = match selector {
            PayloadSelector::Types => omf::type_definitions(),
            PayloadSelector::Containers(m) => omf::containers(&fleet, m),
            PayloadSelector::VehicleAssets => omf::vehicle_assets(fleet.vehicles()),
            PayloadSelector::EngineAssets => omf::engine_assets(fleet.engines()),
            PayloadSelector::TransmissionAssets => omf::transmission_assets(fleet.transmissions()),
            PayloadSelector::AssetLinks(link) => omf::asset_links(&fleet, link),
            PayloadSelector::ValueLinks(m) => omf::value_links(&fleet, m),
        };

        if body.as_array().is_some_and(|a| a.is_empty()) {
            return Err(PayloadError::Empty(format!("{:?}", selector)));
        }
        Ok(serde_json::to_string(&body)?)
    }
}

fn to_message(
    category: MessageCategory,
    action: MessageAction,
    label: impl Into<String>,
    body: &Value,
) -> Result<Message, PayloadError> {
    let payload = serde_json::to_string(body)?;
    Ok(Message::new(category, action, label, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use omf_protocol_types::AssetLink;

    fn payloads() -> FleetPayloads {
        FleetPayloads::new(Fleet::with_seed(11))
    }

    fn parse(payload: &str) -> Value {
        serde_json::from_str(payload).unwrap()
    }

    #[test]
    fn every_selector_builds_a_json_array() {
        let payloads = payloads();
        let mut selectors = vec![
            PayloadSelector::Types,
            PayloadSelector::VehicleAssets,
            PayloadSelector::EngineAssets,
            PayloadSelector::TransmissionAssets,
            PayloadSelector::AssetLinks(AssetLink::VehicleEngine),
            PayloadSelector::AssetLinks(AssetLink::VehicleTransmission),
            PayloadSelector::AssetLinks(AssetLink::RootVehicle),
        ];
        for m in Measurement::ALL {
            selectors.push(PayloadSelector::Containers(m));
            selectors.push(PayloadSelector::ValueLinks(m));
        }

        for selector in selectors {
            let body = parse(&payloads.build(selector).unwrap());
            assert!(
                body.as_array().is_some_and(|a| !a.is_empty()),
                "{:?} produced {}",
                selector,
                body
            );
        }
    }

    #[test]
    fn single_value_targets_one_container() {
        let message = payloads().single_value(Measurement::EngineRpm, 0).unwrap();
        assert_eq!(message.category(), MessageCategory::Data);
        assert_eq!(message.action(), MessageAction::Create);

        let body = parse(message.payload());
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["containerid"], "Engine1_EngineRpm");
        assert!(body[0]["values"][0]["rpm"].is_f64());
    }

    #[test]
    fn single_value_unknown_asset_fails() {
        let err = payloads()
            .single_value(Measurement::VehicleFloat, 7)
            .unwrap_err();
        assert!(matches!(err, PayloadError::Empty(_)));
    }

    #[test]
    fn batches_cover_every_asset() {
        let payloads = payloads();
        let body = parse(payloads.batch(Measurement::EngineCoolantTemp).unwrap().payload());
        assert_eq!(body.as_array().unwrap().len(), 3);

        let body = parse(payloads.vehicle_batch().unwrap().payload());
        assert_eq!(body.as_array().unwrap().len(), 6);
    }

    #[test]
    fn serial_update_is_an_update_of_one_transmission() {
        let payloads = payloads();
        let message = payloads
            .transmission_serial_update(1, "T_updated_SN")
            .unwrap();
        assert_eq!(message.action(), MessageAction::Update);

        let body = parse(message.payload());
        let values = body[0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["index"], "Transmission2");
        assert_eq!(values[0]["serial_number"], "T_updated_SN");

        let stored = payloads.with_fleet(|f| f.transmissions()[1].serial_number.clone());
        assert_eq!(stored, "T_updated_SN");
    }

    #[test]
    fn advance_changes_values() {
        let payloads = payloads();
        let before = payloads.with_fleet(|f| f.engines()[0].rpm);
        let mut changed = false;
        for _ in 0..20 {
            payloads.advance();
            if payloads.with_fleet(|f| f.engines()[0].rpm) != before {
                changed = true;
                break;
            }
        }
        assert!(changed);
    }
}
