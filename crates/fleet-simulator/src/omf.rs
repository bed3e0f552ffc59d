//! OMF 1.0 JSON bodies for the simulated fleet.

use crate::fleet::{Engine, Fleet, Transmission, Vehicle};
use chrono::{DateTime, SecondsFormat, Utc};
use omf_protocol_types::{AssetLink, Measurement};
use serde_json::{json, Value};

pub const VEHICLE_TYPE: &str = "Vehicle";
pub const ENGINE_TYPE: &str = "Engine";
pub const TRANSMISSION_TYPE: &str = "Transmission";

/// Type id of the built-in OMF link type.
const LINK_TYPE: &str = "__Link";

/// Index of the asset hierarchy root.
const ROOT_INDEX: &str = "_ROOT";

/// Which asset a measurement stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Engine,
    Vehicle,
}

pub fn owner(measurement: Measurement) -> Owner {
    match measurement {
        Measurement::EngineRpm | Measurement::EngineCoolantTemp => Owner::Engine,
        Measurement::VehicleMeasurements
        | Measurement::VehicleStatus
        | Measurement::VehicleFloat
        | Measurement::VehicleInt => Owner::Vehicle,
    }
}

/// Dynamic type id of a measurement stream.
pub fn type_id(measurement: Measurement) -> &'static str {
    match measurement {
        Measurement::EngineRpm => "EngineRpm",
        Measurement::EngineCoolantTemp => "EngineCoolantTemp",
        Measurement::VehicleMeasurements => "VehicleMeasurements",
        Measurement::VehicleStatus => "VehicleStatus",
        Measurement::VehicleFloat => "VehicleFloat",
        Measurement::VehicleInt => "VehicleInt",
    }
}

/// Container holding one asset's values for a measurement.
pub fn container_id(asset_index: &str, measurement: Measurement) -> String {
    format!("{}_{}", asset_index, type_id(measurement))
}

/// Indexes of the assets that own `measurement` streams.
pub fn owner_indexes(fleet: &Fleet, measurement: Measurement) -> Vec<&str> {
    match owner(measurement) {
        Owner::Engine => fleet.engines().iter().map(|e| e.index.as_str()).collect(),
        Owner::Vehicle => fleet.vehicles().iter().map(|v| v.index.as_str()).collect(),
    }
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn dynamic_type(id: &str, value_properties: Value) -> Value {
    let mut properties = json!({
        "timestamp": { "type": "string", "format": "date-time", "isindex": true }
    });
    if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), value_properties) {
        target.extend(extra);
    }
    json!({
        "id": id,
        "type": "object",
        "classification": "dynamic",
        "properties": properties
    })
}

/// Every static and dynamic type the fleet uses.
pub fn type_definitions() -> Value {
    json!([
        {
            "id": VEHICLE_TYPE,
            "type": "object",
            "classification": "static",
            "properties": {
                "index": { "type": "string", "isindex": true },
                "name": { "type": "string", "isname": true },
                "make": { "type": "string" },
                "model": { "type": "string" },
                "vin": { "type": "string" }
            }
        },
        {
            "id": ENGINE_TYPE,
            "type": "object",
            "classification": "static",
            "properties": {
                "index": { "type": "string", "isindex": true },
                "name": { "type": "string", "isname": true },
                "kind": { "type": "string" },
                "serial_number": { "type": "string" }
            }
        },
        {
            "id": TRANSMISSION_TYPE,
            "type": "object",
            "classification": "static",
            "properties": {
                "index": { "type": "string", "isindex": true },
                "name": { "type": "string", "isname": true },
                "serial_number": { "type": "string" },
                "gears": { "type": "integer" }
            }
        },
        dynamic_type(type_id(Measurement::EngineRpm), json!({
            "rpm": { "type": "number", "format": "float64" }
        })),
        dynamic_type(type_id(Measurement::EngineCoolantTemp), json!({
            "coolant_temp": { "type": "number", "format": "float64" }
        })),
        dynamic_type(type_id(Measurement::VehicleMeasurements), json!({
            "speed": { "type": "number", "format": "float64" },
            "odometer": { "type": "number", "format": "float64" }
        })),
        dynamic_type(type_id(Measurement::VehicleStatus), json!({
            "status": { "type": "string" }
        })),
        dynamic_type(type_id(Measurement::VehicleFloat), json!({
            "value": { "type": "number", "format": "float64" }
        })),
        dynamic_type(type_id(Measurement::VehicleInt), json!({
            "value": { "type": "integer", "format": "int64" }
        })),
    ])
}

pub fn containers(fleet: &Fleet, measurement: Measurement) -> Value {
    let containers: Vec<Value> = owner_indexes(fleet, measurement)
        .into_iter()
        .map(|index| {
            json!({
                "id": container_id(index, measurement),
                "typeid": type_id(measurement)
            })
        })
        .collect();
    Value::Array(containers)
}

pub fn vehicle_assets(vehicles: &[Vehicle]) -> Value {
    let values: Vec<Value> = vehicles
        .iter()
        .map(|v| {
            json!({
                "index": v.index,
                "name": v.name,
                "make": v.make,
                "model": v.model,
                "vin": v.vin
            })
        })
        .collect();
    json!([{ "typeid": VEHICLE_TYPE, "values": values }])
}

pub fn engine_assets(engines: &[Engine]) -> Value {
    let values: Vec<Value> = engines
        .iter()
        .map(|e| {
            json!({
                "index": e.index,
                "name": e.name,
                "kind": e.kind,
                "serial_number": e.serial_number
            })
        })
        .collect();
    json!([{ "typeid": ENGINE_TYPE, "values": values }])
}

pub fn transmission_assets(transmissions: &[Transmission]) -> Value {
    let values: Vec<Value> = transmissions
        .iter()
        .map(|t| {
            json!({
                "index": t.index,
                "name": t.name,
                "serial_number": t.serial_number,
                "gears": t.gears
            })
        })
        .collect();
    json!([{ "typeid": TRANSMISSION_TYPE, "values": values }])
}

fn static_ref(type_id: &str, index: &str) -> Value {
    json!({ "typeid": type_id, "index": index })
}

pub fn asset_links(fleet: &Fleet, link: AssetLink) -> Value {
    let values: Vec<Value> = fleet
        .vehicles()
        .iter()
        .enumerate()
        .filter_map(|(i, vehicle)| {
            let (source, target) = match link {
                AssetLink::VehicleEngine => (
                    static_ref(VEHICLE_TYPE, &vehicle.index),
                    static_ref(ENGINE_TYPE, &fleet.engines().get(i)?.index),
                ),
                AssetLink::VehicleTransmission => (
                    static_ref(VEHICLE_TYPE, &vehicle.index),
                    static_ref(TRANSMISSION_TYPE, &fleet.transmissions().get(i)?.index),
                ),
                AssetLink::RootVehicle => (
                    static_ref(VEHICLE_TYPE, ROOT_INDEX),
                    static_ref(VEHICLE_TYPE, &vehicle.index),
                ),
            };
            Some(json!({ "source": source, "target": target }))
        })
        .collect();
    json!([{ "typeid": LINK_TYPE, "values": values }])
}

pub fn value_links(fleet: &Fleet, measurement: Measurement) -> Value {
    let owner_type = match owner(measurement) {
        Owner::Engine => ENGINE_TYPE,
        Owner::Vehicle => VEHICLE_TYPE,
    };
    let values: Vec<Value> = owner_indexes(fleet, measurement)
        .into_iter()
        .map(|index| {
            json!({
                "source": static_ref(owner_type, index),
                "target": { "containerid": container_id(index, measurement) }
            })
        })
        .collect();
    json!([{ "typeid": LINK_TYPE, "values": values }])
}

/// Current value record of one asset for a measurement, `None` for an
/// unknown asset position.
pub fn sample_value(
    fleet: &Fleet,
    measurement: Measurement,
    position: usize,
    at: DateTime<Utc>,
) -> Option<Value> {
    let ts = timestamp(at);
    let value = match measurement {
        Measurement::EngineRpm => {
            let engine = fleet.engines().get(position)?;
            json!({ "timestamp": ts, "rpm": engine.rpm })
        }
        Measurement::EngineCoolantTemp => {
            let engine = fleet.engines().get(position)?;
            json!({ "timestamp": ts, "coolant_temp": engine.coolant_temp_c })
        }
        Measurement::VehicleMeasurements => {
            let vehicle = fleet.vehicles().get(position)?;
            json!({ "timestamp": ts, "speed": vehicle.speed_kph, "odometer": vehicle.odometer_km })
        }
        Measurement::VehicleStatus => {
            let vehicle = fleet.vehicles().get(position)?;
            json!({ "timestamp": ts, "status": vehicle.status })
        }
        Measurement::VehicleFloat => {
            let vehicle = fleet.vehicles().get(position)?;
            json!({ "timestamp": ts, "value": vehicle.float_value })
        }
        Measurement::VehicleInt => {
            let vehicle = fleet.vehicles().get(position)?;
            json!({ "timestamp": ts, "value": vehicle.int_value })
        }
    };
    Some(value)
}

/// One data entry per owning asset, each with its current value.
pub fn stream_values(fleet: &Fleet, measurement: Measurement, at: DateTime<Utc>) -> Value {
    let entries: Vec<Value> = owner_indexes(fleet, measurement)
        .into_iter()
        .enumerate()
        .filter_map(|(position, index)| {
            let value = sample_value(fleet, measurement, position, at)?;
            Some(json!({
                "containerid": container_id(index, measurement),
                "values": [value]
            }))
        })
        .collect();
    Value::Array(entries)
}
