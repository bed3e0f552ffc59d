//! Payload selectors and the builder interface the publisher consumes.

use std::fmt;
use thiserror::Error;

/// Real-time measurement streams published per asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    EngineRpm,
    EngineCoolantTemp,
    VehicleMeasurements,
    VehicleStatus,
    VehicleFloat,
    VehicleInt,
}

impl Measurement {
    pub const ALL: [Measurement; 6] = [
        Measurement::EngineRpm,
        Measurement::EngineCoolantTemp,
        Measurement::VehicleMeasurements,
        Measurement::VehicleStatus,
        Measurement::VehicleFloat,
        Measurement::VehicleInt,
    ];

    /// Display name used in step labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::EngineRpm => "Engine RPM",
            Self::EngineCoolantTemp => "Engine CoolantTemp",
            Self::VehicleMeasurements => "Vehicle Meas",
            Self::VehicleStatus => "Vehicle Status",
            Self::VehicleFloat => "Vehicle Float",
            Self::VehicleInt => "Vehicle Int",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Static links between assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetLink {
    VehicleEngine,
    VehicleTransmission,
    /// `_ROOT` to each vehicle; sent last so the hierarchy appears complete.
    RootVehicle,
}

/// Selects which payload a builder should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadSelector {
    Types,
    Containers(Measurement),
    VehicleAssets,
    EngineAssets,
    TransmissionAssets,
    AssetLinks(AssetLink),
    ValueLinks(Measurement),
}

/// Payload construction failure.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to build for {0}")]
    Empty(String),
}

/// Produces the serialized body for a selector.
///
/// Implementations embed current simulated values at call time, so two calls
/// may return different bodies; the publisher wraps each result in a fresh
/// [`Message`](crate::Message).
pub trait PayloadBuilder: Send + Sync {
    fn build(&self, selector: PayloadSelector) -> Result<String, PayloadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_measurements_are_distinct() {
        let names: std::collections::HashSet<_> =
            Measurement::ALL.iter().map(|m| m.display_name()).collect();
        assert_eq!(names.len(), Measurement::ALL.len());
    }

    #[test]
    fn empty_error_display() {
        let err = PayloadError::Empty("engine assets".into());
        assert_eq!(err.to_string(), "Nothing to build for engine assets");
    }
}
