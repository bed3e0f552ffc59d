//! Simulated vehicle fleet for the OMF relay publisher.
//!
//! Three vehicles, each with an engine and a transmission, whose values
//! drift randomly on every [`Fleet::advance`]. [`FleetPayloads`] turns the
//! current state into OMF 1.0 JSON bodies for the definition plan and for
//! the steady-state samples.

mod fleet;
pub mod omf;
mod payloads;

pub use fleet::{Engine, EngineKind, Fleet, Transmission, Vehicle, FLEET_SIZE, VEHICLE_STATUSES};
pub use payloads::FleetPayloads;
