//! Simulated vehicles, engines and transmissions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of vehicles; each has one engine and one transmission.
pub const FLEET_SIZE: usize = 3;

/// Values a vehicle status stream can take.
pub const VEHICLE_STATUSES: [&str; 4] = ["Driving", "Idling", "Parked", "Servicing"];

const RPM_RANGE: (f64, f64) = (650.0, 6200.0);
const COOLANT_RANGE: (f64, f64) = (70.0, 112.0);
const SPEED_RANGE: (f64, f64) = (0.0, 130.0);

/// Simulated sampling period used to advance the odometer.
const SAMPLE_PERIOD_HOURS: f64 = 10.0 / 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Diesel,
    Gasoline,
    Hybrid,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diesel => "diesel",
            Self::Gasoline => "gasoline",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Stable asset index, e.g. `Vehicle1`.
    pub index: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub vin: String,
    pub speed_kph: f64,
    pub odometer_km: f64,
    pub status: String,
    pub float_value: f64,
    pub int_value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub index: String,
    pub name: String,
    pub kind: EngineKind,
    pub serial_number: String,
    pub rpm: f64,
    pub coolant_temp_c: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    pub index: String,
    pub name: String,
    pub serial_number: String,
    pub gears: u8,
}

/// The whole simulated fleet plus its random source.
pub struct Fleet {
    vehicles: Vec<Vehicle>,
    engines: Vec<Engine>,
    transmissions: Vec<Transmission>,
    rng: StdRng,
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new()
    }
}

impl Fleet {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic fleet for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: StdRng) -> Self {
        const MAKES: [(&str, &str); FLEET_SIZE] =
            [("Kenworth", "T680"), ("Volvo", "VNL 860"), ("Freightliner", "Cascadia")];
        const KINDS: [EngineKind; FLEET_SIZE] =
            [EngineKind::Diesel, EngineKind::Gasoline, EngineKind::Hybrid];

        let mut vehicles = Vec::with_capacity(FLEET_SIZE);
        let mut engines = Vec::with_capacity(FLEET_SIZE);
        let mut transmissions = Vec::with_capacity(FLEET_SIZE);

        for n in 1..=FLEET_SIZE {
            let (make, model) = MAKES[n - 1];
            vehicles.push(Vehicle {
                index: format!("Vehicle{}", n),
                name: format!("Vehicle {}", n),
                make: make.to_string(),
                model: model.to_string(),
                vin: format!("1OMF{:013}", rng.gen_range(0..10_000_000_000_000u64)),
                speed_kph: 0.0,
                odometer_km: rng.gen_range(1_000.0..250_000.0),
                status: VEHICLE_STATUSES[2].to_string(),
                float_value: rng.gen_range(0.0..100.0),
                int_value: rng.gen_range(0..1_000),
            });
            engines.push(Engine {
                index: format!("Engine{}", n),
                name: format!("Engine {}", n),
                kind: KINDS[n - 1],
                serial_number: format!("E{}-{:06}", n, rng.gen_range(0..1_000_000)),
                rpm: RPM_RANGE.0,
                coolant_temp_c: COOLANT_RANGE.0,
            });
            transmissions.push(Transmission {
                index: format!("Transmission{}", n),
                name: format!("Transmission {}", n),
                serial_number: format!("T{}-{:06}", n, rng.gen_range(0..1_000_000)),
                gears: [10, 12, 18][n - 1],
            });
        }

        Self {
            vehicles,
            engines,
            transmissions,
            rng,
        }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    pub fn transmissions(&self) -> &[Transmission] {
        &self.transmissions
    }

    pub fn transmission_mut(&mut self, index: usize) -> Option<&mut Transmission> {
        self.transmissions.get_mut(index)
    }

    /// Move every simulated value one sampling period forward.
    pub fn advance(&mut self) {
        let rng = &mut self.rng;

        for engine in &mut self.engines {
            engine.rpm = drift(rng, engine.rpm, 400.0, RPM_RANGE);
            engine.coolant_temp_c = drift(rng, engine.coolant_temp_c, 3.0, COOLANT_RANGE);
        }

        for vehicle in &mut self.vehicles {
            vehicle.speed_kph = drift(rng, vehicle.speed_kph, 15.0, SPEED_RANGE);
            vehicle.odometer_km += vehicle.speed_kph * SAMPLE_PERIOD_HOURS;
            vehicle.status = if vehicle.speed_kph > 5.0 {
                VEHICLE_STATUSES[0].to_string()
            } else {
                VEHICLE_STATUSES[rng.gen_range(1..VEHICLE_STATUSES.len())].to_string()
            };
            vehicle.float_value = rng.gen_range(0.0..100.0);
            vehicle.int_value = rng.gen_range(0..1_000);
        }
    }
}

/// Random walk step clamped to `range`.
fn drift(rng: &mut StdRng, value: f64, step: f64, range: (f64, f64)) -> f64 {
    (value + rng.gen_range(-step..=step)).clamp(range.0, range.1)
}
