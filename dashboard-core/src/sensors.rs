//! Expansion of the single upstream "current" reading into dashboard sensors.
//!
//! The simulated mode is not physical data: it fans one reading out into several
//! jittered copies so the multi-sensor UI has something to show.

use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{model::CurrentWeatherRecord, normalize::CurrentReading};

pub const SIMULATED_SENSOR_IDS: [&str; 3] = ["sensor1", "sensor2", "sensor3"];

pub const TEMPERATURE_SPREAD: f64 = 1.0;
pub const HUMIDITY_SPREAD: f64 = 2.5;
pub const PRESSURE_SPREAD: f64 = 5.0;

/// Source of uniform offsets in `[-spread, spread]`.
pub trait NoiseSource: Send + Sync + Debug {
    fn offset(&self, spread: f64) -> f64;
}

/// Thread-local randomness, used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadNoise;

impl NoiseSource for ThreadNoise {
    fn offset(&self, spread: f64) -> f64 {
        rand::rng().random_range(-spread..=spread)
    }
}

/// Reproducible noise for tests and demos.
#[derive(Debug)]
pub struct SeededNoise(Mutex<StdRng>);

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl NoiseSource for SeededNoise {
    fn offset(&self, spread: f64) -> f64 {
        let mut rng = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(-spread..=spread)
    }
}

#[derive(Debug, Clone, Default)]
pub enum SensorMode {
    /// One record, upstream values verbatim.
    #[default]
    Single,
    Simulated(Arc<dyn NoiseSource>),
}

impl SensorMode {
    pub fn simulated() -> Self {
        SensorMode::Simulated(Arc::new(ThreadNoise))
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, SensorMode::Simulated(_))
    }

    pub fn expand(&self, reading: CurrentReading) -> Vec<CurrentWeatherRecord> {
        match self {
            SensorMode::Single => vec![CurrentWeatherRecord {
                sensor_id: SIMULATED_SENSOR_IDS[0].to_string(),
                temperature: reading.temperature,
                humidity: reading.humidity,
                pressure: reading.pressure,
            }],
            SensorMode::Simulated(noise) => SIMULATED_SENSOR_IDS
                .iter()
                .map(|id| CurrentWeatherRecord {
                    sensor_id: (*id).to_string(),
                    temperature: reading.temperature + noise.offset(TEMPERATURE_SPREAD),
                    humidity: reading.humidity + noise.offset(HUMIDITY_SPREAD),
                    pressure: reading.pressure + noise.offset(PRESSURE_SPREAD),
                })
                .collect(),
        }
    }
}
