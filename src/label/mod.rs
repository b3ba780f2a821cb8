//! Synthetic DC power labels for the training corpus.
//!
//! Runs offline only. Each complete historical weather row is simulated once
//! per candidate system capacity:
//!
//! ```text
//! irradiation  = W/m² / 1000
//! effective    = irradiation * (1 - cloud_cover/100 * 0.75)
//! module_temp  = ambient + effective * 25 - wind_speed * 0.2
//! dc_power     = effective * capacity_w * (1 - (module_temp - 25) * 0.004) * noise
//! ```
//!
//! with `noise` uniform in `[0.95, 1.05]` and the result clamped at 0.

pub mod impute;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::features::module_temperature;
pub use impute::{CompleteWeather, impute_city_means};

/// Maximum fraction of irradiation removed by full cloud cover.
pub const CLOUD_ATTENUATION: f64 = 0.75;
/// Power loss per °C of module temperature above reference.
pub const TEMPERATURE_COEFFICIENT: f64 = 0.004;
/// Reference module temperature (°C).
pub const REFERENCE_TEMP_C: f64 = 25.0;
/// Half-width of the multiplicative measurement jitter.
pub const NOISE_HALF_WIDTH: f64 = 0.05;

/// One row of the training corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TrainingRow {
    pub date_time: String,
    pub ambient_temperature: f64,
    /// kW/m².
    pub irradiation: f64,
    pub humidity: f64,
    pub cloud_cover: f64,
    pub wind_speed: f64,
    pub city: String,
    pub system_capacity_w: f64,
    /// Derived from effective irradiation, not the raw value.
    pub module_temperature: f64,
    /// Label (W).
    pub dc_power: f64,
}

/// Irradiation left after cloud attenuation (kW/m²).
pub fn effective_irradiation(irradiation_kw_m2: f64, cloud_cover_pct: f64) -> f64 {
    irradiation_kw_m2 * (1.0 - (cloud_cover_pct / 100.0) * CLOUD_ATTENUATION)
}

/// Simulated DC power (W) for a given noise multiplier, clamped at 0.
pub fn dc_power(effective_kw_m2: f64, module_temp_c: f64, capacity_w: f64, noise: f64) -> f64 {
    let derate = 1.0 - (module_temp_c - REFERENCE_TEMP_C) * TEMPERATURE_COEFFICIENT;
    ((effective_kw_m2 * capacity_w) * derate * noise).max(0.0)
}

/// Seeded label generator; the same seed yields the same corpus.
#[derive(Debug, Clone)]
pub struct LabelGenerator {
    rng: StdRng,
}

impl LabelGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a multiplicative jitter in `[1 - 0.05, 1 + 0.05)`.
    fn noise(&mut self) -> f64 {
        1.0 + (self.rng.random::<f64>() - 0.5) * (2.0 * NOISE_HALF_WIDTH)
    }

    /// Simulates one labelled row for a weather row and a capacity (W).
    pub fn label(&mut self, weather: &CompleteWeather, capacity_w: f64) -> TrainingRow {
        let irradiation = weather.irradiation_w_m2 / 1000.0;
        let effective = effective_irradiation(irradiation, weather.cloud_cover);
        let module_temp =
            module_temperature(weather.ambient_temperature, effective, weather.wind_speed);
        let noise = self.noise();

        TrainingRow {
            date_time: weather.date_time.clone(),
            ambient_temperature: weather.ambient_temperature,
            irradiation,
            humidity: weather.humidity,
            cloud_cover: weather.cloud_cover,
            wind_speed: weather.wind_speed,
            city: weather.city.clone(),
            system_capacity_w: capacity_w,
            module_temperature: module_temp,
            dc_power: dc_power(effective, module_temp, capacity_w, noise),
        }
    }

    /// Builds the multi-capacity corpus: every weather row once per
    /// capacity, grouped by capacity in the order given.
    pub fn build_corpus(
        &mut self,
        weather: &[CompleteWeather],
        capacities_w: &[f64],
    ) -> Vec<TrainingRow> {
        let mut corpus = Vec::with_capacity(weather.len() * capacities_w.len());
        for &capacity in capacities_w {
            tracing::info!(capacity_kw = capacity / 1000.0, rows = weather.len(), "simulating");
            corpus.extend(weather.iter().map(|w| self.label(w, capacity)));
        }
        corpus
    }
}
