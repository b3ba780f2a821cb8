//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;
use std::path::Path;

use sunsight::config::{AppConfig, CorpusConfig, ModelConfig, TrainingConfig};
use sunsight::features::{SystemConfig, WeatherObservation};
use sunsight::weather::WeatherRecord;

/// Cities present in the fixture weather table.
pub const FIXTURE_CITIES: [&str; 3] = ["Delhi", "Mumbai", "Chennai"];

/// Three days of hourly weather for [`FIXTURE_CITIES`].
///
/// Irradiation follows a half-sine between 06:00 and 18:00 (W/m²). Delhi
/// is missing irradiation at noon on the second day so imputation has
/// something to fill.
pub fn weather_records() -> Vec<WeatherRecord> {
    let mut records = Vec::new();
    for (idx, city) in FIXTURE_CITIES.iter().enumerate() {
        let base_temp = 24.0 + idx as f64 * 3.0;
        for day in 1..=3 {
            for hour in 0..24 {
                let sun = if (6..=18).contains(&hour) {
                    ((hour as f64 - 6.0) / 12.0 * PI).sin().max(0.0)
                } else {
                    0.0
                };
                let irradiation = if *city == "Delhi" && day == 2 && hour == 12 {
                    None
                } else {
                    Some(850.0 * sun)
                };
                records.push(WeatherRecord {
                    date_time: format!("2024-04-{day:02}T{hour:02}:00"),
                    ambient_temperature: Some(base_temp + 8.0 * sun),
                    irradiation,
                    humidity: Some(55.0 + idx as f64 * 10.0),
                    cloud_cover: Some(f64::from(day) * 15.0),
                    wind_speed: Some(6.0 + hour as f64 * 0.2),
                    city: city.to_string(),
                });
            }
        }
    }
    records
}

/// Config with every artifact under `dir` and a small, fast forest.
pub fn config_in(dir: &Path) -> AppConfig {
    AppConfig {
        model: ModelConfig {
            model_path: dir.join("solar_model.bin"),
            metadata_path: dir.join("model_metadata.json"),
        },
        corpus: CorpusConfig {
            weather_path: dir.join("weather.csv"),
            corpus_path: dir.join("corpus.csv"),
            ..CorpusConfig::default()
        },
        training: TrainingConfig {
            trees: 10,
            max_depth: Some(10),
            ..TrainingConfig::default()
        },
        ..AppConfig::default()
    }
}

/// Delhi at the dashboard defaults with a 5 kW system.
pub fn delhi_inputs() -> (WeatherObservation, SystemConfig) {
    let weather = WeatherObservation {
        ambient_temp: 28.0,
        irradiation: 0.75,
        humidity: 60,
        cloud_cover: 40,
        wind_speed: 10,
    };
    let system = SystemConfig::new("Delhi", 5.0).expect("valid system");
    (weather, system)
}
