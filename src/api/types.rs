//! API request and response bodies.

use serde::{Deserialize, Serialize};

use crate::features::{InputError, SystemConfig, WeatherObservation};

/// Body of `POST /predict` and `POST /predict/summary`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictRequest {
    pub city: String,
    /// °C.
    pub ambient_temp: f64,
    /// kW/m².
    pub irradiation: f64,
    /// %.
    pub humidity: u8,
    /// %.
    pub cloud_cover: u8,
    /// km/h.
    pub wind_speed: u8,
    /// kW.
    pub system_capacity: f64,
}

impl PredictRequest {
    /// Splits the request into validated model inputs.
    ///
    /// # Errors
    ///
    /// Returns every out-of-range field, not just the first.
    pub fn into_inputs(self) -> Result<(WeatherObservation, SystemConfig), Vec<InputError>> {
        let weather = WeatherObservation {
            ambient_temp: self.ambient_temp,
            irradiation: self.irradiation,
            humidity: self.humidity,
            cloud_cover: self.cloud_cover,
            wind_speed: self.wind_speed,
        };
        let mut errors = weather.validate();
        match SystemConfig::new(self.city, self.system_capacity) {
            Ok(system) if errors.is_empty() => Ok((weather, system)),
            Ok(_) => Err(errors),
            Err(e) => {
                errors.push(e);
                Err(errors)
            }
        }
    }
}

/// Body of a successful `POST /predict`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_power_kw: f64,
    pub message: String,
}

/// Body of `GET /cities`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CitiesResponse {
    pub cities: Vec<String>,
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Per-field problems for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<InputError>,
}
