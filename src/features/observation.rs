use serde::{Deserialize, Serialize};

/// Accepted ambient temperature range (°C).
pub const AMBIENT_TEMP_RANGE: (f64, f64) = (-20.0, 55.0);
/// Accepted irradiation range (kW/m²).
pub const IRRADIATION_RANGE: (f64, f64) = (0.0, 1.5);
/// Accepted system capacity range (kW).
pub const CAPACITY_KW_RANGE: (f64, f64) = (1.0, 100.0);
/// Upper bound for humidity and cloud cover (%).
pub const PERCENT_MAX: u8 = 100;
/// Upper bound for wind speed (km/h).
pub const WIND_SPEED_MAX: u8 = 50;

/// A single input field outside its accepted range.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[error("invalid {field}: {message}")]
pub struct InputError {
    /// Field name as it appears in requests (e.g. `"humidity"`).
    pub field: &'static str,
    /// Human-readable constraint description.
    pub message: String,
}

impl InputError {
    fn out_of_range(field: &'static str, value: f64, (lo, hi): (f64, f64)) -> Self {
        Self {
            field,
            message: format!("{value} is outside [{lo}, {hi}]"),
        }
    }
}

/// Weather conditions at the time of prediction.
///
/// Transient: built per request or per historical row, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Ambient air temperature (°C).
    pub ambient_temp: f64,
    /// Solar irradiation (kW/m²).
    pub irradiation: f64,
    /// Relative humidity (%).
    pub humidity: u8,
    /// Cloud cover (%).
    pub cloud_cover: u8,
    /// Wind speed (km/h).
    pub wind_speed: u8,
}

impl WeatherObservation {
    /// Checks every field against its accepted range.
    ///
    /// Returns an empty vector if the observation is valid. The feature
    /// builder never calls this; it is the caller's job.
    pub fn validate(&self) -> Vec<InputError> {
        let mut errors = Vec::new();

        if !in_range(self.ambient_temp, AMBIENT_TEMP_RANGE) {
            errors.push(InputError::out_of_range(
                "ambient_temp",
                self.ambient_temp,
                AMBIENT_TEMP_RANGE,
            ));
        }
        if !in_range(self.irradiation, IRRADIATION_RANGE) {
            errors.push(InputError::out_of_range(
                "irradiation",
                self.irradiation,
                IRRADIATION_RANGE,
            ));
        }
        if self.humidity > PERCENT_MAX {
            errors.push(InputError {
                field: "humidity",
                message: format!("{} is above {PERCENT_MAX}", self.humidity),
            });
        }
        if self.cloud_cover > PERCENT_MAX {
            errors.push(InputError {
                field: "cloud_cover",
                message: format!("{} is above {PERCENT_MAX}", self.cloud_cover),
            });
        }
        if self.wind_speed > WIND_SPEED_MAX {
            errors.push(InputError {
                field: "wind_speed",
                message: format!("{} is above {WIND_SPEED_MAX}", self.wind_speed),
            });
        }

        errors
    }
}

/// Household installation: where it is and how big it is.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemConfig {
    city: String,
    capacity_kw: f64,
}

impl SystemConfig {
    /// Creates a system configuration.
    ///
    /// # Errors
    ///
    /// Returns an `InputError` if `capacity_kw` is outside 1–100 kW. The
    /// city is not checked here; the schema decides what an unknown city
    /// means.
    pub fn new(city: impl Into<String>, capacity_kw: f64) -> Result<Self, InputError> {
        if !in_range(capacity_kw, CAPACITY_KW_RANGE) {
            return Err(InputError::out_of_range(
                "system_capacity",
                capacity_kw,
                CAPACITY_KW_RANGE,
            ));
        }
        Ok(Self {
            city: city.into(),
            capacity_kw,
        })
    }

    /// City name.
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Rated capacity (kW).
    pub fn capacity_kw(&self) -> f64 {
        self.capacity_kw
    }

    /// Rated capacity (W), the unit the model was trained on.
    pub fn capacity_w(&self) -> f64 {
        self.capacity_kw * 1000.0
    }
}

fn in_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    value.is_finite() && value >= lo && value <= hi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> WeatherObservation {
        WeatherObservation {
            ambient_temp: 28.0,
            irradiation: 0.75,
            humidity: 60,
            cloud_cover: 40,
            wind_speed: 10,
        }
    }

    #[test]
    fn valid_observation_has_no_errors() {
        assert!(obs().validate().is_empty());
    }

    #[test]
    fn reports_every_bad_field() {
        let bad = WeatherObservation {
            ambient_temp: 80.0,
            irradiation: 2.0,
            humidity: 101,
            cloud_cover: 150,
            wind_speed: 51,
        };
        let fields: Vec<_> = bad.validate().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            ["ambient_temp", "irradiation", "humidity", "cloud_cover", "wind_speed"]
        );
    }

    #[test]
    fn nan_irradiation_is_rejected() {
        let mut o = obs();
        o.irradiation = f64::NAN;
        assert_eq!(o.validate().len(), 1);
    }

    #[test]
    fn capacity_bounds_are_inclusive() {
        assert!(SystemConfig::new("Delhi", 1.0).is_ok());
        assert!(SystemConfig::new("Delhi", 100.0).is_ok());
        assert!(SystemConfig::new("Delhi", 0.5).is_err());
        assert!(SystemConfig::new("Delhi", 100.5).is_err());
    }

    #[test]
    fn capacity_converts_to_watts() {
        let sys = SystemConfig::new("Delhi", 5.0).expect("valid capacity");
        assert_eq!(sys.capacity_w(), 5000.0);
        assert_eq!(sys.city(), "Delhi");
    }
}
