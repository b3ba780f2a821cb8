//! Feature construction shared by training, the prediction API and the CLI.
//!
//! The model consumes a fixed-order numeric vector:
//! `[AMBIENT_TEMPERATURE, IRRADIATION, MODULE_TEMPERATURE, HUMIDITY,
//! CLOUD_COVER, WIND_SPEED, SYSTEM_CAPACITY_W, CITY_<c1>, CITY_<c2>, ...]`
//! with one one-hot slot per trained city in lexicographic order.

/// Weather and system inputs with range validation.
pub mod observation;
/// Trained city set and the feature schema derived from it.
pub mod schema;
/// Ordered feature vector produced by the schema.
pub mod vector;

pub use observation::{InputError, SystemConfig, WeatherObservation};
pub use schema::{FeatureSchema, TrainedCitySet, UnknownCityPolicy};
pub use vector::{Feature, FeatureVector};

/// Panel heating per kW/m² of irradiation (°C).
pub const IRRADIATION_HEATING_C: f64 = 25.0;
/// Panel cooling per km/h of wind (°C).
pub const WIND_COOLING_C: f64 = 0.2;

/// Estimates photovoltaic module temperature (°C).
///
/// `module = ambient + irradiation * 25 - wind_speed * 0.2`
///
/// Serving code passes the observed irradiation; corpus generation passes
/// the cloud-discounted effective irradiation instead (see [`crate::label`]).
pub fn module_temperature(ambient_temp_c: f64, irradiation_kw_m2: f64, wind_speed_kmh: f64) -> f64 {
    ambient_temp_c + (irradiation_kw_m2 * IRRADIATION_HEATING_C) - (wind_speed_kmh * WIND_COOLING_C)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_temperature_reference_point() {
        let t = module_temperature(28.0, 0.75, 10.0);
        assert!((t - 44.75).abs() < 1e-12, "got {t}");
    }

    #[test]
    fn module_temperature_without_sun_or_wind_is_ambient() {
        assert_eq!(module_temperature(21.5, 0.0, 0.0), 21.5);
    }

    #[test]
    fn wind_cools_the_module() {
        let calm = module_temperature(30.0, 1.0, 0.0);
        let windy = module_temperature(30.0, 1.0, 50.0);
        assert!((calm - windy - 10.0).abs() < 1e-9);
    }
}
