//! Historical and live weather from Open-Meteo.
//!
//! Response models and their conversion live here; the HTTP client with
//! chunking and retries is in [`client`] behind the `fetch` feature.

#[cfg(feature = "fetch")]
pub mod client;

use serde::{Deserialize, Serialize};

use crate::cities::City;
use crate::features::WeatherObservation;

/// Hourly variables requested from the archive API.
pub const HOURLY_VARIABLES: &str =
    "temperature_2m,shortwave_radiation,relativehumidity_2m,cloudcover,windspeed_10m";
/// Current-conditions variables requested from the forecast API.
pub const CURRENT_VARIABLES: &str =
    "temperature_2m,shortwave_radiation,relative_humidity_2m,cloud_cover,wind_speed_10m";

/// One hourly historical weather row. Irradiation is in W/m² as fetched;
/// missing values stay `None` until imputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct WeatherRecord {
    pub date_time: String,
    pub ambient_temperature: Option<f64>,
    pub irradiation: Option<f64>,
    pub humidity: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed: Option<f64>,
    pub city: String,
}

/// Archive answer for one location.
#[derive(Debug, Deserialize)]
pub struct ArchiveResponse {
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
}

/// The archive API answers a single location with an object and several
/// locations with an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ArchivePayload {
    Many(Vec<ArchiveResponse>),
    One(ArchiveResponse),
}

impl ArchivePayload {
    pub fn into_vec(self) -> Vec<ArchiveResponse> {
        match self {
            Self::Many(v) => v,
            Self::One(r) => vec![r],
        }
    }
}

/// Column-oriented hourly series; every column is aligned with `time`.
#[derive(Debug, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub shortwave_radiation: Vec<Option<f64>>,
    #[serde(default, alias = "relative_humidity_2m")]
    pub relativehumidity_2m: Vec<Option<f64>>,
    #[serde(default, alias = "cloud_cover")]
    pub cloudcover: Vec<Option<f64>>,
    #[serde(default, alias = "wind_speed_10m")]
    pub windspeed_10m: Vec<Option<f64>>,
}

impl HourlySeries {
    /// Converts the columns into rows for `city`. Short columns yield `None`.
    pub fn into_records(self, city: &str) -> Vec<WeatherRecord> {
        let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();
        self.time
            .iter()
            .enumerate()
            .map(|(i, t)| WeatherRecord {
                date_time: t.clone(),
                ambient_temperature: at(&self.temperature_2m, i),
                irradiation: at(&self.shortwave_radiation, i),
                humidity: at(&self.relativehumidity_2m, i),
                cloud_cover: at(&self.cloudcover, i),
                wind_speed: at(&self.windspeed_10m, i),
                city: city.to_string(),
            })
            .collect()
    }
}

/// Forecast API answer with the `current` block.
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub current: CurrentConditions,
}

/// Current conditions at a coordinate.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CurrentConditions {
    pub temperature_2m: f64,
    /// W/m².
    pub shortwave_radiation: f64,
    pub relative_humidity_2m: f64,
    pub cloud_cover: f64,
    pub wind_speed_10m: f64,
}

impl CurrentConditions {
    /// Converts to model units: irradiation to kW/m², percentages and wind
    /// rounded to whole numbers.
    pub fn to_observation(&self) -> WeatherObservation {
        WeatherObservation {
            ambient_temp: self.temperature_2m,
            irradiation: self.shortwave_radiation / 1000.0,
            humidity: self.relative_humidity_2m.round() as u8,
            cloud_cover: self.cloud_cover.round() as u8,
            wind_speed: self.wind_speed_10m.round() as u8,
        }
    }
}

/// Query parameters for one archive request covering `chunk`.
pub fn archive_query(
    chunk: &[&City],
    start_date: &str,
    end_date: &str,
) -> Vec<(&'static str, String)> {
    let join = |f: fn(&City) -> f64| {
        chunk
            .iter()
            .map(|c| format!("{:.2}", f(c)))
            .collect::<Vec<_>>()
            .join(",")
    };
    vec![
        ("latitude", join(|c| c.lat)),
        ("longitude", join(|c| c.lon)),
        ("start_date", start_date.to_string()),
        ("end_date", end_date.to_string()),
        ("hourly", HOURLY_VARIABLES.to_string()),
    ]
}

/// Query parameters for current conditions at a coordinate.
pub fn current_query(lat: f64, lon: f64) -> Vec<(&'static str, String)> {
    vec![
        ("latitude", lat.to_string()),
        ("longitude", lon.to_string()),
        ("current", CURRENT_VARIABLES.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities;

    #[test]
    fn archive_array_converts_to_rows_with_gaps() {
        let json = r#"[
            {"latitude": 28.7, "longitude": 77.1, "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
                "temperature_2m": [12.5, null],
                "shortwave_radiation": [0.0, 0.0],
                "relativehumidity_2m": [80, 82],
                "cloudcover": [10, 12],
                "windspeed_10m": [3.2]
            }},
            {"latitude": 19.07, "longitude": 72.87, "hourly": {"time": []}}
        ]"#;
        let payload: ArchivePayload = serde_json::from_str(json).expect("valid archive JSON");
        let mut results = payload.into_vec();
        assert_eq!(results.len(), 2);

        let rows = results
            .remove(0)
            .hourly
            .map(|h| h.into_records("Delhi"))
            .unwrap_or_default();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ambient_temperature, Some(12.5));
        assert_eq!(rows[1].ambient_temperature, None);
        assert_eq!(rows[1].wind_speed, None);
        assert_eq!(rows[1].humidity, Some(82.0));
        assert_eq!(rows[1].city, "Delhi");
    }

    #[test]
    fn single_location_object_is_accepted() {
        let json = r#"{"hourly": {"time": ["2024-01-01T00:00"], "temperature_2m": [9.0]}}"#;
        let payload: ArchivePayload = serde_json::from_str(json).expect("valid archive JSON");
        assert_eq!(payload.into_vec().len(), 1);
    }

    #[test]
    fn current_conditions_convert_to_kw() {
        let json = r#"{"current": {"time": "2024-06-01T12:00", "interval": 900,
            "temperature_2m": 33.4, "shortwave_radiation": 812.0,
            "relative_humidity_2m": 41, "cloud_cover": 18, "wind_speed_10m": 11.6}}"#;
        let r: CurrentResponse = serde_json::from_str(json).expect("valid current JSON");
        let o = r.current.to_observation();
        assert!((o.irradiation - 0.812).abs() < 1e-12);
        assert_eq!((o.humidity, o.cloud_cover, o.wind_speed), (41, 18, 12));
    }

    #[test]
    fn archive_query_joins_coordinates() {
        let chunk: Vec<&City> = cities::CATALOG.iter().take(2).collect();
        let q = archive_query(&chunk, "2023-01-01", "2025-12-31");
        assert_eq!(q[0], ("latitude", "28.70,19.07".to_string()));
        assert_eq!(q[1], ("longitude", "77.10,72.87".to_string()));
        assert_eq!(q[4].1, HOURLY_VARIABLES);
    }
}
