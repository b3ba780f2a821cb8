//! Per-city mean imputation of missing weather values.

use std::collections::HashMap;

use crate::weather::WeatherRecord;

/// A historical weather row with every field present.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteWeather {
    pub date_time: String,
    pub city: String,
    pub ambient_temperature: f64,
    /// W/m², as fetched.
    pub irradiation_w_m2: f64,
    pub humidity: f64,
    pub cloud_cover: f64,
    pub wind_speed: f64,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.count += 1;
        }
    }

    fn get(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Default)]
struct CityMeans {
    ambient_temperature: Mean,
    irradiation: Mean,
    humidity: Mean,
    cloud_cover: Mean,
    wind_speed: Mean,
}

/// Fills missing values with the mean of the same field over the same
/// city's history, then drops rows that are still incomplete.
///
/// A row stays incomplete when its city never reported that field at all,
/// or when its timestamp is blank.
pub fn impute_city_means(records: Vec<WeatherRecord>) -> Vec<CompleteWeather> {
    let mut means: HashMap<String, CityMeans> = HashMap::new();
    for r in &records {
        let m = means.entry(r.city.clone()).or_default();
        m.ambient_temperature.add(r.ambient_temperature);
        m.irradiation.add(r.irradiation);
        m.humidity.add(r.humidity);
        m.cloud_cover.add(r.cloud_cover);
        m.wind_speed.add(r.wind_speed);
    }

    let total = records.len();
    let complete: Vec<CompleteWeather> = records
        .into_iter()
        .filter_map(|r| {
            let m = means.get(&r.city)?;
            let fill =
                |v: Option<f64>, mean: &Mean| v.filter(|v| v.is_finite()).or_else(|| mean.get());
            if r.date_time.trim().is_empty() || r.city.trim().is_empty() {
                return None;
            }
            Some(CompleteWeather {
                ambient_temperature: fill(r.ambient_temperature, &m.ambient_temperature)?,
                irradiation_w_m2: fill(r.irradiation, &m.irradiation)?,
                humidity: fill(r.humidity, &m.humidity)?,
                cloud_cover: fill(r.cloud_cover, &m.cloud_cover)?,
                wind_speed: fill(r.wind_speed, &m.wind_speed)?,
                date_time: r.date_time,
                city: r.city,
            })
        })
        .collect();

    let dropped = total - complete.len();
    if dropped > 0 {
        tracing::warn!(dropped, kept = complete.len(), "dropped incomplete weather rows");
    }
    complete
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(city: &str, temp: Option<f64>, irr: Option<f64>) -> WeatherRecord {
        WeatherRecord {
            date_time: "2024-01-01T10:00".to_string(),
            ambient_temperature: temp,
            irradiation: irr,
            humidity: Some(50.0),
            cloud_cover: Some(20.0),
            wind_speed: Some(8.0),
            city: city.to_string(),
        }
    }

    #[test]
    fn fills_from_own_city_only() {
        let rows = vec![
            rec("Delhi", Some(20.0), Some(100.0)),
            rec("Delhi", Some(30.0), Some(300.0)),
            rec("Delhi", None, None),
            rec("Leh", Some(-5.0), Some(900.0)),
        ];
        let out = impute_city_means(rows);
        assert_eq!(out.len(), 4);
        assert_eq!(out[2].ambient_temperature, 25.0);
        assert_eq!(out[2].irradiation_w_m2, 200.0);
        assert_eq!(out[3].ambient_temperature, -5.0);
    }

    #[test]
    fn drops_rows_whose_city_never_reported_the_field() {
        let rows = vec![
            rec("Kota", None, Some(400.0)),
            rec("Kota", None, Some(500.0)),
            rec("Agra", Some(31.0), Some(600.0)),
        ];
        let out = impute_city_means(rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].city, "Agra");
    }

    #[test]
    fn drops_rows_without_timestamp() {
        let mut r = rec("Pune", Some(25.0), Some(10.0));
        r.date_time = String::new();
        assert!(impute_city_means(vec![r]).is_empty());
    }
}
