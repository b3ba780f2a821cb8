use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::vector::{Feature, FeatureVector};
use super::{SystemConfig, WeatherObservation, module_temperature};
use crate::error::FeatureError;

/// Prefix of the one-hot city columns.
pub const CITY_PREFIX: &str = "CITY_";

/// Cities the predictor was trained on, kept in lexicographic order.
///
/// Read-only for the lifetime of a serving process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainedCitySet(BTreeSet<String>);

impl TrainedCitySet {
    /// Number of trained cities.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `city` has a one-hot slot.
    pub fn contains(&self, city: &str) -> bool {
        self.0.contains(city)
    }

    /// Slot position of `city` among the city columns.
    pub fn index_of(&self, city: &str) -> Option<usize> {
        self.0.iter().position(|c| c == city)
    }

    /// Cities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TrainedCitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// What to do when a request names a city with no one-hot slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCityPolicy {
    /// Fail with [`FeatureError::UnknownCity`].
    #[default]
    Reject,
    /// Leave every city slot at 0 and predict anyway.
    Zero,
}

/// Column layout the predictor was fit on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    cities: TrainedCitySet,
}

impl FeatureSchema {
    pub fn new(cities: TrainedCitySet) -> Self {
        Self { cities }
    }

    pub fn cities(&self) -> &TrainedCitySet {
        &self.cities
    }

    /// Vector length: 7 fixed columns plus one per trained city.
    pub fn len(&self) -> usize {
        Feature::COUNT + self.cities.len()
    }

    /// Column names in vector order, e.g. `CITY_Delhi` for city slots.
    pub fn column_names(&self) -> Vec<String> {
        Feature::ALL
            .iter()
            .map(|f| f.name().to_string())
            .chain(self.cities.iter().map(|c| format!("{CITY_PREFIX}{c}")))
            .collect()
    }

    /// Builds the serving-time feature vector.
    ///
    /// Module temperature uses the supplied irradiation as-is; capacity is
    /// converted from kW to W.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::UnknownCity`] when the city is untrained and
    /// `policy` is [`UnknownCityPolicy::Reject`].
    pub fn build(
        &self,
        weather: &WeatherObservation,
        system: &SystemConfig,
        policy: UnknownCityPolicy,
    ) -> Result<FeatureVector, FeatureError> {
        let wind = f64::from(weather.wind_speed);
        let fixed = [
            weather.ambient_temp,
            weather.irradiation,
            module_temperature(weather.ambient_temp, weather.irradiation, wind),
            f64::from(weather.humidity),
            f64::from(weather.cloud_cover),
            wind,
            system.capacity_w(),
        ];
        self.assemble(fixed, system.city(), policy)
    }

    /// Lays out fixed columns followed by the one-hot city slots.
    ///
    /// `fixed` must already be in [`Feature::ALL`] order. Training uses this
    /// directly with the corpus' stored module temperature.
    ///
    /// # Errors
    ///
    /// Same as [`FeatureSchema::build`].
    pub fn assemble(
        &self,
        fixed: [f64; Feature::COUNT],
        city: &str,
        policy: UnknownCityPolicy,
    ) -> Result<FeatureVector, FeatureError> {
        let mut values = Vec::with_capacity(self.len());
        values.extend_from_slice(&fixed);
        values.resize(self.len(), 0.0);

        match self.cities.index_of(city) {
            Some(slot) => values[Feature::COUNT + slot] = 1.0,
            None => match policy {
                UnknownCityPolicy::Reject => {
                    return Err(FeatureError::UnknownCity(city.to_string()));
                }
                UnknownCityPolicy::Zero => {
                    tracing::warn!(city, "untrained city, all city features left at 0");
                }
            },
        }

        Ok(FeatureVector::from_values(values))
    }
}
