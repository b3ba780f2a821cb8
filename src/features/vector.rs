use serde::Serialize;

/// The fixed, non-city columns of the feature vector, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    AmbientTemperature,
    Irradiation,
    ModuleTemperature,
    Humidity,
    CloudCover,
    WindSpeed,
    SystemCapacityW,
}

impl Feature {
    /// All fixed columns in the order the model was fit on.
    pub const ALL: [Feature; 7] = [
        Feature::AmbientTemperature,
        Feature::Irradiation,
        Feature::ModuleTemperature,
        Feature::Humidity,
        Feature::CloudCover,
        Feature::WindSpeed,
        Feature::SystemCapacityW,
    ];

    /// Number of fixed columns preceding the city slots.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this column in every feature vector.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name used in the training corpus and model metadata.
    pub const fn name(self) -> &'static str {
        match self {
            Feature::AmbientTemperature => "AMBIENT_TEMPERATURE",
            Feature::Irradiation => "IRRADIATION",
            Feature::ModuleTemperature => "MODULE_TEMPERATURE",
            Feature::Humidity => "HUMIDITY",
            Feature::CloudCover => "CLOUD_COVER",
            Feature::WindSpeed => "WIND_SPEED",
            Feature::SystemCapacityW => "SYSTEM_CAPACITY_W",
        }
    }
}

/// Ordered numeric input for the predictor.
///
/// Only [`FeatureSchema`](super::FeatureSchema) creates these, so length and
/// column order always match the schema that built it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        debug_assert!(values.len() >= Feature::COUNT);
        Self { values }
    }

    /// Raw values in schema order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Total length: 7 fixed columns plus one slot per trained city.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Value of a fixed column.
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// One-hot city slots, in trained-city order.
    pub fn city_slots(&self) -> &[f64] {
        &self.values[Feature::COUNT..]
    }

    /// Returns a copy with one fixed column replaced.
    #[must_use]
    pub fn with(&self, feature: Feature, value: f64) -> Self {
        let mut values = self.values.clone();
        values[feature.index()] = value;
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_declaration_order() {
        for (i, f) in Feature::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
        assert_eq!(Feature::COUNT, 7);
    }

    #[test]
    fn with_leaves_original_untouched() {
        let v = FeatureVector::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 1.0, 0.0]);
        let ideal = v.with(Feature::CloudCover, 0.0);
        assert_eq!(v.get(Feature::CloudCover), 5.0);
        assert_eq!(ideal.get(Feature::CloudCover), 0.0);
        assert_eq!(ideal.city_slots(), &[1.0, 0.0]);
    }
}
