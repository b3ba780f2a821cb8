//! Derived metrics around a single peak prediction.
//!
//! Everything here re-invokes the predictor on modified copies of one
//! feature vector: a synthetic daylight curve for daily and monthly energy,
//! and a clear-sky variant for comparison.

use std::f64::consts::PI;
use std::fmt;

use serde::Serialize;

use crate::error::{PredictError, PredictionError};
use crate::features::{
    Feature, FeatureVector, SystemConfig, UnknownCityPolicy, WeatherObservation,
    module_temperature,
};
use crate::predictor::{LoadedModel, Predictor};

/// Hour slots in the synthetic daily curve.
pub const HOURS_PER_DAY: usize = 24;
/// First and last hour with daylight in the synthetic curve.
pub const SUNRISE_HOUR: usize = 6;
pub const SUNSET_HOUR: usize = 18;
/// Monthly energy is daily energy times this.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Cloud cover (%) above which clouds are reported as the limiting factor.
pub const HIGH_CLOUD_COVER_PCT: u8 = 70;
/// Peak below this share of capacity counts as underperforming in strong sun.
pub const UNDERPERFORMANCE_RATIO: f64 = 0.2;
/// Irradiation (kW/m²) considered strong sun for the underperformance check.
pub const STRONG_SUN_KW_M2: f64 = 0.5;

/// Synthetic irradiation for `hour`: a half-sine from sunrise to sunset
/// peaking at noon, 0 outside daylight.
pub fn hourly_irradiation(base_kw_m2: f64, hour: usize) -> f64 {
    if (SUNRISE_HOUR..=SUNSET_HOUR).contains(&hour) {
        let phase = (hour as f64 - SUNRISE_HOUR as f64) * PI / 12.0;
        (base_kw_m2 * phase.sin()).max(0.0)
    } else {
        0.0
    }
}

/// Clamped prediction in kW.
fn predict_kw(predictor: &dyn Predictor, vector: &FeatureVector) -> Result<f64, PredictError> {
    Ok(predictor.predict(vector)?.max(0.0) / 1000.0)
}

/// Peak power (kW) for the conditions encoded in `vector`.
///
/// # Errors
///
/// Propagates the predictor's error.
pub fn peak_power_kw(
    predictor: &dyn Predictor,
    vector: &FeatureVector,
) -> Result<f64, PredictError> {
    predict_kw(predictor, vector)
}

/// Predicted output (kW) for each hour of the synthetic day.
///
/// Hours without irradiation are 0 and never reach the predictor.
///
/// # Errors
///
/// Propagates the first predictor error.
pub fn hourly_curve(
    predictor: &dyn Predictor,
    vector: &FeatureVector,
    weather: &WeatherObservation,
) -> Result<Vec<f64>, PredictError> {
    let wind = f64::from(weather.wind_speed);
    (0..HOURS_PER_DAY)
        .map(|hour| {
            let irr = hourly_irradiation(weather.irradiation, hour);
            if irr <= 0.0 {
                return Ok(0.0);
            }
            let module_temp = module_temperature(weather.ambient_temp, irr, wind);
            let hourly = vector
                .with(Feature::Irradiation, irr)
                .with(Feature::ModuleTemperature, module_temp);
            predict_kw(predictor, &hourly)
        })
        .collect()
}

/// `(daily kWh, monthly kWh)` from hourly kW figures.
pub fn energy_totals(hourly_kw: &[f64]) -> (f64, f64) {
    let daily: f64 = hourly_kw.iter().sum();
    (daily, daily * DAYS_PER_MONTH)
}

/// Output (kW) with cloud cover forced to 0.
///
/// # Errors
///
/// Propagates the predictor's error.
pub fn ideal_power_kw(
    predictor: &dyn Predictor,
    vector: &FeatureVector,
) -> Result<f64, PredictError> {
    predict_kw(predictor, &vector.with(Feature::CloudCover, 0.0))
}

/// Advice derived from the prediction and the conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    HighCloudCover { cloud_cover: u8 },
    Underperformance,
    PerformingAsExpected,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighCloudCover { cloud_cover } => write!(
                f,
                "High cloud cover: {cloud_cover}% cloud is the main factor limiting generation"
            ),
            Self::Underperformance => f.write_str(concat!(
                "Underperformance: output is unusually low for this much sunlight, ",
                "check for shading or faults"
            )),
            Self::PerformingAsExpected => {
                write!(f, "Performing as expected for these weather conditions")
            }
        }
    }
}

/// Cloud advice is independent; exactly one of underperformance or
/// performing-as-expected is always present.
pub fn recommendations(
    weather: &WeatherObservation,
    capacity_kw: f64,
    peak_kw: f64,
) -> Vec<Recommendation> {
    let mut out = Vec::with_capacity(2);
    if weather.cloud_cover > HIGH_CLOUD_COVER_PCT {
        out.push(Recommendation::HighCloudCover {
            cloud_cover: weather.cloud_cover,
        });
    }
    if peak_kw < capacity_kw * UNDERPERFORMANCE_RATIO && weather.irradiation > STRONG_SUN_KW_M2 {
        out.push(Recommendation::Underperformance);
    } else {
        out.push(Recommendation::PerformingAsExpected);
    }
    out
}

/// Everything the dashboard shows for one set of conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub peak_power_kw: f64,
    /// One entry per hour, index = hour of day.
    pub hourly_kw: Vec<f64>,
    pub daily_energy_kwh: f64,
    pub monthly_energy_kwh: f64,
    /// Clear-sky output for the same conditions.
    pub ideal_power_kw: f64,
    pub recommendations: Vec<Recommendation>,
}

impl PredictionResult {
    /// Runs every derived metric for one feature vector.
    ///
    /// # Errors
    ///
    /// The first predictor failure aborts the whole calculation.
    pub fn calculate(
        predictor: &dyn Predictor,
        vector: &FeatureVector,
        weather: &WeatherObservation,
        system: &SystemConfig,
    ) -> Result<Self, PredictError> {
        let peak_power_kw = peak_power_kw(predictor, vector)?;
        let hourly_kw = hourly_curve(predictor, vector, weather)?;
        let (daily_energy_kwh, monthly_energy_kwh) = energy_totals(&hourly_kw);
        let ideal_power_kw = ideal_power_kw(predictor, vector)?;
        Ok(Self {
            peak_power_kw,
            hourly_kw,
            daily_energy_kwh,
            monthly_energy_kwh,
            ideal_power_kw,
            recommendations: recommendations(weather, system.capacity_kw(), peak_power_kw),
        })
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Solar Forecast ---")?;
        writeln!(f, "Peak power:        {:.2} kW", self.peak_power_kw)?;
        writeln!(f, "Daily energy:      {:.2} kWh", self.daily_energy_kwh)?;
        writeln!(f, "Monthly energy:    {:.2} kWh", self.monthly_energy_kwh)?;
        writeln!(f, "Clear-sky power:   {:.2} kW", self.ideal_power_kw)?;
        write!(f, "Recommendations:")?;
        for r in &self.recommendations {
            write!(f, "\n  - {r}")?;
        }
        Ok(())
    }
}

/// Builds the feature vector with the loaded schema and returns peak kW.
///
/// Inputs are expected to be validated by the caller.
///
/// # Errors
///
/// Returns `PredictionError::Feature` for a rejected city and
/// `PredictionError::Predict` if the model fails.
pub fn predict_peak(
    model: &LoadedModel,
    weather: &WeatherObservation,
    system: &SystemConfig,
    policy: UnknownCityPolicy,
) -> Result<f64, PredictionError> {
    let vector = model.schema().build(weather, system, policy)?;
    Ok(peak_power_kw(model.predictor(), &vector)?)
}

/// Like [`predict_peak`] but with every derived metric.
///
/// # Errors
///
/// Same as [`predict_peak`].
pub fn predict_summary(
    model: &LoadedModel,
    weather: &WeatherObservation,
    system: &SystemConfig,
    policy: UnknownCityPolicy,
) -> Result<PredictionResult, PredictionError> {
    let vector = model.schema().build(weather, system, policy)?;
    let result = PredictionResult::calculate(model.predictor(), &vector, weather, system)?;
    tracing::debug!(city = system.city(), peak_kw = result.peak_power_kw, "prediction computed");
    Ok(result)
}
