//! Offline training job: corpus in, forest and metadata out.

use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::info;

use crate::config::{ModelConfig, TrainingConfig};
use crate::error::TrainingError;
use crate::features::{Feature, FeatureSchema, TrainedCitySet, UnknownCityPolicy};
use crate::io;
use crate::label::TrainingRow;
use crate::predictor::{ForestParams, ForestPredictor, ModelMetadata};

/// Timestamp layout of `DATE_TIME` in the corpus.
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

impl From<&TrainingConfig> for ForestParams {
    fn from(c: &TrainingConfig) -> Self {
        Self {
            n_trees: c.trees,
            max_depth: c.max_depth,
            seed: c.seed,
        }
    }
}

/// Hold-out evaluation of a freshly fitted forest.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub cities: usize,
    /// Coefficient of determination on the hold-out.
    pub r2_score: f64,
    /// Mean absolute error on the hold-out (W).
    pub mae_watts: f64,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Training Report ---")?;
        writeln!(f, "Rows (train/test):  {}/{}", self.train_rows, self.test_rows)?;
        writeln!(f, "Cities:             {}", self.cities)?;
        writeln!(f, "R² score:           {:.4}", self.r2_score)?;
        write!(f, "MAE:                {:.2} W", self.mae_watts)
    }
}

/// Result of [`train`]: the fitted forest plus what gets written beside it.
#[derive(Debug)]
pub struct TrainedModel {
    pub forest: ForestPredictor,
    pub metadata: ModelMetadata,
    pub report: TrainingReport,
}

/// Coefficient of determination. A constant target scores 1 only when
/// predicted exactly.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(y, p)| (y - p).abs()).sum();
    sum / actual.len() as f64
}

/// First and last calendar day in the corpus. Unparseable timestamps are
/// ignored.
pub fn date_range(rows: &[TrainingRow]) -> Option<(NaiveDate, NaiveDate)> {
    rows.iter()
        .filter_map(|r| NaiveDateTime::parse_from_str(&r.date_time, DATE_TIME_FORMAT).ok())
        .map(|dt| dt.date())
        .fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}

/// Rows in schema order, using the corpus' stored module temperature.
fn feature_rows(
    schema: &FeatureSchema,
    rows: &[TrainingRow],
) -> Result<Vec<Vec<f64>>, TrainingError> {
    rows.iter()
        .map(|r| {
            let mut fixed = [0.0; Feature::COUNT];
            fixed[Feature::AmbientTemperature.index()] = r.ambient_temperature;
            fixed[Feature::Irradiation.index()] = r.irradiation;
            fixed[Feature::ModuleTemperature.index()] = r.module_temperature;
            fixed[Feature::Humidity.index()] = r.humidity;
            fixed[Feature::CloudCover.index()] = r.cloud_cover;
            fixed[Feature::WindSpeed.index()] = r.wind_speed;
            fixed[Feature::SystemCapacityW.index()] = r.system_capacity_w;
            let v = schema.assemble(fixed, &r.city, UnknownCityPolicy::Reject)?;
            Ok(v.values().to_vec())
        })
        .collect()
}

/// Fits a forest on `rows` and evaluates it on a seeded random hold-out.
///
/// # Errors
///
/// Returns `TrainingError::TooSmall` when fewer than two rows are given
/// (train and test both need one), or any fit/predict failure.
pub fn train(rows: &[TrainingRow], config: &TrainingConfig) -> Result<TrainedModel, TrainingError> {
    if rows.len() < 2 {
        return Err(TrainingError::TooSmall {
            needed: 2,
            found: rows.len(),
        });
    }

    let cities: TrainedCitySet = rows.iter().map(|r| r.city.as_str()).collect();
    let schema = FeatureSchema::new(cities.clone());
    let features = feature_rows(&schema, rows)?;

    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(config.seed));
    let n_test =
        ((rows.len() as f64 * config.test_fraction).ceil() as usize).clamp(1, rows.len() - 1);
    let (test_idx, train_idx) = order.split_at(n_test);

    let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        idx.iter()
            .map(|&i| (features[i].clone(), rows[i].dc_power))
            .unzip()
    };
    let (x_train, y_train) = pick(train_idx);
    let (x_test, y_test) = pick(test_idx);

    info!(
        train = x_train.len(),
        test = x_test.len(),
        cities = cities.len(),
        trees = config.trees,
        "fitting random forest"
    );
    let forest = ForestPredictor::fit(&x_train, &y_train, config.into())?;
    let predicted = forest.predict_rows(&x_test)?;

    let report = TrainingReport {
        train_rows: x_train.len(),
        test_rows: x_test.len(),
        cities: cities.len(),
        r2_score: r2_score(&y_test, &predicted),
        mae_watts: mean_absolute_error(&y_test, &predicted),
    };
    info!(r2 = report.r2_score, mae_w = report.mae_watts, "evaluation complete");

    let (start, end) = date_range(rows)
        .map(|(s, e)| (s.to_string(), e.to_string()))
        .unwrap_or_default();
    let metadata = ModelMetadata {
        last_trained: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        data_start_date: start,
        data_end_date: end,
        feature_names: schema.column_names(),
        cities,
        r2_score: report.r2_score,
        mae_watts: report.mae_watts,
        training_rows: report.train_rows,
    };

    Ok(TrainedModel {
        forest,
        metadata,
        report,
    })
}

/// Reads the corpus, trains, and writes both artifacts.
///
/// # Errors
///
/// Returns a `TrainingError` for an unreadable corpus, a failed fit, or
/// artifacts that cannot be written.
pub fn run(
    corpus_path: &Path,
    model: &ModelConfig,
    config: &TrainingConfig,
) -> Result<TrainingReport, TrainingError> {
    let rows = io::read_corpus(corpus_path)?;
    info!(rows = rows.len(), path = %corpus_path.display(), "corpus loaded");

    let trained = train(&rows, config)?;
    trained.forest.save(&model.model_path)?;
    trained.metadata.write_json_file(&model.metadata_path)?;
    info!(
        model = %model.model_path.display(),
        metadata = %model.metadata_path.display(),
        "artifacts written"
    );
    Ok(trained.report)
}
