//! The predictor capability and the model artifacts behind it.
//!
//! The serving process loads one [`LoadedModel`] at startup and shares it
//! read-only. Everything that needs a prediction takes `&dyn Predictor`, so
//! tests substitute stubs for the trained forest.

pub mod forest;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, PredictError};
use crate::features::{FeatureSchema, FeatureVector, TrainedCitySet};

pub use forest::{ForestParams, ForestPredictor};

/// A fitted regression model mapping a feature vector to DC power.
///
/// Implementations must be safe for concurrent reads: the API calls one
/// shared instance from many request handlers.
pub trait Predictor: Send + Sync {
    /// Returns predicted DC power in watts. May be negative; callers clamp.
    ///
    /// # Errors
    ///
    /// Returns a `PredictError` if the vector does not fit the model or the
    /// model itself fails. Identical inputs fail identically.
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError>;

    /// Returns a short human-readable model kind.
    fn kind(&self) -> &'static str;
}

/// Training provenance stored next to the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Local wall-clock time of training, `%Y-%m-%d %H:%M:%S`.
    pub last_trained: String,
    /// First day covered by the training corpus.
    pub data_start_date: String,
    /// Last day covered by the training corpus.
    pub data_end_date: String,
    /// Cities with a one-hot slot.
    pub cities: TrainedCitySet,
    /// Feature column names in the order the model was fit on.
    pub feature_names: Vec<String>,
    /// Hold-out coefficient of determination.
    pub r2_score: f64,
    /// Hold-out mean absolute error (W).
    pub mae_watts: f64,
    /// Rows used to fit the model.
    pub training_rows: usize,
}

impl ModelMetadata {
    /// Reads metadata from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Missing` if the file does not exist, or a decode
    /// error if it is not valid metadata JSON.
    pub fn from_json_file(path: &Path) -> Result<Self, ModelError> {
        let content = read_artifact(path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Writes metadata as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns a `ModelError` if the file cannot be written.
    pub fn write_json_file(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Predictor, metadata and schema loaded together at process start.
pub struct LoadedModel {
    predictor: Box<dyn Predictor>,
    metadata: ModelMetadata,
    schema: FeatureSchema,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("predictor", &self.predictor.kind())
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl LoadedModel {
    /// Loads the forest and its metadata, failing fast on missing files, a
    /// feature layout that disagrees with the trained city set, or a forest
    /// fit on a different number of columns than the metadata lists.
    ///
    /// # Errors
    ///
    /// Returns a `ModelError` describing the first problem found.
    pub fn load(model_path: &Path, metadata_path: &Path) -> Result<Self, ModelError> {
        let metadata = ModelMetadata::from_json_file(metadata_path)?;
        let forest = ForestPredictor::load(model_path)?;
        if forest.n_features() != metadata.feature_names.len() {
            return Err(ModelError::WidthMismatch {
                model: forest.n_features(),
                metadata: metadata.feature_names.len(),
            });
        }
        let model = Self::from_parts(Box::new(forest), metadata)?;
        tracing::info!(
            model = %model_path.display(),
            cities = model.schema.cities().len(),
            features = model.schema.len(),
            trained = %model.metadata.last_trained,
            "model loaded"
        );
        Ok(model)
    }

    /// Assembles a model from an already-constructed predictor.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::SchemaMismatch` if `metadata.feature_names` is
    /// not exactly the schema derived from `metadata.cities`.
    pub fn from_parts(
        predictor: Box<dyn Predictor>,
        metadata: ModelMetadata,
    ) -> Result<Self, ModelError> {
        let schema = FeatureSchema::new(metadata.cities.clone());
        let expected = schema.column_names();
        if metadata.feature_names != expected {
            return Err(ModelError::SchemaMismatch {
                expected,
                found: metadata.feature_names,
            });
        }
        Ok(Self {
            predictor,
            metadata,
            schema,
        })
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }
}

pub(crate) fn read_artifact(path: &Path) -> Result<Vec<u8>, ModelError> {
    if !path.exists() {
        return Err(ModelError::Missing(PathBuf::from(path)));
    }
    fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}
