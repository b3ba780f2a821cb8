//! Random forest regressor backed by `smartcore`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::{Predictor, read_artifact};
use crate::error::{ModelError, PredictError, TrainingError};
use crate::features::FeatureVector;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Forest fitting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    /// Number of trees.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows trees until leaves are pure.
    pub max_depth: Option<u16>,
    /// Bootstrap sampling seed.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 20,
            max_depth: None,
            seed: 42,
        }
    }
}

impl From<ForestParams> for RandomForestRegressorParameters {
    fn from(p: ForestParams) -> Self {
        RandomForestRegressorParameters {
            max_depth: p.max_depth,
            min_samples_leaf: 1,
            min_samples_split: 2,
            n_trees: p.n_trees,
            m: None,
            keep_samples: false,
            seed: p.seed,
        }
    }
}

/// Fitted forest that expects vectors of exactly `n_features` values.
pub struct ForestPredictor {
    forest: Forest,
    n_features: usize,
}

impl std::fmt::Debug for ForestPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForestPredictor")
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

impl ForestPredictor {
    /// Fits a forest on row-major feature rows and DC power targets (W).
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::TooSmall` for an empty set, or
    /// `TrainingError::Fit` if rows are ragged or smartcore rejects the data.
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        params: ForestParams,
    ) -> Result<Self, TrainingError> {
        let Some(first) = rows.first() else {
            return Err(TrainingError::TooSmall { needed: 1, found: 0 });
        };
        let n_features = first.len();
        if rows.len() != targets.len() {
            return Err(TrainingError::Fit(format!(
                "{} feature rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let mut flat = Vec::with_capacity(rows.len() * n_features);
        for row in rows {
            if row.len() != n_features {
                return Err(TrainingError::Fit(format!(
                    "ragged feature rows: {} and {} columns",
                    n_features,
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }

        let x = DenseMatrix::new(rows.len(), n_features, flat, false);
        let y = targets.to_vec();
        let forest = Forest::fit(&x, &y, params.into())
            .map_err(|e| TrainingError::Fit(format!("{e:?}")))?;

        Ok(Self { forest, n_features })
    }

    /// Reads a forest written by [`ForestPredictor::save`].
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Missing` if `path` does not exist, or
    /// `ModelError::Decode` if it is not a forest.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = read_artifact(path)?;
        let (n_features, forest): (usize, Forest) = bincode::deserialize(&bytes)?;
        Ok(Self { forest, n_features })
    }

    /// Writes the input width and the forest as bincode.
    ///
    /// # Errors
    ///
    /// Returns a `ModelError` if the file cannot be created or encoded.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let file = File::create(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        bincode::serialize_into(BufWriter::new(file), &(self.n_features, &self.forest))?;
        Ok(())
    }

    /// Number of columns the forest was fit on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predicts a batch of rows at once.
    ///
    /// # Errors
    ///
    /// Same as [`Predictor::predict`].
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, PredictError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut flat = Vec::with_capacity(rows.len() * self.n_features);
        for row in rows {
            self.check_shape(row.len())?;
            flat.extend_from_slice(row);
        }
        let x = DenseMatrix::new(rows.len(), self.n_features, flat, false);
        self.forest
            .predict(&x)
            .map_err(|e| PredictError::Model(format!("{e:?}")))
    }

    fn check_shape(&self, actual: usize) -> Result<(), PredictError> {
        if actual == self.n_features {
            Ok(())
        } else {
            Err(PredictError::Shape {
                expected: self.n_features,
                actual,
            })
        }
    }
}

impl Predictor for ForestPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        self.check_shape(features.len())?;
        let x = DenseMatrix::new(1, self.n_features, features.values().to_vec(), false);
        let out = self
            .forest
            .predict(&x)
            .map_err(|e| PredictError::Model(format!("{e:?}")))?;
        out.first().copied().ok_or(PredictError::Empty)
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}
