//! Error types shared across the crate.

use std::path::PathBuf;

/// Feature vector construction failure.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("city \"{0}\" is not one of the trained cities")]
    UnknownCity(String),
}

/// Predictor invocation failure. Predictions are deterministic, so callers
/// surface this once instead of retrying.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("feature vector has {actual} values, predictor expects {expected}")]
    Shape { expected: usize, actual: usize },
    #[error("predictor failed: {0}")]
    Model(String),
    #[error("predictor returned no value")]
    Empty,
}

/// Model artifact loading or saving failure.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model artifact not found at \"{}\"; run `sunsight train` first", .0.display())]
    Missing(PathBuf),
    #[error("cannot access \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode model: {0}")]
    Decode(#[from] bincode::Error),
    #[error("cannot decode model metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("model metadata lists {found:?} as features, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("model was fit on {model} features but its metadata lists {metadata}")]
    WidthMismatch { model: usize, metadata: usize },
}

/// Weather table or training corpus I/O failure.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no complete weather rows left after imputation")]
    Empty,
}

/// Offline training failure.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error("corpus needs at least {needed} rows, found {found}")]
    TooSmall { needed: usize, found: usize },
    #[error("random forest fit failed: {0}")]
    Fit(String),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Anything that can go wrong while answering a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Input(#[from] crate::features::InputError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Predict(#[from] PredictError),
}
