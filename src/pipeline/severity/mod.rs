pub mod classifier;
pub mod features;

use thiserror::Error;

pub use classifier::{HttpSeverityClassifier, SeverityClassifier};
pub use features::{FeatureAdapter, FeatureRecord};

/// Malformed intake data. The pipeline halts before retrieval.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Incomplete answer: missing field '{0}'")]
    IncompleteAnswer(&'static str),

    #[error("Invalid value for '{field}': {value}")]
    InvalidField { field: &'static str, value: String },
}

/// The classifier collaborator could not produce a usable label.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Classifier connection failed: {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Classifier returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Classifier label {0} has no severity score")]
    LabelOutOfRange(u32),
}

#[derive(Error, Debug)]
pub enum SeverityError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),
}
