pub mod catalog;
pub mod severity;
pub mod rag;
pub mod safety;
pub mod symptoms;
pub mod orchestrator;
pub mod follow_up;
pub mod deferred;

use thiserror::Error;

use crate::care_tip_cache::CacheError;
use rag::RagError;
use severity::ClassificationError;

/// Failure wiring the service from configuration.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Classifier client: {0}")]
    Classifier(#[from] ClassificationError),

    #[error("Generator client: {0}")]
    Generator(#[from] RagError),

    #[error("Care tip cache: {0}")]
    Cache(#[from] CacheError),
}
