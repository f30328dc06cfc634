pub mod types;
pub mod queries;
pub mod retrieval;
pub mod context;
pub mod prompt;
pub mod ollama;
pub mod composer;

use thiserror::Error;

use super::catalog::CatalogError;

/// Failure reported by the text-index collaborator for one query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Text index unreachable: {0}")]
    Unreachable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Index load failed: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Ollama connection failed: {0}")]
    OllamaConnection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generated text too short ({chars} chars, need {min})")]
    LowQualityOutput { chars: usize, min: usize },

    #[error("Text index unavailable after {queries} queries: {last_error}")]
    RetrievalUnavailable { queries: usize, last_error: String },

    #[error("Composition failed: {0}")]
    Composition(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
