use super::IndexError;
use crate::models::KnowledgeItem;

/// Nearest-neighbour text search over the knowledge base.
///
/// Returns up to `k` records, most similar first. Embedding and indexing
/// live entirely behind this trait.
pub trait TextIndex: Send + Sync {
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeItem>, IndexError>;
}

/// Stages of one pipeline run, traced at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    FeatureExtracted,
    Retrieved,
    Generated,
    GenerationFailed,
    Composed,
    Cached,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FeatureExtracted => "feature_extracted",
            Self::Retrieved => "retrieved",
            Self::Generated => "generated",
            Self::GenerationFailed => "generation_failed",
            Self::Composed => "composed",
            Self::Cached => "cached",
        }
    }

    pub fn trace(self, symptom: &str) {
        tracing::debug!(stage = self.as_str(), symptom, "Care tip pipeline stage");
    }
}
