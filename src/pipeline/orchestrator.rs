//! End-to-end care-tip pipeline.
//!
//! answers → severity → {catalog tip, articles, media} → composed response,
//! optionally stored for deferred delivery. Every path ends in a
//! `ComposedResponse`; failures become fallback responses rather than errors,
//! except cache I/O on the deferred path.

use std::sync::Arc;

use super::catalog::CareTipCatalog;
use super::follow_up::{FollowUpReply, FollowUpTopic};
use super::rag::composer::{LlmGenerate, ResponseComposer};
use super::rag::ollama::OllamaCareTipGenerator;
use super::rag::retrieval::KnowledgeRetriever;
use super::rag::types::{PipelineStage, TextIndex};
use super::safety::{escalation_for, fallback_response, intake_failure_response, opening_line};
use super::severity::features::self_reported_severity;
use super::severity::{FeatureAdapter, HttpSeverityClassifier, SeverityClassifier};
use super::symptoms::SymptomKind;
use super::ServiceError;
use crate::care_tip_cache::{
    CacheError, CareTipCache, CareTipKey, FileCareTipCache, InMemoryCareTipCache,
};
use crate::config::PipelineConfig;
use crate::models::{
    Answer, CareTier, ComposedResponse, ResponseSection, RetrievalKind, RetrievalResult,
    SectionKind, SeverityScore,
};

/// Outcome of polling for a deferred result.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    Ready(Box<ComposedResponse>),
    NotReady,
}

impl PollStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Long-lived pipeline service. Build once, share behind an `Arc`.
pub struct CareTipService {
    adapter: FeatureAdapter,
    retriever: KnowledgeRetriever,
    composer: ResponseComposer,
    cache: Arc<dyn CareTipCache>,
    articles_k: usize,
    media_k: usize,
}

impl CareTipService {
    pub fn new(
        adapter: FeatureAdapter,
        retriever: KnowledgeRetriever,
        composer: ResponseComposer,
        cache: Arc<dyn CareTipCache>,
    ) -> Self {
        Self {
            adapter,
            retriever,
            composer,
            cache,
            articles_k: 3,
            media_k: 2,
        }
    }

    /// Assemble from collaborators, taking every tunable from `config`.
    pub fn with_collaborators(
        config: &PipelineConfig,
        classifier: Arc<dyn SeverityClassifier>,
        index: Arc<dyn TextIndex>,
        generator: Arc<dyn LlmGenerate>,
        cache: Arc<dyn CareTipCache>,
    ) -> Self {
        let retriever = KnowledgeRetriever::new(index).with_query_attempts(config.query_attempts);
        let composer = ResponseComposer::new(generator, CareTipCatalog::pain())
            .with_limits(config.excerpt_chars, config.min_generated_chars);
        Self {
            articles_k: config.articles_k,
            media_k: config.media_k,
            ..Self::new(FeatureAdapter::new(classifier), retriever, composer, cache)
        }
    }

    /// Production wiring: HTTP classifier, local Ollama, and a file cache
    /// when `cache_dir` is set.
    ///
    /// Builds blocking HTTP clients, so call it outside an async context.
    pub fn from_config(config: &PipelineConfig, index: Arc<dyn TextIndex>) -> Result<Self, ServiceError> {
        let classifier =
            HttpSeverityClassifier::new(&config.classifier_url, config.classifier_timeout_secs)?;
        let generator = OllamaCareTipGenerator::from_config(config)?;
        let cache: Arc<dyn CareTipCache> = match &config.cache_dir {
            Some(dir) => Arc::new(FileCareTipCache::open(dir)?),
            None => Arc::new(InMemoryCareTipCache::new()),
        };

        tracing::info!(
            classifier = %config.classifier_url,
            ollama = %config.ollama_url,
            model = %config.ollama_model,
            file_cache = config.cache_dir.is_some(),
            "Care tip service configured"
        );

        Ok(Self::with_collaborators(
            config,
            Arc::new(classifier),
            index,
            Arc::new(generator),
            cache,
        ))
    }

    pub fn cache(&self) -> &Arc<dyn CareTipCache> {
        &self.cache
    }

    /// Dispatch an answer to the handler for its symptom.
    pub fn evaluate(&self, answer: &Answer, symptom: &str) -> ComposedResponse {
        let kind = SymptomKind::parse(symptom);
        self.handler_for(&kind).handle(answer)
    }

    pub fn handler_for(&self, kind: &SymptomKind) -> Box<dyn SymptomHandler + '_> {
        if kind.has_care_pipeline() {
            Box::new(PainAssessmentHandler {
                service: self,
                symptom: kind.clone(),
            })
        } else {
            Box::new(MonitoringHandler {
                symptom: kind.clone(),
            })
        }
    }

    /// Classify, retrieve and compose synchronously.
    ///
    /// Intake or classification failure returns immediately with no tier and
    /// no retrieval.
    pub fn run(&self, answer: &Answer, symptom: &str) -> ComposedResponse {
        PipelineStage::Start.trace(symptom);
        match self.adapter.classify(answer) {
            Ok(severity) => {
                PipelineStage::FeatureExtracted.trace(symptom);
                self.compose_for(severity, symptom)
            }
            Err(e) => intake_failure_response(symptom, &e.to_string()),
        }
    }

    /// Retrieve and compose for an already known severity.
    pub fn compose_for(&self, severity: SeverityScore, symptom: &str) -> ComposedResponse {
        let kind = SymptomKind::parse(symptom);
        if !kind.has_care_pipeline() {
            return monitoring_response(&kind, Some(severity));
        }

        let articles = self.retrieve(RetrievalKind::Articles, severity, symptom);
        let media = self.retrieve(RetrievalKind::Media, severity, symptom);
        PipelineStage::Retrieved.trace(symptom);

        self.composer
            .compose(severity, symptom, severity.tier(), articles, media)
    }

    /// Answer a pain follow-up question. Recognized topics rerun the pipeline
    /// at moderate severity; anything else gets the topic prompt.
    pub fn follow_up(&self, question: &str) -> FollowUpReply {
        let Some(topic) = FollowUpTopic::detect(question) else {
            tracing::debug!("Follow-up question names no topic");
            return FollowUpReply::topic_prompt();
        };
        tracing::info!(topic = topic.as_str(), "Answering pain follow-up");
        let response = self.compose_for(SeverityScore::MODERATE, SymptomKind::Pain.display_name());
        FollowUpReply::from_response(topic, &response)
    }

    fn retrieve(&self, kind: RetrievalKind, severity: SeverityScore, symptom: &str) -> RetrievalResult {
        let result = match kind {
            RetrievalKind::Articles => {
                self.retriever
                    .search_articles(severity, symptom, self.articles_k)
            }
            RetrievalKind::Media => self.retriever.search_media(severity, symptom, self.media_k),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(kind = kind.as_str(), error = %e, "Retrieval unavailable, composing without it");
            RetrievalResult::empty(kind)
        })
    }

    /// Compose for a caller-supplied severity and store the result under
    /// `key`. An out-of-range severity stores the fallback response.
    pub fn run_deferred(
        &self,
        key: &CareTipKey,
        severity: i64,
        symptom: &str,
    ) -> Result<ComposedResponse, CacheError> {
        PipelineStage::Start.trace(symptom);
        let response = match SeverityScore::new(severity) {
            Ok(score) => self.compose_for(score, symptom),
            Err(e) => fallback_response(symptom, severity, &e.to_string()),
        };
        self.cache.put(key, &response)?;
        PipelineStage::Cached.trace(symptom);
        tracing::info!(key = %key, success = response.success, "Deferred care tip stored");
        Ok(response)
    }

    pub fn poll(&self, key: &CareTipKey) -> Result<PollStatus, CacheError> {
        Ok(match self.cache.get(key)? {
            Some(response) => PollStatus::Ready(Box::new(response)),
            None => PollStatus::NotReady,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Symptom handlers
// ═══════════════════════════════════════════════════════════

/// One supported symptom flow.
pub trait SymptomHandler {
    fn handle(&self, answer: &Answer) -> ComposedResponse;
}

/// Full assessment: classifier, retrieval, generation.
pub struct PainAssessmentHandler<'a> {
    service: &'a CareTipService,
    symptom: SymptomKind,
}

impl SymptomHandler for PainAssessmentHandler<'_> {
    fn handle(&self, answer: &Answer) -> ComposedResponse {
        self.service.run(answer, self.symptom.display_name())
    }
}

/// Symptoms without a curated care flow get a monitoring response.
pub struct MonitoringHandler {
    symptom: SymptomKind,
}

impl SymptomHandler for MonitoringHandler {
    fn handle(&self, answer: &Answer) -> ComposedResponse {
        monitoring_response(&self.symptom, self_reported_severity(answer))
    }
}

fn monitoring_response(symptom: &SymptomKind, severity: Option<SeverityScore>) -> ComposedResponse {
    let name = symptom.display_name();
    let tip = format!("For {name} symptoms, monitor and consult healthcare provider if persistent.");

    let mut response = ComposedResponse::bare(name, severity);
    response.care_tier = Some(CareTier::BasicCare);
    response.predefined_tip = tip.clone();
    response.sections.push(ResponseSection::new(
        SectionKind::Opening,
        vec![opening_line(name)],
    ));
    response.sections.push(ResponseSection::new(
        SectionKind::CareRecommendation,
        vec![tip],
    ));
    if let Some(section) = escalation_for(severity) {
        response.sections.push(section);
    }
    response.sections.push(ResponseSection::new(
        SectionKind::Notice,
        vec![format!(
            "Enhanced support for {name} is being developed. Track symptoms and discuss with healthcare team."
        )],
    ));

    tracing::info!(symptom = name, severity = severity.map(|s| s.value()), "Monitoring response for symptom");
    response
}
