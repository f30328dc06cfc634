//! Care-tip response composition.
//!
//! Blends the catalog tip, the retrieved articles and an optional generated
//! elaboration into the ordered sections of a `ComposedResponse`. Generation
//! failure is absorbed; anything else that goes wrong yields the safety
//! fallback.

use std::sync::Arc;

use super::context::build_generation_context;
use super::prompt::{build_care_tip_system_prompt, build_care_tip_user_prompt};
use super::types::PipelineStage;
use super::RagError;
use crate::models::{
    CareTier, ComposedResponse, RetrievalInfo, RetrievalResult, ResponseSection, SectionKind,
    SeverityScore, ToneInfo,
};
use crate::pipeline::catalog::CareTipCatalog;
use crate::pipeline::safety::{escalation_for, fallback_response, opening_line, severity_band_line};

pub const CARE_RECOMMENDATION_HEADING: &str = "Care Recommendation";
pub const EVIDENCE_GUIDANCE_HEADING: &str = "Evidence-Based Guidance";

/// Black-box text generation: system instruction plus prompt in, text out.
pub trait LlmGenerate: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, RagError>;
}

pub struct ResponseComposer {
    generator: Arc<dyn LlmGenerate>,
    catalog: CareTipCatalog,
    excerpt_chars: usize,
    min_generated_chars: usize,
}

impl ResponseComposer {
    pub fn new(generator: Arc<dyn LlmGenerate>, catalog: CareTipCatalog) -> Self {
        Self {
            generator,
            catalog,
            excerpt_chars: 600,
            min_generated_chars: 50,
        }
    }

    pub fn with_limits(mut self, excerpt_chars: usize, min_generated_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self.min_generated_chars = min_generated_chars;
        self
    }

    /// Build the full response for a classified severity.
    ///
    /// Never fails: a tier that disagrees with the severity, or any other
    /// composition error, produces the fallback response with
    /// `success = false`.
    pub fn compose(
        &self,
        severity: SeverityScore,
        symptom: &str,
        tier: CareTier,
        articles: RetrievalResult,
        media: RetrievalResult,
    ) -> ComposedResponse {
        match self.try_compose(severity, symptom, tier, articles, media) {
            Ok(response) => {
                PipelineStage::Composed.trace(symptom);
                tracing::info!(
                    severity = severity.value(),
                    tier = tier.as_str(),
                    sources = response.sources.len(),
                    media = response.media.len(),
                    generated = !response.generated_tip.is_empty(),
                    escalation = response.escalation_needed,
                    "Care tip composed"
                );
                response
            }
            Err(e) => fallback_response(symptom, i64::from(severity.value()), &e.to_string()),
        }
    }

    fn try_compose(
        &self,
        severity: SeverityScore,
        symptom: &str,
        tier: CareTier,
        articles: RetrievalResult,
        media: RetrievalResult,
    ) -> Result<ComposedResponse, RagError> {
        let entry = self.catalog.for_score(severity)?;
        if entry.tier != tier {
            return Err(RagError::Composition(format!(
                "tier {} does not match severity {}",
                tier.as_str(),
                severity
            )));
        }
        let tone = entry.tone_info();

        let mut response = ComposedResponse::bare(symptom, Some(severity));
        response.care_tier = Some(tier);
        response.predefined_tip = entry.tip.to_string();

        response.sections.push(ResponseSection::new(
            SectionKind::Opening,
            vec![
                opening_line(symptom),
                severity_band_line(severity).to_string(),
            ],
        ));
        response.sections.push(ResponseSection::titled(
            SectionKind::CareRecommendation,
            CARE_RECOMMENDATION_HEADING,
            vec![entry.tip.to_string()],
        ));

        let context = build_generation_context(symptom, &articles, self.excerpt_chars);
        response.generated_tip = self.elaborate(severity, symptom, &tone, &context, entry.tip);
        if !response.generated_tip.is_empty() {
            response.sections.push(ResponseSection::titled(
                SectionKind::EvidenceGuidance,
                EVIDENCE_GUIDANCE_HEADING,
                vec![response.generated_tip.clone()],
            ));
        }

        if let Some(section) = escalation_for(Some(severity)) {
            response.sections.push(section);
        }

        if !articles.is_empty() {
            response.sections.push(ResponseSection::new(
                SectionKind::Sources,
                vec![sources_line(&articles)],
            ));
        }

        if !media.is_empty() {
            response.sections.push(ResponseSection::new(
                SectionKind::Media,
                media_lines(symptom, &media),
            ));
        }

        response.retrieval_info = RetrievalInfo {
            articles_found: articles.len(),
            media_found: media.len(),
            fallback_used: articles.used_fallback || media.used_fallback,
        };
        response.tone_info = Some(tone);
        response.sources = articles;
        response.media = media;
        response.success = true;
        Ok(response)
    }

    /// Generated elaboration, or an empty string when generation failed or
    /// returned too little to be useful.
    fn elaborate(
        &self,
        severity: SeverityScore,
        symptom: &str,
        tone: &ToneInfo,
        context: &str,
        predefined_tip: &str,
    ) -> String {
        let system = build_care_tip_system_prompt(tone, context, predefined_tip);
        let prompt = build_care_tip_user_prompt(severity);

        let result = self.generator.generate(&system, &prompt).and_then(|text| {
            let text = text.trim().to_string();
            let chars = text.chars().count();
            if chars < self.min_generated_chars {
                Err(RagError::LowQualityOutput {
                    chars,
                    min: self.min_generated_chars,
                })
            } else {
                Ok(text)
            }
        });

        match result {
            Ok(text) => {
                PipelineStage::Generated.trace(symptom);
                text
            }
            Err(e) => {
                PipelineStage::GenerationFailed.trace(symptom);
                tracing::warn!(error = %e, symptom, "Care tip elaboration unavailable, continuing without it");
                String::new()
            }
        }
    }
}

fn sources_line(articles: &RetrievalResult) -> String {
    let count = articles.len();
    let orgs = articles.distinct_organizations();
    format!(
        "This guidance is based on {count} {} from {orgs} trusted Parkinson's {}.",
        if count == 1 { "source" } else { "sources" },
        if orgs == 1 { "organization" } else { "organizations" },
    )
}

fn media_lines(symptom: &str, media: &RetrievalResult) -> Vec<String> {
    let count = media.len();
    let mut lines = vec![format!(
        "I also found {count} video/audio {} that can help with your {symptom} management.",
        if count == 1 { "resource" } else { "resources" },
    )];
    for (i, item) in media.iter().enumerate() {
        lines.push(format!(
            "{}. {} ({}): {}",
            i + 1,
            item.title,
            item.content_type.as_str(),
            item.media_url().unwrap_or(&item.source_url)
        ));
    }
    lines
}
