use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{CareTier, SectionKind, Tone};
use super::knowledge::{RetrievalKind, RetrievalResult};
use super::severity::SeverityScore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneInfo {
    pub tone: Tone,
    pub focus: String,
}

/// One ordered part of the user-facing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSection {
    pub kind: SectionKind,
    pub heading: Option<String>,
    pub lines: Vec<String>,
}

impl ResponseSection {
    pub fn new(kind: SectionKind, lines: Vec<String>) -> Self {
        Self {
            kind,
            heading: None,
            lines,
        }
    }

    pub fn titled(kind: SectionKind, heading: &str, lines: Vec<String>) -> Self {
        Self {
            kind,
            heading: Some(heading.to_string()),
            lines,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetrievalInfo {
    pub articles_found: usize,
    pub media_found: usize,
    pub fallback_used: bool,
}

/// The unit handed back to the hosting layer for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedResponse {
    pub symptom: String,
    /// Unset when intake or classification failed.
    pub severity_score: Option<SeverityScore>,
    pub care_tier: Option<CareTier>,
    pub escalation_needed: bool,
    pub predefined_tip: String,
    /// Empty when generation failed or produced nothing usable.
    pub generated_tip: String,
    pub sources: RetrievalResult,
    pub media: RetrievalResult,
    pub tone_info: Option<ToneInfo>,
    pub sections: Vec<ResponseSection>,
    pub retrieval_info: RetrievalInfo,
    pub success: bool,
    pub error_detail: Option<String>,
    pub composed_at: DateTime<Utc>,
}

impl ComposedResponse {
    /// A response shell with no retrieval, no tone and no sections yet.
    pub fn bare(symptom: &str, severity_score: Option<SeverityScore>) -> Self {
        Self {
            symptom: symptom.to_string(),
            severity_score,
            care_tier: severity_score.map(|s| s.tier()),
            escalation_needed: severity_score.is_some_and(|s| s.needs_escalation()),
            predefined_tip: String::new(),
            generated_tip: String::new(),
            sources: RetrievalResult::empty(RetrievalKind::Articles),
            media: RetrievalResult::empty(RetrievalKind::Media),
            tone_info: None,
            sections: Vec::new(),
            retrieval_info: RetrievalInfo::default(),
            success: true,
            error_detail: None,
            composed_at: Utc::now(),
        }
    }

    pub fn section(&self, kind: SectionKind) -> Option<&ResponseSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.section(kind).is_some()
    }

    /// Message lines in display order, headings included.
    pub fn fulfillment_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for section in &self.sections {
            if let Some(ref heading) = section.heading {
                lines.push(format!("\n{heading}"));
            }
            lines.extend(section.lines.iter().cloned());
        }
        lines
    }

    pub fn fulfillment_text(&self) -> String {
        self.fulfillment_lines().join("\n")
    }
}
