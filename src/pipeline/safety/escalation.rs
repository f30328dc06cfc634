//! Severity-banded wording and the escalation notice.
//!
//! The notice is attached whenever the score is 5, on the composed path and
//! the fallback path alike. Nothing else triggers it.

use crate::models::{ResponseSection, SectionKind, SeverityScore};

pub const ESCALATION_HEADING: &str = "Important";

pub const ESCALATION_NOTICE: &str =
    "Given the severity of your symptoms, I strongly recommend contacting your healthcare provider soon.";

pub fn opening_line(symptom: &str) -> String {
    format!("I understand you're experiencing {symptom} and I want to help you manage it effectively.")
}

/// Acknowledgement matching the severity band.
pub fn severity_band_line(severity: SeverityScore) -> &'static str {
    match severity.value() {
        0..=2 => "It's good that your pain level is relatively manageable.",
        3 => "I can see you're dealing with moderate pain that needs attention.",
        4 => "Your pain level is concerning and requires careful management.",
        _ => "I'm concerned about your high pain level. This needs immediate attention.",
    }
}

pub fn escalation_section() -> ResponseSection {
    ResponseSection::titled(
        SectionKind::Escalation,
        ESCALATION_HEADING,
        vec![ESCALATION_NOTICE.to_string()],
    )
}

/// Escalation section for the score, if one is owed.
pub fn escalation_for(severity: Option<SeverityScore>) -> Option<ResponseSection> {
    severity
        .filter(SeverityScore::needs_escalation)
        .map(|_| escalation_section())
}
