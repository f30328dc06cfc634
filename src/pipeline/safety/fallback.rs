//! Responses used when the composed path cannot run.
//!
//! A user-visible failure always carries an actionable tip: a canned tip for
//! the severity band when a score is known, a generic "see your provider"
//! message when it is not.

use crate::models::{ComposedResponse, ResponseSection, SectionKind, SeverityScore};

use super::escalation::escalation_for;

pub const FALLBACK_NOTICE: &str =
    "Note: Enhanced pain management system temporarily unavailable. Using basic recommendations.";

pub const GENERIC_ERROR_TIP: &str = "I apologize, but I'm having trouble processing your request right now. \
For pain management, I recommend consulting with your healthcare provider. \
You can also try gentle exercises, warm compresses, and relaxation techniques for mild pain relief.";

/// Canned tip by severity band. Out-of-band values fall to the nearest band.
pub fn fallback_tip(severity: i64) -> &'static str {
    match severity {
        i64::MIN..=2 => "For mild pain, try gentle exercises, warm compresses, and relaxation techniques. Regular movement can help manage Parkinson's-related pain.",
        3 => "For moderate pain, consider warm packs (avoid electric heating pads), gentle stretching, and tracking when the pain occurs. This information will be helpful for your healthcare team.",
        4 => "For significant pain, keep a pain journal noting when it happens and what helps. Share this information with your healthcare providers for better pain management strategies.",
        _ => "For severe pain, I recommend speaking with your doctor or nurse as soon as possible. They can help identify the cause and provide appropriate treatment.",
    }
}

/// Safety response for a failure after the severity was known.
///
/// `severity` is the caller's raw value; it may be outside 1-5 when that is
/// the reason composition failed. Escalation is owed only for an exact 5.
pub fn fallback_response(symptom: &str, severity: i64, error: &str) -> ComposedResponse {
    let score = SeverityScore::new(severity).ok();
    let tip = fallback_tip(severity);

    tracing::warn!(symptom, severity, error, "Using fallback care tip");

    let mut response = ComposedResponse::bare(symptom, score);
    response.success = false;
    response.error_detail = Some(error.to_string());
    response.escalation_needed = severity == 5;
    response.predefined_tip = tip.to_string();
    response.sections.push(ResponseSection::new(
        SectionKind::Opening,
        vec![format!("I understand you're experiencing {symptom}.")],
    ));
    response.sections.push(ResponseSection::new(
        SectionKind::CareRecommendation,
        vec![tip.to_string()],
    ));
    if let Some(section) = escalation_for(score) {
        response.sections.push(section);
    }
    response.sections.push(ResponseSection::new(
        SectionKind::Notice,
        vec![FALLBACK_NOTICE.to_string()],
    ));
    response
}

/// Failure before any severity existed (intake or classification).
pub fn intake_failure_response(symptom: &str, error: &str) -> ComposedResponse {
    tracing::warn!(symptom, error, "Assessment could not be scored");

    let mut response = ComposedResponse::bare(symptom, None);
    response.success = false;
    response.error_detail = Some(error.to_string());
    response.predefined_tip = GENERIC_ERROR_TIP.to_string();
    response.sections.push(ResponseSection::new(
        SectionKind::Notice,
        vec![GENERIC_ERROR_TIP.to_string()],
    ));
    response
}
