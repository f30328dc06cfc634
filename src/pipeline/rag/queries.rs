//! Severity-specific search vocabularies.
//!
//! Lower tiers lean on prevention and wellness terms; higher tiers on
//! treatment and escalation terms. Order matters: the sweep stops early once
//! enough candidates are collected.

use crate::models::SeverityScore;

/// Broad domain term used when every tier query came back empty.
pub const BROAD_FALLBACK_QUERY: &str = "parkinson";

/// `matched_query` label recorded for items found by the broad fallback.
pub const FALLBACK_QUERY_LABEL: &str = "fallback_parkinson";

/// Suffix appended to each term when sweeping for media.
pub const MEDIA_QUERY_SUFFIX: &str = " video podcast";

const PAIN_CORE: [&str; 5] = ["pain", "ache", "discomfort", "soreness", "distress"];

static PAIN_SEVERITY_1: &[&str] = &[
    "exercise", "physical activity", "workout", "training", "yoga", "mindful",
    "meditation", "mindfulness", "contemplation", "introspection", "concentration",
    "nutrition", "dietary habits", "nourishment", "healthy eating", "balanced diet",
];

static PAIN_SEVERITY_2: &[&str] = &[
    "exercise", "physical activity", "workout", "training", "exertion",
    "meditation", "mindfulness", "contemplation", "introspection", "concentration",
    "nutrition", "dietary habits", "nourishment", "healthy eating", "balanced diet",
];

static PAIN_SEVERITY_3: &[&str] = &[
    "pain relief", "pain alleviation", "analgesia", "soothing", "comfort",
    "pain therapy", "pain management", "therapeutic intervention", "pain treatment",
    "managing pain", "pain control", "pain coping strategies", "pain self-care",
    "pain treatment care tips", "pain care advice", "pain relief guidelines", "pain management tips",
];

static PAIN_SEVERITY_4: &[&str] = &[
    "chronic pain", "persistent pain", "long-term pain", "chronic pain syndrome",
    "tracking", "monitoring", "logging", "documenting", "recording", "pain medication",
    "healthcare collaboration", "clinical teamwork", "coordinated care", "multidisciplinary care",
    "pain treatment care tips", "pain care advice", "pain relief guidelines", "pain management tips",
];

static PAIN_SEVERITY_5: &[&str] = &[
    "severe pain", "intense pain", "acute pain", "excruciating pain", "pain medication",
    "pain relievers", "analgesics", "pharmacologic pain treatment", "pain meds",
    "urgent pain management", "emergency pain relief", "rapid analgesia", "immediate pain control",
    "healthcare pain consultation", "clinical pain evaluation", "pain specialist consultation",
];

fn pain_terms(severity: SeverityScore) -> &'static [&'static str] {
    match severity.value() {
        1 => PAIN_SEVERITY_1,
        2 => PAIN_SEVERITY_2,
        3 => PAIN_SEVERITY_3,
        4 => PAIN_SEVERITY_4,
        _ => PAIN_SEVERITY_5,
    }
}

/// Ordered query terms for a symptom at a severity.
///
/// Only pain has a curated vocabulary; any other symptom is searched by its
/// own name.
pub fn tier_queries(symptom: &str, severity: SeverityScore) -> Vec<String> {
    let symptom = symptom.trim().to_lowercase();
    if symptom == "pain" {
        PAIN_CORE
            .iter()
            .chain(pain_terms(severity).iter())
            .map(|t| t.to_string())
            .collect()
    } else if symptom.is_empty() {
        vec!["pain".to_string()]
    } else {
        vec![symptom.replace('_', " ")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(n: i64) -> SeverityScore {
        SeverityScore::new(n).unwrap()
    }

    #[test]
    fn pain_queries_start_with_core_terms() {
        for s in SeverityScore::all() {
            let queries = tier_queries("pain", s);
            assert_eq!(&queries[..5], &PAIN_CORE.map(String::from)[..]);
        }
    }

    #[test]
    fn low_tiers_emphasize_wellness() {
        let queries = tier_queries("pain", score(1));
        assert!(queries.iter().any(|q| q == "meditation"));
        assert!(!queries.iter().any(|q| q == "severe pain"));
    }

    #[test]
    fn top_tier_emphasizes_escalation() {
        let queries = tier_queries("Pain", score(5));
        assert!(queries.iter().any(|q| q == "pain specialist consultation"));
        assert!(!queries.iter().any(|q| q == "yoga"));
    }

    #[test]
    fn no_duplicate_terms_within_a_tier() {
        for s in SeverityScore::all() {
            let mut queries = tier_queries("pain", s);
            let before = queries.len();
            queries.sort();
            queries.dedup();
            assert_eq!(queries.len(), before, "duplicate term at severity {s}");
        }
    }

    #[test]
    fn other_symptoms_search_by_name() {
        assert_eq!(
            tier_queries("unusual_sweating", score(3)),
            vec!["unusual sweating".to_string()]
        );
        assert_eq!(tier_queries("  ", score(2)), vec!["pain".to_string()]);
    }
}
