//! Supported symptoms and their dialogue texts.
//!
//! Only pain has the full assessment and care-tip flow. The other symptoms
//! get a clarifier, education and tracking prompt, and a monitoring response.

use crate::models::SeverityScore;

pub const DEFAULT_CLARIFIER: &str = "Could you clarify your symptom again?";
pub const LOST_SYMPTOM: &str = "Sorry, I lost track of the symptom. Can you tell me again?";

/// Per-symptom dialogue texts.
#[derive(Debug, PartialEq, Eq)]
pub struct SymptomGuide {
    pub clarifier: &'static str,
    pub education: &'static str,
    pub tracking_prompt: &'static str,
}

static PAIN_GUIDE: SymptomGuide = SymptomGuide {
    clarifier: "Have you felt muscle aches, cramping, or unexplained pain?",
    education: "Pain is common in Parkinson's and can come from different sources. It might be caused by poor posture, which can lead to muscle and joint aches, or by cramping when muscles stay tight (called dystonia). Some people feel a strong urge to move and can't stay still. Others may feel pain linked to how the brain processes pain signals, even when nothing seems wrong in the body.",
    tracking_prompt: "Pain can interfere with your ability to stay active and enjoy life. Keep track of your pain, so together we can find practical ways to manage it so you can keep doing the things you love.",
};

static LIGHT_HEADEDNESS_GUIDE: SymptomGuide = SymptomGuide {
    clarifier: "Do you ever feel light-headed or dizzy, especially when standing up?",
    education: "You may feel dizzy or lightheaded, especially when standing up or moving quickly. This can make you feel unsteady and increase your risk of falls. Light-headedness or faintness is a known uncomfortable symptom of Parkinson's disease.",
    tracking_prompt: "Light-headedness can make it hard to feel safe when moving around. Take the time to note when this happens and how it affects you so I can share care tips to help you manage.",
};

static UNUSUAL_SWEATING_GUIDE: SymptomGuide = SymptomGuide {
    clarifier: "Have you noticed unusual sweating, too much or too little?",
    education: "You may experience excessive sweating, often during \"off\" periods and during involuntary movements. Parkinson's disease can cause problems in the autonomic nervous system resulting in excessive sweating.",
    tracking_prompt: "Excessive sweating can interfere with your daily life. Take the time to track these symptoms so I can better support you by sending helpful care tips.",
};

static SKIN_CHANGES_GUIDE: SymptomGuide = SymptomGuide {
    clarifier: "Has your skin become dry, itchy, or easily irritated?",
    education: "You may experience rashes, dryness, and other unusual changes in your skin. Seborrheic dermatitis, or red, scaly, itchy and flaky skin, could be a symptom of Parkinson's disease.",
    tracking_prompt: "Skin problems are common and can be easily controlled. Keep track of your skin changes daily so I can support you with helpful care tips.",
};

/// Closed set of symptoms the dialogue knows, with `Other` as catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymptomKind {
    Pain,
    LightHeadedness,
    UnusualSweating,
    SkinChanges,
    Other(String),
}

impl SymptomKind {
    /// Parse a dialogue parameter, accepting the common aliases.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "pain" => Self::Pain,
            "light_headedness" | "light-headedness" | "lightheadedness" | "dizziness" => {
                Self::LightHeadedness
            }
            "unusual_sweating" | "unusual sweating" | "sweating" => Self::UnusualSweating,
            "skin_changes" | "skin changes" | "skin" => Self::SkinChanges,
            _ => Self::Other(normalized),
        }
    }

    /// Wording used in user-facing text.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pain => "pain",
            Self::LightHeadedness => "light-headedness",
            Self::UnusualSweating => "unusual sweating",
            Self::SkinChanges => "skin changes",
            Self::Other(name) => name,
        }
    }

    pub fn guide(&self) -> Option<&'static SymptomGuide> {
        match self {
            Self::Pain => Some(&PAIN_GUIDE),
            Self::LightHeadedness => Some(&LIGHT_HEADEDNESS_GUIDE),
            Self::UnusualSweating => Some(&UNUSUAL_SWEATING_GUIDE),
            Self::SkinChanges => Some(&SKIN_CHANGES_GUIDE),
            Self::Other(_) => None,
        }
    }

    /// Whether the assessment and care-tip pipeline covers this symptom.
    pub fn has_care_pipeline(&self) -> bool {
        matches!(self, Self::Pain)
    }
}

impl std::fmt::Display for SymptomKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

pub fn clarifier(symptom: &str) -> &'static str {
    SymptomKind::parse(symptom)
        .guide()
        .map_or(DEFAULT_CLARIFIER, |g| g.clarifier)
}

/// Education text followed by the tracking prompt.
pub fn definition_and_goal(symptom: &str) -> Vec<String> {
    match SymptomKind::parse(symptom).guide() {
        Some(guide) => vec![guide.education.to_string(), guide.tracking_prompt.to_string()],
        None => vec![LOST_SYMPTOM.to_string()],
    }
}

/// Acknowledgement shown right after an assessment is scored.
pub fn assessment_submitted_message(severity: SeverityScore) -> String {
    format!(
        "Thank you! Your assessment has been submitted. Your severity level is {}/5.",
        severity.value()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve() {
        assert_eq!(SymptomKind::parse("Dizziness"), SymptomKind::LightHeadedness);
        assert_eq!(SymptomKind::parse("lightheadedness"), SymptomKind::LightHeadedness);
        assert_eq!(SymptomKind::parse("sweating"), SymptomKind::UnusualSweating);
        assert_eq!(SymptomKind::parse(" skin "), SymptomKind::SkinChanges);
        assert_eq!(SymptomKind::parse("PAIN"), SymptomKind::Pain);
        assert_eq!(
            SymptomKind::parse("Tremor"),
            SymptomKind::Other("tremor".into())
        );
    }

    #[test]
    fn only_pain_has_care_pipeline() {
        assert!(SymptomKind::Pain.has_care_pipeline());
        assert!(!SymptomKind::SkinChanges.has_care_pipeline());
        assert!(!SymptomKind::Other("tremor".into()).has_care_pipeline());
    }

    #[test]
    fn clarifier_falls_back_for_unknown() {
        assert!(clarifier("pain").contains("muscle aches"));
        assert!(clarifier("light_headedness").contains("standing up"));
        assert_eq!(clarifier("tremor"), DEFAULT_CLARIFIER);
    }

    #[test]
    fn definition_and_goal_pairs_texts() {
        let lines = definition_and_goal("unusual_sweating");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("autonomic nervous system"));
        assert!(lines[1].starts_with("Excessive sweating"));

        assert_eq!(definition_and_goal(""), vec![LOST_SYMPTOM.to_string()]);
    }

    #[test]
    fn submitted_message_states_score() {
        let msg = assessment_submitted_message(SeverityScore::new(4).unwrap());
        assert_eq!(
            msg,
            "Thank you! Your assessment has been submitted. Your severity level is 4/5."
        );
    }

    #[test]
    fn display_uses_readable_names() {
        assert_eq!(SymptomKind::UnusualSweating.to_string(), "unusual sweating");
        assert_eq!(SymptomKind::parse("skin_changes").to_string(), "skin changes");
    }
}
