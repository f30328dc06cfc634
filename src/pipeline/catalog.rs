//! Care-tip catalog: the fixed rule table behind every care tier.
//!
//! Each tier owns one predefined tip, the tone the generated elaboration must
//! match, and the focus area it should stay on. Lookup is deterministic and
//! rejects scores outside 1-5 rather than clamping them.

use thiserror::Error;

use crate::models::{CareTier, SeverityScore, Tone, ToneInfo};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Severity {0} is outside the 1-5 range")]
    OutOfRange(i64),
}

/// One row of the catalog.
#[derive(Debug, PartialEq, Eq)]
pub struct CareTipEntry {
    pub tier: CareTier,
    pub min_score: u8,
    pub max_score: u8,
    pub tip: &'static str,
    pub tone: Tone,
    pub focus: &'static str,
}

impl CareTipEntry {
    pub fn covers(&self, score: u8) -> bool {
        (self.min_score..=self.max_score).contains(&score)
    }

    pub fn tone_info(&self) -> ToneInfo {
        ToneInfo {
            tone: self.tone,
            focus: self.focus.to_string(),
        }
    }
}

static PAIN_CARE_TIPS: [CareTipEntry; 4] = [
    CareTipEntry {
        tier: CareTier::Educational,
        min_score: 1,
        max_score: 2,
        tip: "I'm glad you've been able to manage your pain. Exercising regularly and making sure to get adequate nutrition can go a long way when regulating pain.\n\nMeditating can be a good substitution if you are in too much pain to exercise.",
        tone: Tone::GentleEncouragement,
        focus: "maintenance_and_prevention",
    },
    CareTipEntry {
        tier: CareTier::BasicCare,
        min_score: 3,
        max_score: 3,
        tip: "Warm packs may help control your pain. However, avoid electric heating pads as they can cause burns with prolonged use.\n\nIf your pain is due to acute injury, consider using a cold pack instead to reduce pain and swelling. This should typically not be done for more than 20 minutes.",
        tone: Tone::PracticalSupportive,
        focus: "immediate_relief_strategies",
    },
    CareTipEntry {
        tier: CareTier::AdvancedCare,
        min_score: 4,
        max_score: 4,
        tip: "Try using the journal as a 'pain log' to note when the pain happens, where it is, and what it feels like. Also, write down what has or hasn't helped ease the pain. This can help you better understand what might be causing it.\n\nSharing this with your healthcare providers can help them identify and treat your pain more accurately.",
        tone: Tone::SolutionFocused,
        focus: "tracking_and_healthcare_collaboration",
    },
    CareTipEntry {
        tier: CareTier::Escalation,
        min_score: 5,
        max_score: 5,
        tip: "I recommend you speak to your doctor or your nurse about the pain you are experiencing.\n\nThey can help you find the underlying cause of your pain.",
        tone: Tone::CalmProfessional,
        focus: "healthcare_provider_consultation",
    },
];

/// Tier table for the pain care flow.
#[derive(Debug, Clone, Copy)]
pub struct CareTipCatalog {
    entries: &'static [CareTipEntry],
}

impl CareTipCatalog {
    pub fn pain() -> Self {
        Self {
            entries: &PAIN_CARE_TIPS,
        }
    }

    /// Entry for a raw severity value. Out-of-range values are an error.
    pub fn lookup(&self, severity: i64) -> Result<&'static CareTipEntry, CatalogError> {
        let score = u8::try_from(severity).map_err(|_| CatalogError::OutOfRange(severity))?;
        self.entries
            .iter()
            .find(|e| e.covers(score))
            .ok_or(CatalogError::OutOfRange(severity))
    }

    /// Entry for an already-validated score. Every valid score is covered.
    pub fn for_score(&self, score: SeverityScore) -> Result<&'static CareTipEntry, CatalogError> {
        self.lookup(i64::from(score.value()))
    }

    pub fn entries(&self) -> &'static [CareTipEntry] {
        self.entries
    }
}

impl Default for CareTipCatalog {
    fn default() -> Self {
        Self::pain()
    }
}
