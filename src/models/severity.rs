use serde::{Deserialize, Serialize};

use super::enums::CareTier;
use super::ModelError;

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 5;

/// A validated 1-5 severity score.
///
/// Deserialization goes through the same range check as `new`, so a cached
/// response can never carry an out-of-range score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SeverityScore(u8);

impl SeverityScore {
    /// Mid-scale score, used where no rating was given.
    pub const MODERATE: Self = Self(3);

    pub fn new(value: i64) -> Result<Self, ModelError> {
        if (MIN_SEVERITY as i64..=MAX_SEVERITY as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ModelError::SeverityOutOfRange(value))
        }
    }

    /// Map a zero-based classifier label to a score (`label + 1`).
    ///
    /// The offset is fixed by the trained model; labels past 4 have no score.
    pub fn from_raw_label(label: u32) -> Option<Self> {
        Self::new(i64::from(label) + 1).ok()
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn tier(&self) -> CareTier {
        match self.0 {
            1 | 2 => CareTier::Educational,
            3 => CareTier::BasicCare,
            4 => CareTier::AdvancedCare,
            _ => CareTier::Escalation,
        }
    }

    pub fn needs_escalation(&self) -> bool {
        self.0 == MAX_SEVERITY
    }

    /// All valid scores, lowest first.
    pub fn all() -> impl Iterator<Item = SeverityScore> {
        (MIN_SEVERITY..=MAX_SEVERITY).map(SeverityScore)
    }
}

impl TryFrom<i64> for SeverityScore {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SeverityScore> for u8 {
    fn from(score: SeverityScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for SeverityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
