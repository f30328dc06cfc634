//! Intake answers → classifier features → severity score.
//!
//! The feature schema is a fixed contract of the trained model: seven fields,
//! in struct order. Every field is required; a missing or blank answer fails
//! the whole classification instead of being default-filled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::classifier::SeverityClassifier;
use super::{ClassificationError, IntakeError, SeverityError};
use crate::models::{Answer, AnswerValue, SeverityScore};

pub const PAIN_TYPE: &str = "pain_type";
pub const RADIATES: &str = "radiates";
pub const DURATION: &str = "duration";
pub const SELF_SCORE: &str = "self_score";
pub const ACTIVITY_SCORE: &str = "activity_score";
pub const MOOD_SCORE: &str = "mood_score";
pub const SLEEP_SCORE: &str = "sleep_score";

/// Recognised answer fields, in classifier order.
pub const FEATURE_FIELDS: [&str; 7] = [
    PAIN_TYPE,
    RADIATES,
    DURATION,
    SELF_SCORE,
    ACTIVITY_SCORE,
    MOOD_SCORE,
    SLEEP_SCORE,
];

/// Fixed-schema input record for the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub pain_type: String,
    pub radiates: String,
    pub duration: String,
    pub self_score: i64,
    pub activity_score: i64,
    pub mood_score: i64,
    pub sleep_score: i64,
}

impl FeatureRecord {
    /// Filter and coerce an answer into the feature schema.
    pub fn from_answer(answer: &Answer) -> Result<Self, IntakeError> {
        Ok(Self {
            pain_type: text_field(answer, PAIN_TYPE)?,
            radiates: text_field(answer, RADIATES)?,
            duration: text_field(answer, DURATION)?,
            self_score: integer_field(answer, SELF_SCORE)?,
            activity_score: integer_field(answer, ACTIVITY_SCORE)?,
            mood_score: integer_field(answer, MOOD_SCORE)?,
            sleep_score: integer_field(answer, SLEEP_SCORE)?,
        })
    }
}

fn required<'a>(answer: &'a Answer, field: &'static str) -> Result<&'a AnswerValue, IntakeError> {
    match answer.get(field) {
        Some(AnswerValue::Text(s)) if s.trim().is_empty() => {
            Err(IntakeError::IncompleteAnswer(field))
        }
        Some(value) => Ok(value),
        None => Err(IntakeError::IncompleteAnswer(field)),
    }
}

fn text_field(answer: &Answer, field: &'static str) -> Result<String, IntakeError> {
    let value = required(answer, field)?;
    Ok(match value {
        AnswerValue::Text(s) => s.trim().to_string(),
        other => other.render(),
    })
}

fn integer_field(answer: &Answer, field: &'static str) -> Result<i64, IntakeError> {
    let value = required(answer, field)?;
    coerce_integer(value).ok_or_else(|| IntakeError::InvalidField {
        field,
        value: value.render(),
    })
}

/// Integers pass through; integral floats and numeric strings are converted.
fn coerce_integer(value: &AnswerValue) -> Option<i64> {
    match value {
        AnswerValue::Integer(n) => Some(*n),
        AnswerValue::Float(f) => integral(*f),
        AnswerValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
    }
}

/// The user's own 1-5 rating, when present and in range. Used for symptoms
/// that have no classifier.
pub fn self_reported_severity(answer: &Answer) -> Option<SeverityScore> {
    answer
        .get(SELF_SCORE)
        .and_then(coerce_integer)
        .and_then(|n| SeverityScore::new(n).ok())
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Maps collected answers to a severity score through the classifier.
#[derive(Clone)]
pub struct FeatureAdapter {
    classifier: Arc<dyn SeverityClassifier>,
}

impl FeatureAdapter {
    pub fn new(classifier: Arc<dyn SeverityClassifier>) -> Self {
        Self { classifier }
    }

    /// Classify an answer. Classifier failures propagate; callers choose
    /// the fallback.
    pub fn classify(&self, answer: &Answer) -> Result<SeverityScore, SeverityError> {
        let features = FeatureRecord::from_answer(answer)?;
        let label = self.classifier.predict(&features)?;
        let score = SeverityScore::from_raw_label(label)
            .ok_or(ClassificationError::LabelOutOfRange(label))?;

        tracing::debug!(label, score = score.value(), "Classified intake answer");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed label and records every feature record it sees.
    struct FixedClassifier {
        label: u32,
        seen: Mutex<Vec<FeatureRecord>>,
    }

    impl FixedClassifier {
        fn new(label: u32) -> Self {
            Self {
                label,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl SeverityClassifier for FixedClassifier {
        fn predict(&self, features: &FeatureRecord) -> Result<u32, ClassificationError> {
            self.seen.lock().unwrap().push(features.clone());
            Ok(self.label)
        }
    }

    /// Derives the label from the self-reported score, like a toy model.
    struct SelfScoreClassifier;

    impl SeverityClassifier for SelfScoreClassifier {
        fn predict(&self, features: &FeatureRecord) -> Result<u32, ClassificationError> {
            Ok((features.self_score.clamp(1, 5) - 1) as u32)
        }
    }

    struct BrokenClassifier;

    impl SeverityClassifier for BrokenClassifier {
        fn predict(&self, _features: &FeatureRecord) -> Result<u32, ClassificationError> {
            Err(ClassificationError::Connection("http://localhost:8501".into()))
        }
    }

    fn complete_answer() -> Answer {
        Answer::new()
            .with(PAIN_TYPE, "Sharp")
            .with(RADIATES, "No")
            .with(DURATION, "Last week")
            .with(SELF_SCORE, 3)
            .with(ACTIVITY_SCORE, 2.0)
            .with(MOOD_SCORE, "2")
            .with(SLEEP_SCORE, " 3.0 ")
    }

    #[test]
    fn coerces_numeric_shapes() {
        let record = FeatureRecord::from_answer(&complete_answer()).unwrap();
        assert_eq!(record.self_score, 3);
        assert_eq!(record.activity_score, 2);
        assert_eq!(record.mood_score, 2);
        assert_eq!(record.sleep_score, 3);
        assert_eq!(record.pain_type, "Sharp");
    }

    #[test]
    fn ignores_unrecognised_fields() {
        let answer = complete_answer().with("severity_class", "Moderate");
        let classifier = Arc::new(FixedClassifier::new(2));
        let adapter = FeatureAdapter::new(classifier.clone());
        adapter.classify(&answer).unwrap();

        let seen = classifier.seen.lock().unwrap();
        let json = serde_json::to_value(&seen[0]).unwrap();
        assert_eq!(json.as_object().unwrap().len(), FEATURE_FIELDS.len());
        assert!(json.get("severity_class").is_none());
    }

    #[test]
    fn missing_field_is_incomplete() {
        let answer = Answer::new()
            .with(PAIN_TYPE, "Dull")
            .with(RADIATES, "Yes")
            .with(DURATION, "Today")
            .with(SELF_SCORE, 4)
            .with(ACTIVITY_SCORE, 4)
            .with(MOOD_SCORE, 3);
        assert_eq!(
            FeatureRecord::from_answer(&answer).unwrap_err(),
            IntakeError::IncompleteAnswer(SLEEP_SCORE)
        );
    }

    #[test]
    fn blank_text_is_incomplete() {
        let answer = complete_answer().with(DURATION, "   ");
        assert_eq!(
            FeatureRecord::from_answer(&answer).unwrap_err(),
            IntakeError::IncompleteAnswer(DURATION)
        );
    }

    #[test]
    fn non_numeric_score_is_invalid() {
        let answer = complete_answer().with(MOOD_SCORE, "pretty bad");
        assert_eq!(
            FeatureRecord::from_answer(&answer).unwrap_err(),
            IntakeError::InvalidField {
                field: MOOD_SCORE,
                value: "pretty bad".into(),
            }
        );
    }

    #[test]
    fn fractional_score_is_invalid() {
        let answer = complete_answer().with(SELF_SCORE, 2.5);
        assert!(matches!(
            FeatureRecord::from_answer(&answer),
            Err(IntakeError::InvalidField { field: SELF_SCORE, .. })
        ));
    }

    #[test]
    fn label_offset_maps_zero_to_one_and_four_to_five() {
        let low = FeatureAdapter::new(Arc::new(FixedClassifier::new(0)));
        assert_eq!(low.classify(&complete_answer()).unwrap().value(), 1);

        let high = FeatureAdapter::new(Arc::new(FixedClassifier::new(4)));
        assert_eq!(high.classify(&complete_answer()).unwrap().value(), 5);
    }

    #[test]
    fn label_without_score_is_classification_error() {
        let adapter = FeatureAdapter::new(Arc::new(FixedClassifier::new(7)));
        assert!(matches!(
            adapter.classify(&complete_answer()),
            Err(SeverityError::Classification(ClassificationError::LabelOutOfRange(7)))
        ));
    }

    #[test]
    fn classification_is_deterministic() {
        let adapter = FeatureAdapter::new(Arc::new(SelfScoreClassifier));
        let answer = complete_answer().with(SELF_SCORE, 4);
        let first = adapter.classify(&answer).unwrap();
        for _ in 0..10 {
            assert_eq!(adapter.classify(&answer).unwrap(), first);
        }
        assert_eq!(first.value(), 4);
    }

    #[test]
    fn classifier_failure_propagates() {
        let adapter = FeatureAdapter::new(Arc::new(BrokenClassifier));
        assert!(matches!(
            adapter.classify(&complete_answer()),
            Err(SeverityError::Classification(ClassificationError::Connection(_)))
        ));
    }

    #[test]
    fn self_reported_severity_needs_in_range_score() {
        assert_eq!(
            self_reported_severity(&Answer::new().with(SELF_SCORE, "5")).map(|s| s.value()),
            Some(5)
        );
        assert_eq!(self_reported_severity(&Answer::new().with(SELF_SCORE, 8)), None);
        assert_eq!(self_reported_severity(&Answer::new()), None);
    }

    #[test]
    fn intake_failure_skips_classifier() {
        let classifier = Arc::new(FixedClassifier::new(1));
        let adapter = FeatureAdapter::new(classifier.clone());
        let result = adapter.classify(&Answer::new());
        assert!(matches!(result, Err(SeverityError::Intake(_))));
        assert!(classifier.seen.lock().unwrap().is_empty());
    }
}
