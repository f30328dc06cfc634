//! Follow-up questions after a pain care tip.
//!
//! A question is routed by keyword to a topic and answered from a
//! moderate-severity pipeline run. Generated text is used only when it stays
//! on the topic; otherwise a canned topic text stands in.

use serde::{Deserialize, Serialize};

use super::rag::context::excerpt;
use crate::models::ComposedResponse;

/// Characters of on-topic generated text kept in a topic answer.
pub const ON_TOPIC_CHARS: usize = 400;

/// Characters of generated text appended to the provider checklist.
pub const PROVIDER_GUIDANCE_CHARS: usize = 300;

/// Generated text must be longer than this to back the provider checklist.
const PROVIDER_GUIDANCE_MIN_CHARS: usize = 50;

pub const TOPIC_PROMPT: &str = "What specific aspect of pain management would you like to know more about? \
I can provide evidence-based information on exercises, treatments, when to contact your doctor, \
or general pain relief strategies.";

pub const TOPIC_SUGGESTIONS: [&str; 6] = [
    "Evidence-based exercises",
    "Pain medications",
    "When to see specialist",
    "Pain tracking methods",
    "Heat/cold therapy",
    "Relaxation techniques",
];

const TRIGGER_WORDS: [&str; 5] = ["exercise", "therapy", "medication", "doctor", "healthcare"];

const EXERCISE_WORDS: [&str; 4] = ["exercise", "stretch", "physical", "movement"];

const EXERCISE_TEXT: &str = "Gentle exercises like walking, stretching, and range-of-motion activities \
can help with pain management. Always consult your healthcare provider before starting new exercises.";

const MEDICATION_TEXT: &str = "It's important to work with your healthcare provider to find the right \
pain management approach. They can help determine if medication adjustments or new treatments might \
help with your pain.";

const PROVIDER_CHECKLIST: [&str; 4] = [
    "Describe the location, intensity, and timing of your pain",
    "Share what makes it better or worse",
    "Mention how it affects your daily activities",
    "Keep a pain diary to track patterns",
];

/// What a follow-up question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpTopic {
    Exercise,
    Medication,
    Provider,
    /// Mentions a trigger word (e.g. "therapy") but no specific topic.
    General,
}

impl FollowUpTopic {
    /// `None` when the question names none of the follow-up topics.
    pub fn detect(question: &str) -> Option<Self> {
        let question = question.to_lowercase();
        if !TRIGGER_WORDS.iter().any(|w| question.contains(w)) {
            return None;
        }
        Some(if question.contains("exercise") {
            Self::Exercise
        } else if question.contains("medication") {
            Self::Medication
        } else if question.contains("doctor") || question.contains("healthcare") {
            Self::Provider
        } else {
            Self::General
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::Medication => "medication",
            Self::Provider => "provider",
            Self::General => "general",
        }
    }
}

/// Answer to one follow-up question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpReply {
    /// Unset when the question was not recognized.
    pub topic: Option<FollowUpTopic>,
    pub text: String,
    /// Topics offered back to the user alongside the topic prompt.
    pub suggestions: Vec<String>,
}

impl FollowUpReply {
    /// Ask which aspect of pain management the user means.
    pub fn topic_prompt() -> Self {
        Self {
            topic: None,
            text: TOPIC_PROMPT.to_string(),
            suggestions: TOPIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Answer `topic` from a pipeline run. An unsuccessful run yields the
    /// topic prompt.
    pub fn from_response(topic: FollowUpTopic, response: &ComposedResponse) -> Self {
        if !response.success {
            return Self::topic_prompt();
        }

        let generated = response.generated_tip.trim();
        let lower = generated.to_lowercase();
        let mut text = match topic {
            FollowUpTopic::Exercise => {
                let body = if EXERCISE_WORDS.iter().any(|w| lower.contains(w)) {
                    format!("{}...", excerpt(generated, ON_TOPIC_CHARS))
                } else {
                    EXERCISE_TEXT.to_string()
                };
                format!("Here are evidence-based exercise recommendations for pain management:\n\n{body}")
            }
            FollowUpTopic::Medication => {
                let body = if lower.contains("medication") {
                    format!("{}...", excerpt(generated, ON_TOPIC_CHARS))
                } else {
                    MEDICATION_TEXT.to_string()
                };
                format!("Regarding pain medication for Parkinson's:\n\n{body}")
            }
            FollowUpTopic::Provider => {
                let mut text = String::from("When speaking with your healthcare provider about pain:\n\n");
                for item in PROVIDER_CHECKLIST {
                    text.push_str("• ");
                    text.push_str(item);
                    text.push('\n');
                }
                if generated.chars().count() > PROVIDER_GUIDANCE_MIN_CHARS {
                    text.push_str(&format!(
                        "\nAdditional guidance: {}...",
                        excerpt(generated, PROVIDER_GUIDANCE_CHARS)
                    ));
                }
                text
            }
            FollowUpTopic::General if !generated.is_empty() => generated.to_string(),
            FollowUpTopic::General => response.predefined_tip.clone(),
        };

        if !response.sources.is_empty() {
            text.push_str(&format!(
                "\n\nThis information is based on {} specialized pain management sources.",
                response.sources.len()
            ));
        }

        Self {
            topic: Some(topic),
            text,
            suggestions: Vec::new(),
        }
    }
}
