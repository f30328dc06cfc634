use crate::models::{SeverityScore, Tone, ToneInfo};

/// Example phrasing the elaboration should borrow for each tone.
pub fn tone_hint(tone: Tone) -> &'static str {
    match tone {
        Tone::GentleEncouragement => "\"Research shows gentle approaches...\", \"Studies indicate...\"",
        Tone::PracticalSupportive => "\"Pain specialists recommend...\", \"Evidence-based techniques include...\"",
        Tone::SolutionFocused => "\"Pain management research suggests...\", \"Clinical studies show...\"",
        Tone::CalmProfessional => "\"Medical literature indicates...\", \"Pain experts advise...\"",
    }
}

/// System instruction for the evidence-based elaboration.
pub fn build_care_tip_system_prompt(tone: &ToneInfo, context: &str, predefined_tip: &str) -> String {
    format!(
        "You are a specialized Parkinson's disease pain management assistant. \
Your job is to add NEW information that is not already mentioned in the predefined tip below. \
Do not repeat or paraphrase the predefined tip.\n\
\n\
Write 2-3 sentences of evidence-based guidance drawn only from the context. \
Match the {tone} tone using phrases like {hint}. \
Do not diagnose and do not suggest medication changes.\n\
\n\
FOCUS: {focus}\n\
\n\
Context:\n\
{context}\n\
\n\
Predefined tip:\n\
{predefined_tip}",
        tone = tone.tone.as_str(),
        hint = tone_hint(tone.tone),
        focus = tone.focus,
    )
}

/// User line carrying the rating.
pub fn build_care_tip_user_prompt(severity: SeverityScore) -> String {
    format!(
        "I have pain severity {}/5. Add evidence-based guidance that complements the predefined tip.",
        severity.value()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(t: Tone) -> ToneInfo {
        ToneInfo {
            tone: t,
            focus: "immediate_relief_strategies".into(),
        }
    }

    #[test]
    fn system_prompt_carries_grounding() {
        let prompt = build_care_tip_system_prompt(
            &tone(Tone::PracticalSupportive),
            "Source: APDA - Heat\nWarmth relaxes muscles...",
            "Warm packs may help.",
        );
        assert!(prompt.contains("NEW information"));
        assert!(prompt.contains("FOCUS: immediate_relief_strategies"));
        assert!(prompt.contains("Source: APDA - Heat"));
        assert!(prompt.contains("Warm packs may help."));
        assert!(prompt.contains("practical_supportive"));
        assert!(prompt.contains("Pain specialists recommend"));
    }

    #[test]
    fn every_tone_has_a_distinct_hint() {
        let tones = [
            Tone::GentleEncouragement,
            Tone::PracticalSupportive,
            Tone::SolutionFocused,
            Tone::CalmProfessional,
        ];
        let mut hints: Vec<&str> = tones.iter().map(|t| tone_hint(*t)).collect();
        hints.sort_unstable();
        hints.dedup();
        assert_eq!(hints.len(), tones.len());
    }

    #[test]
    fn user_prompt_states_rating() {
        let prompt = build_care_tip_user_prompt(SeverityScore::new(4).unwrap());
        assert!(prompt.starts_with("I have pain severity 4/5."));
    }
}
