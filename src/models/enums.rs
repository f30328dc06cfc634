use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Variant order is severity order; `Ord` relies on it.
str_enum!(CareTier {
    Educational => "educational",
    BasicCare => "basic_care",
    AdvancedCare => "advanced_care",
    Escalation => "escalation",
});

str_enum!(Tone {
    GentleEncouragement => "gentle_encouragement",
    PracticalSupportive => "practical_supportive",
    SolutionFocused => "solution_focused",
    CalmProfessional => "calm_professional",
});

str_enum!(SectionKind {
    Opening => "opening",
    CareRecommendation => "care_recommendation",
    EvidenceGuidance => "evidence_guidance",
    Escalation => "escalation",
    Sources => "sources",
    Media => "media",
    Notice => "notice",
});

/// Indexed content type of a knowledge passage.
///
/// The index is populated by an external collaborator, so any unrecognised
/// or missing type deserializes to `Unknown` instead of failing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    WebPage,
    Video,
    Podcast,
    #[default]
    Unknown,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebPage => "web_page",
            Self::Video => "video",
            Self::Podcast => "podcast",
            Self::Unknown => "unknown",
        }
    }

    /// Video and audio content.
    pub fn is_playable(&self) -> bool {
        matches!(self, Self::Video | Self::Podcast)
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "web_page" => Self::WebPage,
            "video" => Self::Video,
            "podcast" => Self::Podcast,
            _ => Self::Unknown,
        }
    }
}

impl From<ContentType> for String {
    fn from(c: ContentType) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
