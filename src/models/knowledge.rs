use serde::{Deserialize, Deserializer, Serialize};

use super::enums::ContentType;

/// Organization label used when the index record carries none.
pub const UNKNOWN_ORGANIZATION: &str = "Unknown";

/// One indexed knowledge-base passage, as returned by the text index.
///
/// Records are produced by the external indexing job; absent optional
/// fields deserialize to empty values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeItem {
    pub organization: String,
    pub title: String,
    pub source_url: String,
    pub content_type: ContentType,
    pub media_url: Option<String>,
    pub body: String,
    pub description: Option<String>,
    pub duration: Option<String>,
    /// Similarity score from the search call. Opaque; never used for ranking here.
    /// A `null` (how JSON writes a non-finite float) reads back as 0.0.
    #[serde(deserialize_with = "score_or_zero")]
    pub score: f32,
}

fn score_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl KnowledgeItem {
    /// Media URL, treating an empty string as absent.
    pub fn media_url(&self) -> Option<&str> {
        self.media_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Organization, falling back to `"Unknown"` for blank values.
    pub fn organization(&self) -> &str {
        if self.organization.trim().is_empty() {
            UNKNOWN_ORGANIZATION
        } else {
            &self.organization
        }
    }

    /// A generic textual page with no attached media.
    pub fn is_article(&self) -> bool {
        self.content_type == ContentType::WebPage && self.media_url().is_none()
    }

    /// Video/audio content, or anything carrying a media URL.
    pub fn is_media(&self) -> bool {
        self.content_type.is_playable() || self.media_url().is_some()
    }
}

/// Which category a retrieval sweep collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalKind {
    Articles,
    Media,
}

impl RetrievalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Articles => "articles",
            Self::Media => "media",
        }
    }

    /// URL that identifies an item of this kind: the source page for
    /// articles, the playable URL for media. `None` means the item has no
    /// usable identity for this kind and must be skipped.
    pub fn primary_url<'a>(&self, item: &'a KnowledgeItem) -> Option<&'a str> {
        match self {
            Self::Articles => Some(item.source_url.as_str()),
            Self::Media => item.media_url(),
        }
    }

    pub fn accepts(&self, item: &KnowledgeItem) -> bool {
        match self {
            Self::Articles => item.is_article(),
            Self::Media => item.is_media(),
        }
    }
}

/// A selected passage together with the query that surfaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedItem {
    pub item: KnowledgeItem,
    pub matched_query: String,
}

/// Ordered, deduplicated, organization-diversified selection of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub kind: RetrievalKind,
    pub items: Vec<RetrievedItem>,
    /// Whether the broad fallback query was issued.
    pub used_fallback: bool,
    /// Queries that failed after all attempts (logged, not surfaced).
    pub failed_queries: usize,
}

impl RetrievalResult {
    pub fn empty(kind: RetrievalKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            used_fallback: false,
            failed_queries: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeItem> {
        self.items.iter().map(|r| &r.item)
    }

    /// Number of distinct organizations backing the selection.
    pub fn distinct_organizations(&self) -> usize {
        let mut orgs: Vec<&str> = self.iter().map(|i| i.organization()).collect();
        orgs.sort_unstable();
        orgs.dedup();
        orgs.len()
    }
}
