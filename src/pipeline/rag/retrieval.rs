use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::queries::{tier_queries, BROAD_FALLBACK_QUERY, FALLBACK_QUERY_LABEL, MEDIA_QUERY_SUFFIX};
use super::types::TextIndex;
use super::{IndexError, RagError};
use crate::models::{KnowledgeItem, RetrievalKind, RetrievalResult, RetrievedItem, SeverityScore};

/// Candidates requested per tier query, as a multiple of k.
const QUERY_FANOUT: usize = 5;
/// Candidates accumulated before the sweep stops early, as a multiple of k.
const SWEEP_CAP: usize = 3;
/// Candidates requested by the broad fallback query, as a multiple of k.
const FALLBACK_FANOUT: usize = 10;
/// Candidates kept from the broad fallback query, as a multiple of k.
const FALLBACK_CAP: usize = 2;

/// Multi-query sweep over the text index with dedup and organization
/// diversity.
#[derive(Clone)]
pub struct KnowledgeRetriever {
    index: Arc<dyn TextIndex>,
    query_attempts: usize,
}

impl KnowledgeRetriever {
    pub fn new(index: Arc<dyn TextIndex>) -> Self {
        Self {
            index,
            query_attempts: 1,
        }
    }

    /// Attempts per query before it counts as failed (minimum 1).
    pub fn with_query_attempts(mut self, attempts: usize) -> Self {
        self.query_attempts = attempts.max(1);
        self
    }

    /// Textual pages for the severity, at most `k`.
    pub fn search_articles(
        &self,
        severity: SeverityScore,
        symptom: &str,
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        self.search(RetrievalKind::Articles, severity, symptom, k)
    }

    /// Video and audio resources for the severity, at most `k`.
    pub fn search_media(
        &self,
        severity: SeverityScore,
        symptom: &str,
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        self.search(RetrievalKind::Media, severity, symptom, k)
    }

    fn search(
        &self,
        kind: RetrievalKind,
        severity: SeverityScore,
        symptom: &str,
        k: usize,
    ) -> Result<RetrievalResult, RagError> {
        if k == 0 {
            return Ok(RetrievalResult::empty(kind));
        }

        tracing::info!(kind = kind.as_str(), severity = severity.value(), symptom, "Searching knowledge base");

        let mut sweep = Sweep::new(kind);
        for term in tier_queries(symptom, severity) {
            let query = match kind {
                RetrievalKind::Articles => term.clone(),
                RetrievalKind::Media => format!("{term}{MEDIA_QUERY_SUFFIX}"),
            };
            match self.query_index(&query, k * QUERY_FANOUT) {
                Ok(hits) => sweep.absorb(hits, &term, k * SWEEP_CAP),
                Err(e) => sweep.record_failure(&query, e),
            }
            if sweep.candidates.len() >= k * SWEEP_CAP {
                break;
            }
        }

        let mut used_fallback = false;
        if sweep.candidates.is_empty() {
            tracing::info!(kind = kind.as_str(), "No candidates from tier queries, trying broad search");
            used_fallback = true;
            match self.query_index(BROAD_FALLBACK_QUERY, k * FALLBACK_FANOUT) {
                Ok(hits) => sweep.absorb(hits, FALLBACK_QUERY_LABEL, k * FALLBACK_CAP),
                Err(e) => sweep.record_failure(BROAD_FALLBACK_QUERY, e),
            }
        }

        if sweep.answered == 0 {
            return Err(RagError::RetrievalUnavailable {
                queries: sweep.failed,
                last_error: sweep.last_error.unwrap_or_default(),
            });
        }

        let items = diversify(sweep.candidates, k);
        tracing::info!(
            kind = kind.as_str(),
            selected = items.len(),
            failed_queries = sweep.failed,
            used_fallback,
            "Knowledge search finished"
        );

        Ok(RetrievalResult {
            kind,
            items,
            used_fallback,
            failed_queries: sweep.failed,
        })
    }

    fn query_index(&self, query: &str, k: usize) -> Result<Vec<KnowledgeItem>, IndexError> {
        let mut last_error = IndexError::Query(format!("no attempt made for '{query}'"));
        for attempt in 1..=self.query_attempts {
            match self.index.similarity_search(query, k) {
                Ok(hits) => return Ok(hits),
                Err(e) => {
                    tracing::debug!(query, attempt, error = %e, "Index query attempt failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Accumulated state of one multi-query sweep.
struct Sweep {
    kind: RetrievalKind,
    candidates: Vec<RetrievedItem>,
    seen_urls: HashSet<String>,
    answered: usize,
    failed: usize,
    last_error: Option<String>,
}

impl Sweep {
    fn new(kind: RetrievalKind) -> Self {
        Self {
            kind,
            candidates: Vec::new(),
            seen_urls: HashSet::new(),
            answered: 0,
            failed: 0,
            last_error: None,
        }
    }

    /// Keep hits of the right kind whose primary URL is new, up to `cap`
    /// candidates in total. Non-finite scores are stored as 0.0 so the
    /// item survives a JSON round trip.
    fn absorb(&mut self, hits: Vec<KnowledgeItem>, matched_query: &str, cap: usize) {
        self.answered += 1;
        for mut hit in hits {
            if self.candidates.len() >= cap {
                break;
            }
            if !self.kind.accepts(&hit) {
                continue;
            }
            let Some(url) = self.kind.primary_url(&hit) else {
                continue;
            };
            if !self.seen_urls.insert(url.to_string()) {
                continue;
            }
            if !hit.score.is_finite() {
                hit.score = 0.0;
            }
            tracing::debug!(
                organization = hit.organization(),
                title = %hit.title,
                query = matched_query,
                "Accepted knowledge candidate"
            );
            self.candidates.push(RetrievedItem {
                item: hit,
                matched_query: matched_query.to_string(),
            });
        }
    }

    fn record_failure(&mut self, query: &str, error: IndexError) {
        tracing::warn!(query, error = %error, "Knowledge query failed, continuing");
        self.failed += 1;
        self.last_error = Some(error.to_string());
    }
}

/// One item per organization in encounter order, then fill the remaining
/// slots from the rest of the pool in encounter order.
pub fn diversify(candidates: Vec<RetrievedItem>, k: usize) -> Vec<RetrievedItem> {
    let mut used_orgs: HashSet<String> = HashSet::new();
    let mut picked = vec![false; candidates.len()];
    let mut order = Vec::with_capacity(k.min(candidates.len()));

    for (i, candidate) in candidates.iter().enumerate() {
        if order.len() >= k {
            break;
        }
        if used_orgs.insert(candidate.item.organization().to_string()) {
            picked[i] = true;
            order.push(i);
        }
    }

    for (i, was_picked) in picked.iter().enumerate() {
        if order.len() >= k {
            break;
        }
        if !was_picked {
            order.push(i);
        }
    }

    let mut slots: Vec<Option<RetrievedItem>> = candidates.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

static TERM_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());

fn terms(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    TERM_PATTERN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// In-memory text index scored by query-term overlap.
///
/// Stands in for the embedding store in tests and local runs; load it from a
/// JSON array of knowledge records exported by the indexing job.
#[derive(Debug)]
pub struct InMemoryTextIndex {
    entries: Vec<IndexedEntry>,
}

#[derive(Debug)]
struct IndexedEntry {
    item: KnowledgeItem,
    terms: HashSet<String>,
}

impl InMemoryTextIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = KnowledgeItem>) -> Self {
        let mut index = Self::new();
        for item in items {
            index.add(item);
        }
        index
    }

    pub fn from_json_file(path: &Path) -> Result<Self, IndexError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| IndexError::Load(format!("{}: {e}", path.display())))?;
        let items: Vec<KnowledgeItem> =
            serde_json::from_str(&raw).map_err(|e| IndexError::Load(e.to_string()))?;
        tracing::info!(path = %path.display(), records = items.len(), "Loaded knowledge index");
        Ok(Self::from_items(items))
    }

    pub fn add(&mut self, item: KnowledgeItem) {
        let text = format!(
            "{} {} {}",
            item.title,
            item.description.as_deref().unwrap_or_default(),
            item.body
        );
        self.entries.push(IndexedEntry {
            terms: terms(&text),
            item,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryTextIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TextIndex for InMemoryTextIndex {
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeItem>, IndexError> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, &IndexedEntry)> = self
            .entries
            .iter()
            .map(|entry| {
                let overlap = query_terms.intersection(&entry.terms).count();
                (overlap as f32 / query_terms.len() as f32, entry)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| KnowledgeItem {
                score,
                ..entry.item.clone()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn article(org: &str, url: &str, body: &str) -> KnowledgeItem {
        KnowledgeItem {
            organization: org.into(),
            title: format!("{org} guide"),
            source_url: url.into(),
            content_type: ContentType::WebPage,
            body: body.into(),
            ..Default::default()
        }
    }

    fn video(org: &str, media_url: &str, body: &str) -> KnowledgeItem {
        KnowledgeItem {
            organization: org.into(),
            title: format!("{org} video"),
            source_url: format!("https://{org}.example/page"),
            content_type: ContentType::Video,
            media_url: Some(media_url.into()),
            body: body.into(),
            ..Default::default()
        }
    }

    fn severity(n: i64) -> SeverityScore {
        SeverityScore::new(n).unwrap()
    }

    /// Scripted index: fixed hits per query, records every query issued.
    #[derive(Default)]
    struct ScriptedIndex {
        hits: HashMap<String, Vec<KnowledgeItem>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl ScriptedIndex {
        fn with_hits(mut self, query: &str, hits: Vec<KnowledgeItem>) -> Self {
            self.hits.insert(query.to_string(), hits);
            self
        }

        fn failing_on(mut self, query: &str) -> Self {
            self.failing.insert(query.to_string());
            self
        }

        fn calls_for(&self, query: &str) -> Vec<usize> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(q, _)| q == query)
                .map(|(_, k)| *k)
                .collect()
        }
    }

    impl TextIndex for ScriptedIndex {
        fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeItem>, IndexError> {
            self.calls.lock().unwrap().push((query.to_string(), k));
            if self.failing.contains(query) {
                return Err(IndexError::Query(format!("timeout on '{query}'")));
            }
            Ok(self.hits.get(query).cloned().unwrap_or_default())
        }
    }

    struct DownIndex;

    impl TextIndex for DownIndex {
        fn similarity_search(&self, _query: &str, _k: usize) -> Result<Vec<KnowledgeItem>, IndexError> {
            Err(IndexError::Unreachable("connection refused".into()))
        }
    }

    #[test]
    fn never_returns_more_than_k_or_duplicate_urls() {
        let hits = vec![
            article("A", "https://a/1", "pain"),
            article("B", "https://b/1", "pain"),
            article("A", "https://a/1", "pain"),
            article("C", "https://c/1", "pain"),
            article("D", "https://d/1", "pain"),
        ];
        let index = ScriptedIndex::default()
            .with_hits("pain", hits.clone())
            .with_hits("ache", hits);
        let retriever = KnowledgeRetriever::new(Arc::new(index));

        for k in 1..=4 {
            let result = retriever.search_articles(severity(3), "pain", k).unwrap();
            assert!(result.len() <= k);
            let mut urls: Vec<&str> = result.iter().map(|i| i.source_url.as_str()).collect();
            let total = urls.len();
            urls.sort_unstable();
            urls.dedup();
            assert_eq!(urls.len(), total);
        }
    }

    #[test]
    fn five_articles_two_orgs_fill_third_slot() {
        let index = ScriptedIndex::default().with_hits(
            "pain",
            vec![
                article("APDA", "https://apda/1", "pain"),
                article("APDA", "https://apda/2", "pain"),
                article("PF", "https://pf/1", "pain"),
                article("APDA", "https://apda/3", "pain"),
                article("PF", "https://pf/2", "pain"),
            ],
        );
        let retriever = KnowledgeRetriever::new(Arc::new(index));
        let result = retriever.search_articles(severity(3), "pain", 3).unwrap();

        let picked: Vec<(&str, &str)> = result
            .iter()
            .map(|i| (i.organization.as_str(), i.source_url.as_str()))
            .collect();
        assert_eq!(
            picked,
            vec![
                ("APDA", "https://apda/1"),
                ("PF", "https://pf/1"),
                ("APDA", "https://apda/2"),
            ]
        );
        assert_eq!(result.distinct_organizations(), 2);
    }

    #[test]
    fn distinct_orgs_preferred_over_encounter_order() {
        let index = ScriptedIndex::default().with_hits(
            "pain",
            vec![
                article("A", "https://a/1", ""),
                article("A", "https://a/2", ""),
                article("B", "https://b/1", ""),
                article("C", "https://c/1", ""),
            ],
        );
        let retriever = KnowledgeRetriever::new(Arc::new(index));
        let result = retriever.search_articles(severity(2), "pain", 3).unwrap();
        let orgs: Vec<&str> = result.iter().map(|i| i.organization.as_str()).collect();
        assert_eq!(orgs, vec!["A", "B", "C"]);
    }

    #[test]
    fn fallback_runs_once_when_tier_queries_are_empty() {
        let fallback_hits: Vec<KnowledgeItem> = (0..10)
            .map(|i| article(&format!("Org{}", i % 2), &format!("https://kb/{i}"), "parkinson"))
            .chain(std::iter::once(article("Org0", "https://kb/0", "dup")))
            .collect();
        let index = Arc::new(
            ScriptedIndex::default().with_hits(BROAD_FALLBACK_QUERY, fallback_hits),
        );
        let retriever = KnowledgeRetriever::new(index.clone());
        let result = retriever.search_articles(severity(1), "pain", 2).unwrap();

        assert_eq!(index.calls_for(BROAD_FALLBACK_QUERY), vec![20]);
        assert!(result.used_fallback);
        assert_eq!(result.len(), 2);
        assert!(result
            .items
            .iter()
            .all(|r| r.matched_query == FALLBACK_QUERY_LABEL));
        let orgs: Vec<&str> = result.iter().map(|i| i.organization.as_str()).collect();
        assert_eq!(orgs, vec!["Org0", "Org1"]);
    }

    #[test]
    fn fallback_pool_is_capped_at_twice_k() {
        // Four distinct orgs in the fallback pool; only the first 2*k=2
        // candidates may reach selection, so k=1 must pick the first.
        let index = Arc::new(ScriptedIndex::default().with_hits(
            BROAD_FALLBACK_QUERY,
            vec![
                article("W", "https://w/1", ""),
                article("X", "https://x/1", ""),
                article("Y", "https://y/1", ""),
                article("Z", "https://z/1", ""),
            ],
        ));
        let retriever = KnowledgeRetriever::new(index.clone());
        let result = retriever.search_articles(severity(4), "pain", 1).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.items[0].item.organization, "W");
        assert_eq!(index.calls_for(BROAD_FALLBACK_QUERY), vec![10]);
    }

    #[test]
    fn fallback_not_used_when_tier_queries_hit() {
        let index = Arc::new(
            ScriptedIndex::default()
                .with_hits("pain", vec![article("A", "https://a/1", "pain")]),
        );
        let retriever = KnowledgeRetriever::new(index.clone());
        let result = retriever.search_articles(severity(3), "pain", 2).unwrap();
        assert!(!result.used_fallback);
        assert!(index.calls_for(BROAD_FALLBACK_QUERY).is_empty());
    }

    #[test]
    fn sweep_stops_once_three_k_candidates_collected() {
        let hits: Vec<KnowledgeItem> = (0..10)
            .map(|i| article(&format!("O{i}"), &format!("https://o/{i}"), ""))
            .collect();
        let index = Arc::new(ScriptedIndex::default().with_hits("pain", hits));
        let retriever = KnowledgeRetriever::new(index.clone());
        retriever.search_articles(severity(3), "pain", 2).unwrap();

        let calls = index.calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "sweep should stop after the first query");
        assert_eq!(calls[0], ("pain".to_string(), 10));
    }

    #[test]
    fn failing_query_does_not_abort_sweep() {
        let index = Arc::new(
            ScriptedIndex::default()
                .failing_on("pain")
                .with_hits("ache", vec![article("A", "https://a/1", "ache")]),
        );
        let retriever = KnowledgeRetriever::new(index.clone()).with_query_attempts(2);
        let result = retriever.search_articles(severity(3), "pain", 2).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.failed_queries, 1);
        assert_eq!(result.items[0].matched_query, "ache");
        assert_eq!(index.calls_for("pain").len(), 2);
    }

    #[test]
    fn unreachable_index_is_retrieval_unavailable() {
        let retriever = KnowledgeRetriever::new(Arc::new(DownIndex));
        let err = retriever.search_articles(severity(5), "pain", 3).unwrap_err();
        assert!(matches!(err, RagError::RetrievalUnavailable { .. }));
    }

    #[test]
    fn empty_index_returns_empty_result() {
        let retriever = KnowledgeRetriever::new(Arc::new(InMemoryTextIndex::new()));
        let result = retriever.search_media(severity(2), "pain", 2).unwrap();
        assert!(result.is_empty());
        assert!(result.used_fallback);
    }

    #[test]
    fn zero_k_short_circuits() {
        let index = Arc::new(ScriptedIndex::default());
        let retriever = KnowledgeRetriever::new(index.clone());
        let result = retriever.search_articles(severity(3), "pain", 0).unwrap();
        assert!(result.is_empty());
        assert!(index.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn media_sweep_uses_media_queries_and_media_urls() {
        let index = Arc::new(ScriptedIndex::default().with_hits(
            "pain video podcast",
            vec![
                article("A", "https://a/1", "pain"),
                video("B", "https://media/b", "pain"),
                video("C", "https://media/b", "pain"),
                video("D", "https://media/d", "pain"),
                KnowledgeItem {
                    content_type: ContentType::Podcast,
                    organization: "E".into(),
                    ..Default::default()
                },
            ],
        ));
        let retriever = KnowledgeRetriever::new(index.clone());
        let result = retriever.search_media(severity(3), "pain", 2).unwrap();

        let urls: Vec<&str> = result.iter().filter_map(|i| i.media_url()).collect();
        assert_eq!(urls, vec!["https://media/b", "https://media/d"]);
        assert_eq!(index.calls_for("pain video podcast"), vec![10]);
    }

    #[test]
    fn in_memory_index_ranks_by_term_overlap() {
        let index = InMemoryTextIndex::from_items(vec![
            article("A", "https://a/1", "Gentle exercise for Parkinson's"),
            article("B", "https://b/1", "Exercise and pain relief in Parkinson's"),
            article("C", "https://c/1", "Sleep hygiene"),
        ]);
        let hits = index.similarity_search("pain relief exercise", 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].organization, "B");
        assert!((hits[0].score - 1.0).abs() < 0.01);
        assert!(hits[1].score < hits[0].score);
    }

    #[test]
    fn in_memory_index_loads_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"[{"organization": "APDA", "title": "Pain and PD", "source_url": "https://apda/pain",
                 "content_type": "web_page", "body": "Pain is common in Parkinson's."}]"#,
        )
        .unwrap();

        let index = InMemoryTextIndex::from_json_file(&path).unwrap();
        assert_eq!(index.len(), 1);
        let hits = index.similarity_search("pain", 3).unwrap();
        assert_eq!(hits[0].title, "Pain and PD");
    }

    #[test]
    fn missing_index_file_is_load_error() {
        let err = InMemoryTextIndex::from_json_file(Path::new("/nonexistent/kb.json")).unwrap_err();
        assert!(matches!(err, IndexError::Load(_)));
    }

    #[test]
    fn non_finite_scores_are_zeroed_on_accept() {
        let mut nan = article("A", "https://a/1", "pain");
        nan.score = f32::NAN;
        let mut inf = article("B", "https://b/1", "pain");
        inf.score = f32::INFINITY;
        let mut ok = article("C", "https://c/1", "pain");
        ok.score = 0.75;
        let index = ScriptedIndex::default().with_hits("pain", vec![nan, inf, ok]);
        let retriever = KnowledgeRetriever::new(Arc::new(index));

        let result = retriever.search_articles(severity(3), "pain", 3).unwrap();
        let scores: Vec<f32> = result.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![0.0, 0.0, 0.75]);

        let json = serde_json::to_string(&result).unwrap();
        let back: RetrievalResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 3);
    }
}
