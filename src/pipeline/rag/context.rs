use crate::models::RetrievalResult;

/// Grounding text handed to the generator.
///
/// One `Source: {org} - {title}` header plus a bounded body excerpt per
/// article, separated by blank lines. Never empty: with no articles a short
/// placeholder stands in.
pub fn build_generation_context(
    symptom: &str,
    articles: &RetrievalResult,
    excerpt_chars: usize,
) -> String {
    if articles.is_empty() {
        return limited_information_placeholder(symptom);
    }

    articles
        .iter()
        .map(|item| {
            format!(
                "Source: {} - {}\n{}...",
                item.organization(),
                item.title,
                excerpt(&item.body, excerpt_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn limited_information_placeholder(symptom: &str) -> String {
    let symptom = symptom.trim();
    let symptom = if symptom.is_empty() { "pain" } else { symptom };
    format!("Limited {symptom}-specific information available.")
}

/// First `max_chars` characters, cut on a char boundary.
pub(crate) fn excerpt(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &body[..byte_idx],
        None => body,
    }
}
