//! Lexical similarity ranking shared by the bundled stores.
//!
//! A document's score is the number of distinct query terms it contains,
//! damped by the square root of its own term count so that long documents
//! do not win by sheer size. Ties keep insertion order. Documents sharing
//! no term with the query still rank (last), so a non-empty collection
//! always yields up to `result_count` neighbours.

use std::collections::HashSet;

use baton_core::document::{Document, DocumentQuery};

/// Lowercased alphanumeric terms of `text`.
pub fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn score(query_terms: &HashSet<String>, document: &Document) -> f32 {
    let doc_terms = terms(&document.content);
    let overlap = query_terms.intersection(&doc_terms).count();
    overlap as f32 / (doc_terms.len() as f32).sqrt().max(1.0)
}

/// Order `documents` by similarity to `query`, most similar first, and keep
/// at most `query.result_count`.
pub fn rank<'a, I>(documents: I, query: &DocumentQuery) -> Vec<Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    let query_terms: HashSet<String> = query
        .query_texts()
        .into_iter()
        .flat_map(terms)
        .collect();

    let mut scored: Vec<(f32, &Document)> = documents
        .into_iter()
        .map(|d| (score(&query_terms, d), d))
        .collect();

    // sort_by is stable, so equal scores stay in insertion order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(query.result_count)
        .map(|(_, d)| d.clone())
        .collect()
}
