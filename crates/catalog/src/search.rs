//! Text normalization and the inverted term index

use audioteca_core::{Book, BookId, SearchFilters, SearchType};
use std::collections::{BTreeSet, HashMap};
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Lowercases, strips accents and drops everything but letters, digits and spaces
///
/// Accents are stripped by compatibility decomposition (NFKD) followed by
/// removal of combining marks, so ligatures and fullwidth forms fold too.
pub fn normalize(text: &str) -> String {
    let lower: String = text.chars().flat_map(char::to_lowercase).collect();
    lower
        .nfkd()
        .filter(|c| canonical_combining_class(*c) == 0)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Normalized whitespace-separated terms
pub fn terms(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Normalized text of the fields a search type looks at
fn field_texts(book: &Book, kind: SearchType) -> Vec<String> {
    let mut texts = Vec::new();
    if matches!(kind, SearchType::All | SearchType::Title) {
        texts.push(normalize(&book.title));
    }
    if matches!(kind, SearchType::All | SearchType::Author) {
        texts.extend(book.authors.iter().map(|a| normalize(a.name())));
    }
    if matches!(kind, SearchType::All | SearchType::Narrator) {
        texts.extend(book.narrators.iter().map(|n| normalize(n.name())));
    }
    if matches!(kind, SearchType::All | SearchType::Genre) {
        texts.extend(book.genres.iter().map(|g| normalize(g)));
    }
    texts
}

/// Term → book ids over titles, authors, narrators and genres
#[derive(Debug, Default)]
pub struct SearchIndex {
    terms: HashMap<String, BTreeSet<BookId>>,
}

impl SearchIndex {
    pub fn build<'a>(books: impl IntoIterator<Item = &'a Book>) -> Self {
        let mut index = Self::default();
        for book in books {
            index.insert(book);
        }
        index
    }

    pub fn insert(&mut self, book: &Book) {
        for text in field_texts(book, SearchType::All) {
            for term in text.split_whitespace() {
                self.terms
                    .entry(term.to_string())
                    .or_default()
                    .insert(book.id.clone());
            }
        }
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Ids of books containing every query term
    ///
    /// Terms must match whole indexed words. An empty query returns `None`,
    /// meaning "no restriction".
    pub fn matching(&self, query: &str) -> Option<BTreeSet<BookId>> {
        let query_terms = terms(query);
        let mut result: Option<BTreeSet<BookId>> = None;

        for term in &query_terms {
            let ids = self.terms.get(term).cloned().unwrap_or_default();
            result = Some(match result {
                None => ids,
                Some(acc) => acc.intersection(&ids).cloned().collect(),
            });
            if result.as_ref().is_some_and(BTreeSet::is_empty) {
                break;
            }
        }

        result
    }
}

/// Returns true if any query term occurs in the field selected by `filters`
pub fn matches_field(book: &Book, filters: &SearchFilters) -> bool {
    if filters.kind == SearchType::All {
        return true;
    }
    let query_terms = terms(&filters.query);
    field_texts(book, filters.kind)
        .iter()
        .any(|text| query_terms.iter().any(|term| text.contains(term.as_str())))
}
