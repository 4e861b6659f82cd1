//! Tokenizer and inverted index builder.
//!
//! Verse text is split on whitespace; each word is stripped to
//! `[A-Za-z0-9-]` and lower-cased. Hyphenated compounds are indexed three
//! ways, so `wood-offering` yields entries under `wood`, `offering` and
//! `wood-offering`.
//!
//! Two indexes are built side by side: the exact index keyed by the surface
//! token, and the stemmed index keyed by the token's stem. Entry lists follow
//! verse order, then token order within a verse.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{Book, IndexEntry, Verse, WordIndex};
use crate::stem::Stemmer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Build the stemmed index. When false it stays empty.
    pub with_stemming: bool,
    /// Keep at most one entry per (term, verse). Off by default, which
    /// records one entry per occurrence.
    pub dedupe: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            with_stemming: true,
            dedupe: false,
        }
    }
}

/// Strip a raw word to `[a-z0-9-]`. Returns `None` if nothing alphanumeric
/// is left, which drops punctuation-only and hyphen-only words.
pub fn normalize_token(raw: &str) -> Option<String> {
    let token: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if token.chars().any(|c| c.is_ascii_alphanumeric()) {
        Some(token)
    } else {
        None
    }
}

/// The index terms contributed by `text`, in insertion order.
///
/// For a hyphenated token the non-empty parts come first, then the whole.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for token in text.split_whitespace().filter_map(normalize_token) {
        if token.contains('-') {
            terms.extend(
                token
                    .split('-')
                    .filter(|part| !part.is_empty())
                    .map(str::to_string),
            );
        }
        terms.push(token);
    }
    terms
}

/// Accumulates both indexes one verse at a time.
pub struct IndexBuilder<'a> {
    stemmer: &'a dyn Stemmer,
    options: IndexOptions,
    exact: WordIndex,
    stemmed: WordIndex,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(stemmer: &'a dyn Stemmer, options: IndexOptions) -> Self {
        Self {
            stemmer,
            options,
            exact: WordIndex::new(),
            stemmed: WordIndex::new(),
        }
    }

    pub fn add_verse(&mut self, verse: &Verse) {
        let entry = IndexEntry::for_verse(verse);
        let mut seen_exact: HashSet<String> = HashSet::new();
        let mut seen_stem: HashSet<String> = HashSet::new();

        for term in tokenize(&verse.text) {
            if self.options.with_stemming {
                let stem = self.stemmer.stem(&term);
                if !self.options.dedupe || seen_stem.insert(stem.clone()) {
                    self.stemmed.entry(stem).or_default().push(entry.clone());
                }
            }
            if !self.options.dedupe || seen_exact.insert(term.clone()) {
                self.exact.entry(term).or_default().push(entry.clone());
            }
        }
    }

    pub fn add_books(&mut self, books: &[Book]) {
        for book in books {
            debug!(book = %book.name, verses = book.verses.len(), "indexing book");
            for verse in &book.verses {
                self.add_verse(verse);
            }
        }
    }

    /// Returns `(exact, stemmed)`.
    pub fn finish(self) -> (WordIndex, WordIndex) {
        (self.exact, self.stemmed)
    }
}

/// Build both indexes over every verse of `books`.
pub fn build_indexes(
    books: &[Book],
    stemmer: &dyn Stemmer,
    options: IndexOptions,
) -> (WordIndex, WordIndex) {
    let mut builder = IndexBuilder::new(stemmer, options);
    builder.add_books(books);
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stem::{IdentityStemmer, SnowballStemmer};

    fn verse(chapter: u32, n: u32, text: &str) -> Verse {
        Verse {
            book: "Leviticus".to_string(),
            chapter,
            verse: n,
            text: text.to_string(),
            notes: Vec::new(),
        }
    }

    fn book(verses: Vec<Verse>) -> Book {
        Book {
            name: "Leviticus".to_string(),
            verses,
            chapters: Vec::new(),
        }
    }

    fn loc(chapter: u32, n: u32) -> IndexEntry {
        IndexEntry {
            book: "Leviticus".to_string(),
            chapter,
            verse: n,
        }
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("LORD,"), Some("lord".to_string()));
        assert_eq!(normalize_token("(Selah.)"), Some("selah".to_string()));
        assert_eq!(normalize_token("wood-offering;"), Some("wood-offering".to_string()));
        assert_eq!(normalize_token("7th"), Some("7th".to_string()));
        assert_eq!(normalize_token("..."), None);
        assert_eq!(normalize_token("--"), None);
        assert_eq!(normalize_token("é"), None);
    }

    #[test]
    fn test_tokenize_hyphenated() {
        assert_eq!(
            tokenize("wood-offering unto the LORD"),
            vec!["wood", "offering", "wood-offering", "unto", "the", "lord"]
        );
    }

    #[test]
    fn test_tokenize_skips_empty_parts() {
        assert_eq!(tokenize("well- -done"), vec!["well", "well-", "done", "-done"]);
        assert!(tokenize("  ; -- !  ").is_empty());
    }

    #[test]
    fn test_wood_offering_entries() {
        let stemmer = SnowballStemmer::english();
        let (exact, stemmed) = build_indexes(
            &[book(vec![verse(7, 3, "wood-offering unto the LORD")])],
            &stemmer,
            IndexOptions::default(),
        );

        for term in ["wood", "offering", "wood-offering", "unto", "the", "lord"] {
            assert_eq!(exact[term], vec![loc(7, 3)], "exact entry for {}", term);
            let stem = stemmer.stem(term);
            assert!(
                stemmed[&stem].contains(&loc(7, 3)),
                "stemmed entry for {} ({})",
                term,
                stem
            );
        }
        assert_eq!(exact.len(), 6);
        assert_eq!(stemmed["offer"], vec![loc(7, 3)]);
    }

    #[test]
    fn test_duplicates_kept_by_default() {
        let (exact, _) = build_indexes(
            &[book(vec![verse(1, 1, "holy, holy, holy")])],
            &IdentityStemmer,
            IndexOptions::default(),
        );
        assert_eq!(exact["holy"].len(), 3);
    }

    #[test]
    fn test_dedupe_per_verse() {
        let options = IndexOptions {
            with_stemming: true,
            dedupe: true,
        };
        let (exact, stemmed) = build_indexes(
            &[book(vec![
                verse(1, 1, "holy, holy, holy"),
                verse(1, 2, "holy offering offerings"),
            ])],
            &SnowballStemmer::english(),
            options,
        );
        assert_eq!(exact["holy"], vec![loc(1, 1), loc(1, 2)]);
        assert_eq!(stemmed["offer"], vec![loc(1, 2)]);
    }

    #[test]
    fn test_without_stemming() {
        let options = IndexOptions {
            with_stemming: false,
            dedupe: false,
        };
        let (exact, stemmed) = build_indexes(
            &[book(vec![verse(1, 1, "and God said")])],
            &SnowballStemmer::english(),
            options,
        );
        assert_eq!(exact.len(), 3);
        assert!(stemmed.is_empty());
    }

    #[test]
    fn test_entry_order_follows_verse_order() {
        let (exact, _) = build_indexes(
            &[book(vec![
                verse(1, 1, "light"),
                verse(1, 2, "darkness"),
                verse(2, 1, "light"),
            ])],
            &IdentityStemmer,
            IndexOptions::default(),
        );
        assert_eq!(exact["light"], vec![loc(1, 1), loc(2, 1)]);
    }

    #[test]
    fn test_no_empty_keys() {
        let (exact, stemmed) = build_indexes(
            &[book(vec![verse(1, 1, "- ... -- a-")])],
            &IdentityStemmer,
            IndexOptions::default(),
        );
        assert!(!exact.contains_key(""));
        assert!(!stemmed.contains_key(""));
        assert_eq!(exact.keys().collect::<Vec<_>>(), vec!["a", "a-"]);
    }

    #[test]
    fn test_deterministic() {
        let books = [book(vec![
            verse(1, 1, "And the LORD spake unto Moses"),
            verse(1, 2, "burnt-offering and meat-offering"),
        ])];
        let stemmer = SnowballStemmer::english();
        let a = build_indexes(&books, &stemmer, IndexOptions::default());
        let b = build_indexes(&books, &stemmer, IndexOptions::default());
        assert_eq!(
            serde_json::to_string(&a.0).unwrap(),
            serde_json::to_string(&b.0).unwrap()
        );
        assert_eq!(a.1, b.1);
    }
}
