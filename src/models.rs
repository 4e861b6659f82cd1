//! Core data models used throughout Concordance.
//!
//! These types represent the raw feed records, the assembled book hierarchy,
//! and the index locations that flow through the build pipeline and the
//! artifact store. Serialized field names match the snapshot format on disk.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A record from the raw verse feed, before annotation extraction.
///
/// `book_ordinal` is 1-based as it appears in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVerseRecord {
    pub book_ordinal: u32,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

/// A normalized verse produced by the extractor.
///
/// `book` is the 0-based position in the reference book-name list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedVerse {
    pub book: usize,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    pub notes: Vec<String>,
}

/// A verse resolved against the reference book-name list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    /// Zero or one annotation lifted out of the source text.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub book: String,
    #[serde(rename = "chapter")]
    pub number: u32,
    pub verses: Vec<Verse>,
}

/// A book with both a flat verse list and its chapter grouping.
///
/// Both views hold the same verses in the same relative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "book")]
    pub name: String,
    pub verses: Vec<Verse>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verses: Vec::new(),
            chapters: Vec::new(),
        }
    }
}

/// A location reference into the corpus. Many entries may point at one verse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl IndexEntry {
    pub fn for_verse(verse: &Verse) -> Self {
        Self {
            book: verse.book.clone(),
            chapter: verse.chapter,
            verse: verse.verse,
        }
    }
}

/// Token → locations. Ordered keys keep serialized snapshots reproducible.
pub type WordIndex = BTreeMap<String, Vec<IndexEntry>>;

/// The full set of artifacts produced by a build and served by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub book_names: Vec<String>,
    pub books: Vec<Book>,
    pub exact: WordIndex,
    pub stemmed: WordIndex,
}

/// Summary counts over a [`Corpus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub books: usize,
    pub chapters: usize,
    pub verses: usize,
    pub notes: usize,
    pub exact_terms: usize,
    pub stemmed_terms: usize,
}

impl Corpus {
    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            books: self.books.len(),
            chapters: self.books.iter().map(|b| b.chapters.len()).sum(),
            verses: self.books.iter().map(|b| b.verses.len()).sum(),
            notes: self
                .books
                .iter()
                .flat_map(|b| b.verses.iter())
                .map(|v| v.notes.len())
                .sum(),
            exact_terms: self.exact.len(),
            stemmed_terms: self.stemmed.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse(book: &str, chapter: u32, n: u32) -> Verse {
        Verse {
            book: book.to_string(),
            chapter,
            verse: n,
            text: format!("text {}", n),
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_book_serializes_with_snapshot_field_names() {
        let v = verse("Ruth", 1, 1);
        let book = Book {
            name: "Ruth".to_string(),
            verses: vec![v.clone()],
            chapters: vec![Chapter {
                book: "Ruth".to_string(),
                number: 1,
                verses: vec![v],
            }],
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["book"], "Ruth");
        assert_eq!(json["chapters"][0]["chapter"], 1);
        assert_eq!(json["chapters"][0]["verses"][0]["notes"], serde_json::json!([]));
    }

    #[test]
    fn test_book_without_chapters_deserializes() {
        let book: Book = serde_json::from_str(r#"{"book": "Jude", "verses": []}"#).unwrap();
        assert_eq!(book.name, "Jude");
        assert!(book.chapters.is_empty());
    }

    #[test]
    fn test_stats_counts() {
        let mut v = verse("Ruth", 1, 2);
        v.notes.push("note".to_string());
        let corpus = Corpus {
            book_names: vec!["Ruth".to_string()],
            books: vec![Book {
                name: "Ruth".to_string(),
                verses: vec![verse("Ruth", 1, 1), v.clone()],
                chapters: vec![Chapter {
                    book: "Ruth".to_string(),
                    number: 1,
                    verses: vec![verse("Ruth", 1, 1), v],
                }],
            }],
            exact: WordIndex::new(),
            stemmed: WordIndex::new(),
        };
        let stats = corpus.stats();
        assert_eq!(stats.books, 1);
        assert_eq!(stats.chapters, 1);
        assert_eq!(stats.verses, 2);
        assert_eq!(stats.notes, 1);
        assert_eq!(stats.exact_terms, 0);
    }
}
