//! Read-only artifact store and query service.
//!
//! [`ArtifactStore`] owns the book hierarchy, the reference book list and
//! both word indexes. It is created once at startup and shared by handle
//! (typically `Arc<ArtifactStore>`) with the serving layer.
//!
//! Snapshots are read lazily on the first query, or eagerly via
//! [`ArtifactStore::load`]. Initialization happens at most once, even under
//! concurrent first access; afterwards every query is a plain read.
//!
//! # Operations
//!
//! | Method | Miss behaviour |
//! |--------|----------------|
//! | [`list_book_names`](ArtifactStore::list_book_names) | — |
//! | [`full_text`](ArtifactStore::full_text) | — |
//! | [`book`](ArtifactStore::book) | `NotFound` |
//! | [`chapter`](ArtifactStore::chapter) | `NotFound` / `OutOfRange` |
//! | [`verse_range`](ArtifactStore::verse_range) | `NotFound` / `OutOfRange` |
//! | [`lookup_exact`](ArtifactStore::lookup_exact) | empty slice |
//! | [`lookup_stemmed`](ArtifactStore::lookup_stemmed) | empty slice |

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::assemble::read_book_names;
use crate::config::ArtifactPaths;
use crate::error::{Error, Result};
use crate::models::{Book, Chapter, Corpus, CorpusStats, IndexEntry, Verse, WordIndex};
use crate::stem::Stemmer;

struct Loaded {
    corpus: Corpus,
    /// Book name → position in `corpus.books`.
    positions: HashMap<String, usize>,
}

impl Loaded {
    fn new(corpus: Corpus) -> Result<Self> {
        if corpus.books.len() != corpus.book_names.len() {
            return Err(Error::Config(format!(
                "book hierarchy has {} books but the book list names {}",
                corpus.books.len(),
                corpus.book_names.len()
            )));
        }
        let mut positions = HashMap::with_capacity(corpus.book_names.len());
        for (i, (name, book)) in corpus.book_names.iter().zip(&corpus.books).enumerate() {
            if *name != book.name {
                return Err(Error::Config(format!(
                    "book {} is '{}' in the hierarchy but '{}' in the book list",
                    i + 1,
                    book.name,
                    name
                )));
            }
            positions.insert(name.clone(), i);
        }
        Ok(Self { corpus, positions })
    }
}

pub struct ArtifactStore {
    paths: Option<ArtifactPaths>,
    stemmer: Box<dyn Stemmer>,
    loaded: OnceLock<Loaded>,
    init: Mutex<()>,
}

impl ArtifactStore {
    /// A store that reads its snapshots from `paths` on first use.
    pub fn new(paths: ArtifactPaths, stemmer: Box<dyn Stemmer>) -> Self {
        Self {
            paths: Some(paths),
            stemmer,
            loaded: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// A store over artifacts that are already in memory.
    pub fn from_corpus(corpus: Corpus, stemmer: Box<dyn Stemmer>) -> Result<Self> {
        let loaded = OnceLock::new();
        let _ = loaded.set(Loaded::new(corpus)?);
        Ok(Self {
            paths: None,
            stemmer,
            loaded,
            init: Mutex::new(()),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Read the snapshots if that has not happened yet. Repeated and
    /// concurrent calls are safe; only the first one does any work.
    pub fn load(&self) -> Result<()> {
        self.loaded().map(|_| ())
    }

    fn loaded(&self) -> Result<&Loaded> {
        if let Some(loaded) = self.loaded.get() {
            return Ok(loaded);
        }

        let _guard = self.init.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(loaded) = self.loaded.get() {
            return Ok(loaded);
        }

        let paths = self
            .paths
            .as_ref()
            .ok_or_else(|| Error::Config("store has no snapshot location".to_string()))?;
        let loaded = Loaded::new(read_snapshots(paths)?)?;
        info!(
            books = loaded.corpus.books.len(),
            exact_terms = loaded.corpus.exact.len(),
            stemmed_terms = loaded.corpus.stemmed.len(),
            "artifact store loaded"
        );
        Ok(self.loaded.get_or_init(|| loaded))
    }

    pub fn corpus(&self) -> Result<&Corpus> {
        Ok(&self.loaded()?.corpus)
    }

    pub fn stats(&self) -> Result<CorpusStats> {
        Ok(self.corpus()?.stats())
    }

    /// Book names in reference order.
    pub fn list_book_names(&self) -> Result<&[String]> {
        Ok(&self.corpus()?.book_names)
    }

    pub fn full_text(&self) -> Result<&[Book]> {
        Ok(&self.corpus()?.books)
    }

    pub fn book(&self, name: &str) -> Result<&Book> {
        let loaded = self.loaded()?;
        loaded
            .positions
            .get(name)
            .map(|&i| &loaded.corpus.books[i])
            .ok_or_else(|| Error::NotFound {
                kind: "book",
                name: name.to_string(),
            })
    }

    /// Chapter by 0-based index.
    pub fn chapter(&self, book: &str, chapter_index: usize) -> Result<&Chapter> {
        let book = self.book(book)?;
        book.chapters
            .get(chapter_index)
            .ok_or_else(|| Error::OutOfRange {
                what: "chapter",
                detail: format!(
                    "{} has {} chapters, index {} requested",
                    book.name,
                    book.chapters.len(),
                    chapter_index
                ),
            })
    }

    /// Verses `[start, end)` of a chapter, all indexes 0-based.
    pub fn verse_range(
        &self,
        book: &str,
        chapter_index: usize,
        start: usize,
        end: usize,
    ) -> Result<&[Verse]> {
        let chapter = self.chapter(book, chapter_index)?;
        if start > end || end > chapter.verses.len() {
            return Err(Error::OutOfRange {
                what: "verse range",
                detail: format!(
                    "{} {} has {} verses, range {}..{} requested",
                    chapter.book,
                    chapter.number,
                    chapter.verses.len(),
                    start,
                    end
                ),
            });
        }
        Ok(&chapter.verses[start..end])
    }

    /// Locations of `term` in the exact index. Empty when absent.
    pub fn lookup_exact(&self, term: &str) -> Result<&[IndexEntry]> {
        let key = term.trim().to_lowercase();
        Ok(entries(&self.corpus()?.exact, &key))
    }

    /// Stems `term`, then looks it up in the stemmed index. Empty when absent.
    pub fn lookup_stemmed(&self, term: &str) -> Result<&[IndexEntry]> {
        let key = self.stemmer.stem(&term.trim().to_lowercase());
        Ok(entries(&self.corpus()?.stemmed, &key))
    }
}

fn entries<'a>(index: &'a WordIndex, key: &str) -> &'a [IndexEntry] {
    index.get(key).map(Vec::as_slice).unwrap_or(&[])
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| Error::json(path, e))
}

fn read_snapshots(paths: &ArtifactPaths) -> Result<Corpus> {
    Ok(Corpus {
        books: read_json(&paths.bible())?,
        book_names: read_book_names(&paths.books)?,
        exact: read_json(&paths.index_words())?,
        stemmed: read_json(&paths.index_stemmed())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::models::RawVerseRecord;
    use crate::pipeline::{build_corpus, run_build};
    use crate::stem::SnowballStemmer;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(book: u32, chapter: u32, verse: u32, text: &str) -> RawVerseRecord {
        RawVerseRecord {
            book_ordinal: book,
            chapter,
            verse,
            text: text.to_string(),
        }
    }

    fn corpus() -> Corpus {
        let records = vec![
            record(1, 1, 1, "In the beginning {note: first} God created"),
            record(1, 1, 2, "And the earth was without form"),
            record(1, 1, 3, "And God said, Let there be light"),
            record(1, 2, 1, "Thus the heavens were finished"),
            record(2, 1, 1, "Now these are the names"),
        ];
        let names = vec!["Genesis".to_string(), "Exodus".to_string()];
        build_corpus(
            &records,
            names,
            &SnowballStemmer::english(),
            PipelineConfig::default(),
        )
        .unwrap()
        .corpus
    }

    fn store() -> ArtifactStore {
        ArtifactStore::from_corpus(corpus(), Box::new(SnowballStemmer::english())).unwrap()
    }

    fn on_disk() -> (TempDir, ArtifactPaths) {
        let tmp = TempDir::new().unwrap();
        let paths = ArtifactPaths::under(tmp.path());
        fs::write(
            &paths.raw,
            r#"[[0, 1, 1, 1, "In the beginning God created"],
                [0, 1, 1, 2, "And the earth was without form"],
                [0, 2, 1, 1, "Now these are the names"]]"#,
        )
        .unwrap();
        fs::write(&paths.books, "Genesis\nExodus\n").unwrap();
        run_build(
            &paths,
            PipelineConfig::default(),
            &SnowballStemmer::english(),
            false,
        )
        .unwrap();
        (tmp, paths)
    }

    #[test]
    fn test_list_book_names() {
        assert_eq!(store().list_book_names().unwrap(), ["Genesis", "Exodus"]);
    }

    #[test]
    fn test_book_lookup() {
        let s = store();
        assert_eq!(s.book("Exodus").unwrap().verses.len(), 1);
        assert!(matches!(
            s.book("Maccabees"),
            Err(Error::NotFound { kind: "book", .. })
        ));
    }

    #[test]
    fn test_chapter_out_of_range() {
        let s = store();
        assert_eq!(s.chapter("Genesis", 1).unwrap().number, 2);
        let err = s.chapter("Genesis", 2).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { what: "chapter", .. }));
        assert!(err.is_miss());
    }

    #[test]
    fn test_verse_range_half_open() {
        let s = store();
        let verses = s.verse_range("Genesis", 0, 1, 3).unwrap();
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].verse, 2);
        assert_eq!(verses[1].verse, 3);
        assert!(s.verse_range("Genesis", 0, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_verse_range_invalid_bounds() {
        let s = store();
        assert!(matches!(
            s.verse_range("Genesis", 0, 2, 1),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            s.verse_range("Genesis", 0, 0, 4),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_lookup_exact() {
        let s = store();
        let hits = s.lookup_exact("God").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].book, "Genesis");
        assert_eq!(hits[0].verse, 1);
        assert_eq!(hits[1].verse, 3);
        assert!(s.lookup_exact("nonexistent-term").unwrap().is_empty());
    }

    #[test]
    fn test_lookup_stemmed() {
        let s = store();
        // "names" is indexed under its stem
        let hits = s.lookup_stemmed("name").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].book, "Exodus");
        assert_eq!(s.lookup_stemmed("finishing").unwrap().len(), 1);
        assert!(s.lookup_stemmed("zzzz").unwrap().is_empty());
    }

    #[test]
    fn test_lazy_load_from_snapshots() {
        let (_tmp, paths) = on_disk();
        let s = ArtifactStore::new(paths, Box::new(SnowballStemmer::english()));
        assert!(!s.is_loaded());
        assert_eq!(s.lookup_exact("earth").unwrap().len(), 1);
        assert!(s.is_loaded());
        assert_eq!(s.chapter("Exodus", 0).unwrap().verses.len(), 1);
    }

    #[test]
    fn test_load_is_idempotent() {
        let (_tmp, paths) = on_disk();
        let once = ArtifactStore::new(paths.clone(), Box::new(SnowballStemmer::english()));
        once.load().unwrap();

        let twice = ArtifactStore::new(paths.clone(), Box::new(SnowballStemmer::english()));
        twice.load().unwrap();
        let first = twice.corpus().unwrap() as *const Corpus;
        // later loads must not re-read even if the files change underneath
        fs::remove_file(paths.bible()).unwrap();
        twice.load().unwrap();

        assert_eq!(first, twice.corpus().unwrap() as *const Corpus);
        assert_eq!(once.corpus().unwrap(), twice.corpus().unwrap());
    }

    #[test]
    fn test_concurrent_first_access() {
        let (_tmp, paths) = on_disk();
        let s = Arc::new(ArtifactStore::new(
            paths,
            Box::new(SnowballStemmer::english()),
        ));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || s.lookup_exact("the").unwrap().len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 3);
        }
    }

    #[test]
    fn test_missing_snapshot_is_error_not_panic() {
        let tmp = TempDir::new().unwrap();
        let s = ArtifactStore::new(
            ArtifactPaths::under(tmp.path()),
            Box::new(SnowballStemmer::english()),
        );
        assert!(matches!(s.load(), Err(Error::Io { .. })));
        assert!(!s.is_loaded());
    }

    #[test]
    fn test_mismatched_book_list_rejected() {
        let (_tmp, paths) = on_disk();
        fs::write(&paths.books, "Genesis\nLeviticus\n").unwrap();
        let s = ArtifactStore::new(paths, Box::new(SnowballStemmer::english()));
        assert!(matches!(s.load(), Err(Error::Config(_))));
    }
}
