//! Book and chapter assembly.
//!
//! Resolves each extracted verse's book index against the reference
//! book-name list and groups verses into book → chapter → verse. Chapters are
//! created as verses arrive, so [`validate`] runs first and rejects feeds
//! whose chapter numbers skip or go backwards within a book.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Book, Chapter, ExtractedVerse, Verse};

/// Read the reference book-name list.
pub fn read_book_names(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_book_names(&content)
}

/// One name per line; surrounding whitespace trimmed, blank lines ignored.
pub fn parse_book_names(content: &str) -> Result<Vec<String>> {
    let names: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return Err(Error::EmptyBookList);
    }
    Ok(names)
}

/// Check that every verse names a known book and that chapters within each
/// book start at 1 and advance by at most one.
pub fn validate(names: &[String], verses: &[ExtractedVerse]) -> Result<()> {
    let mut current = vec![0u32; names.len()];

    for verse in verses {
        let last = current
            .get_mut(verse.book)
            .ok_or(Error::BookOrdinalOutOfRange {
                ordinal: verse.book + 1,
                available: names.len(),
            })?;

        let in_sequence = verse.chapter != 0
            && (verse.chapter == *last || verse.chapter == *last + 1);
        if !in_sequence {
            return Err(Error::ChapterSequence {
                book: names[verse.book].clone(),
                previous: *last,
                found: verse.chapter,
            });
        }
        *last = verse.chapter;
    }
    Ok(())
}

/// Group verses into books, and into chapters when `with_chapters` is set.
///
/// Validates first; see [`validate`].
pub fn assemble(
    names: &[String],
    verses: &[ExtractedVerse],
    with_chapters: bool,
) -> Result<Vec<Book>> {
    validate(names, verses)?;

    let mut books: Vec<Book> = names.iter().map(Book::new).collect();

    for extracted in verses {
        let book = &mut books[extracted.book];
        let verse = Verse {
            book: book.name.clone(),
            chapter: extracted.chapter,
            verse: extracted.verse,
            text: extracted.text.clone(),
            notes: extracted.notes.clone(),
        };

        if with_chapters {
            let idx = extracted.chapter as usize - 1;
            if idx < book.chapters.len() {
                book.chapters[idx].verses.push(verse.clone());
            } else {
                debug!(book = %book.name, chapter = extracted.chapter, "new chapter");
                book.chapters.push(Chapter {
                    book: book.name.clone(),
                    number: book.chapters.len() as u32 + 1,
                    verses: vec![verse.clone()],
                });
            }
        }
        book.verses.push(verse);
    }

    Ok(books)
}
