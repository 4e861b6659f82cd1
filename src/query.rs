//! CLI query commands over the artifact store.
//!
//! These mirror the HTTP endpoints for use from a terminal: `concord books`,
//! `concord lookup` and `concord read`. Results go to stdout; unknown books
//! and out-of-range chapters surface as errors with a non-zero exit.

use anyhow::{bail, Result};

use crate::store::ArtifactStore;

pub fn run_books(store: &ArtifactStore) -> Result<()> {
    for (i, name) in store.list_book_names()?.iter().enumerate() {
        println!("{:>3}  {}", i + 1, name);
    }
    Ok(())
}

/// Print every location for `term`. `mode` is `exact` or `stemmed`.
pub fn run_lookup(store: &ArtifactStore, term: &str, mode: &str) -> Result<()> {
    if term.trim().is_empty() {
        bail!("query must not be empty");
    }

    let hits = match mode {
        "exact" => store.lookup_exact(term)?,
        "stemmed" => store.lookup_stemmed(term)?,
        _ => bail!("Unknown lookup mode: {}. Use exact or stemmed.", mode),
    };

    if hits.is_empty() {
        println!("No matches for '{}' ({}).", term, mode);
        return Ok(());
    }

    println!("{} matches for '{}' ({}):", hits.len(), term, mode);
    for hit in hits {
        println!("  {} {}:{}", hit.book, hit.chapter, hit.verse);
    }
    Ok(())
}

/// Print a chapter, or verses `start..=end` of it. All numbers are 1-based.
pub fn run_read(
    store: &ArtifactStore,
    book: &str,
    chapter: usize,
    start: Option<usize>,
    end: Option<usize>,
) -> Result<()> {
    if chapter == 0 || start == Some(0) || end == Some(0) {
        bail!("chapter and verse numbers start at 1");
    }
    let chapter_index = chapter - 1;
    let from = start.map(|s| s - 1).unwrap_or(0);
    let to = match end {
        Some(e) => e,
        None => store.chapter(book, chapter_index)?.verses.len(),
    };

    let verses = store.verse_range(book, chapter_index, from, to)?;
    println!("--- {} {} ---", book, chapter);
    for verse in verses {
        println!("{:>3} {}", verse.verse, verse.text.trim());
        for note in &verse.notes {
            println!("      [{}]", note);
        }
    }
    Ok(())
}
