//! Build pipeline orchestration.
//!
//! Coordinates the full offline build: raw feed → extraction → validation and
//! assembly → indexing → snapshot files. Every stage runs to completion before
//! anything is written, and the snapshots are staged next to the output
//! directory and swapped in together, so a failed build leaves the previous
//! snapshots untouched. The output directory belongs to the build; anything
//! else placed in it is dropped on the next successful build.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::assemble;
use crate::config::{ArtifactPaths, PipelineConfig};
use crate::error;
use crate::extract;
use crate::index::build_indexes;
use crate::models::{Corpus, CorpusStats, ExtractedVerse, RawVerseRecord};
use crate::stem::Stemmer;

/// Output of the in-memory build: the extractor's verses plus the corpus.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub verses: Vec<ExtractedVerse>,
    pub corpus: Corpus,
}

/// Run extraction, assembly and indexing over already-loaded inputs.
pub fn build_corpus(
    records: &[RawVerseRecord],
    book_names: Vec<String>,
    stemmer: &dyn Stemmer,
    options: PipelineConfig,
) -> error::Result<BuildOutput> {
    let verses = extract::extract_verses(records);
    info!(verses = verses.len(), "extracted verses");

    let books = assemble::assemble(&book_names, &verses, options.with_chapters)?;
    info!(books = books.len(), "assembled books");

    let (exact, stemmed) = build_indexes(&books, stemmer, options.index_options());
    info!(
        exact_terms = exact.len(),
        stemmed_terms = stemmed.len(),
        "built indexes"
    );

    Ok(BuildOutput {
        verses,
        corpus: Corpus {
            book_names,
            books,
            exact,
            stemmed,
        },
    })
}

/// Written next to the snapshots; records how and when they were produced.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub built_at: DateTime<Utc>,
    pub options: PipelineConfig,
    pub stats: CorpusStats,
    /// File name → SHA-256 of its contents.
    pub files: BTreeMap<String, String>,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub records: usize,
    pub stats: CorpusStats,
    /// Empty on a dry run.
    pub written: Vec<PathBuf>,
    pub manifest: Option<Manifest>,
}

/// Read the inputs named by `paths`, build, and (unless `dry_run`) write the
/// snapshots. Returns the build output alongside the report so callers can
/// serve the fresh corpus without reloading it.
pub fn run_build(
    paths: &ArtifactPaths,
    options: PipelineConfig,
    stemmer: &dyn Stemmer,
    dry_run: bool,
) -> Result<(BuildOutput, BuildReport)> {
    let records = extract::read_feed(&paths.raw).context("Failed to load raw verse feed")?;
    let book_names =
        assemble::read_book_names(&paths.books).context("Failed to load book name list")?;
    info!(
        records = records.len(),
        books = book_names.len(),
        "loaded inputs"
    );

    let output =
        build_corpus(&records, book_names, stemmer, options).context("Build aborted")?;
    let stats = output.corpus.stats();

    if dry_run {
        return Ok((
            output,
            BuildReport {
                records: records.len(),
                stats,
                written: Vec::new(),
                manifest: None,
            },
        ));
    }

    let snapshots = [
        (paths.verses(), serde_json::to_string_pretty(&output.verses)?),
        (paths.bible(), serde_json::to_string_pretty(&output.corpus.books)?),
        (
            paths.index_words(),
            serde_json::to_string_pretty(&output.corpus.exact)?,
        ),
        (
            paths.index_stemmed(),
            serde_json::to_string_pretty(&output.corpus.stemmed)?,
        ),
    ];

    let mut files = BTreeMap::new();
    for (path, json) in &snapshots {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.insert(name, sha256_hex(json.as_bytes()));
    }
    let manifest = Manifest {
        built_at: Utc::now(),
        options,
        stats,
        files,
    };

    let mut files: Vec<(PathBuf, String)> = snapshots.into_iter().collect();
    files.push((paths.manifest(), serde_json::to_string_pretty(&manifest)?));
    publish(&paths.output, &files)?;
    let written: Vec<PathBuf> = files.into_iter().map(|(path, _)| path).collect();

    info!(files = written.len(), output = %paths.output.display(), "wrote snapshots");

    Ok((
        output,
        BuildReport {
            records: records.len(),
            stats,
            written,
            manifest: Some(manifest),
        },
    ))
}

/// `dir` with `suffix` appended to its last component, e.g. `parsed.staging`.
fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "parsed".into());
    name.push(suffix);
    dir.with_file_name(name)
}

/// Replace the contents of `output` with `files` as one unit.
///
/// Everything is written into a staging directory next to `output` first, then
/// swapped in by renaming directories. An error before the swap leaves
/// `output` as it was; a failed swap puts the previous directory back.
fn publish(output: &Path, files: &[(PathBuf, String)]) -> Result<()> {
    let staging = sibling(output, ".staging");
    let previous = sibling(output, ".previous");

    if staging.is_dir() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear {}", staging.display()))?;
    }
    fs::create_dir_all(&staging)
        .with_context(|| format!("Failed to create {}", staging.display()))?;

    for (path, json) in files {
        let name = path
            .file_name()
            .with_context(|| format!("Snapshot path {} has no file name", path.display()))?;
        let staged = staging.join(name);
        if let Err(e) = fs::write(&staged, json) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e).with_context(|| format!("Failed to write {}", staged.display()));
        }
    }

    if previous.is_dir() {
        fs::remove_dir_all(&previous)
            .with_context(|| format!("Failed to clear {}", previous.display()))?;
    }
    let had_output = output.exists();
    if had_output {
        fs::rename(output, &previous)
            .with_context(|| format!("Failed to move aside {}", output.display()))?;
    }
    if let Err(e) = fs::rename(&staging, output) {
        if had_output {
            let _ = fs::rename(&previous, output);
        }
        return Err(e).with_context(|| format!("Failed to replace {}", output.display()));
    }
    if had_output {
        if let Err(e) = fs::remove_dir_all(&previous) {
            warn!(path = %previous.display(), error = %e, "could not remove previous snapshots");
        }
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// CLI entry point for `concord build`.
pub fn print_report(report: &BuildReport, dry_run: bool) {
    if dry_run {
        println!("build (dry-run)");
    } else {
        println!("build");
    }
    println!("  records read:   {}", report.records);
    println!("  books:          {}", report.stats.books);
    println!("  chapters:       {}", report.stats.chapters);
    println!("  verses:         {}", report.stats.verses);
    println!("  notes:          {}", report.stats.notes);
    println!("  exact terms:    {}", report.stats.exact_terms);
    println!("  stemmed terms:  {}", report.stats.stemmed_terms);
    if let Some(manifest) = &report.manifest {
        for (name, digest) in &manifest.files {
            println!("  {:<20} sha256:{}", name, digest);
        }
    }
    for path in &report.written {
        println!("  wrote {}", path.display());
    }
    println!("ok");
}
