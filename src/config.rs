use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::index::IndexOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
    #[serde(default = "default_raw")]
    pub raw: PathBuf,
    #[serde(default = "default_books")]
    pub books: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_raw() -> PathBuf {
    PathBuf::from("raw.json")
}
fn default_books() -> PathBuf {
    PathBuf::from("books.txt")
}
fn default_output() -> PathBuf {
    PathBuf::from("parsed")
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    #[serde(default = "default_true")]
    pub with_chapters: bool,
    #[serde(default = "default_true")]
    pub with_stemming: bool,
    #[serde(default)]
    pub dedupe: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            with_chapters: true,
            with_stemming: true,
            dedupe: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            with_stemming: self.with_stemming,
            dedupe: self.dedupe,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:9999".to_string()
}

/// Resolved locations of every input and output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub raw: PathBuf,
    pub books: PathBuf,
    pub output: PathBuf,
}

impl ArtifactPaths {
    /// Inputs and outputs under `dir` with the default file names.
    pub fn under(dir: &Path) -> Self {
        Self {
            raw: dir.join(default_raw()),
            books: dir.join(default_books()),
            output: dir.join(default_output()),
        }
    }

    pub fn verses(&self) -> PathBuf {
        self.output.join("verses.json")
    }
    pub fn bible(&self) -> PathBuf {
        self.output.join("bible.json")
    }
    pub fn index_words(&self) -> PathBuf {
        self.output.join("index-words.json")
    }
    pub fn index_stemmed(&self) -> PathBuf {
        self.output.join("index-stemmed.json")
    }
    pub fn manifest(&self) -> PathBuf {
        self.output.join("manifest.json")
    }
}

impl Config {
    /// Defaults rooted at `./artifacts`, used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                dir: PathBuf::from("./artifacts"),
                raw: default_raw(),
                books: default_books(),
                output: default_output(),
            },
            pipeline: PipelineConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Relative artifact paths resolve against `artifacts.dir`.
    pub fn paths(&self) -> ArtifactPaths {
        let dir = &self.artifacts.dir;
        ArtifactPaths {
            raw: dir.join(&self.artifacts.raw),
            books: dir.join(&self.artifacts.books),
            output: dir.join(&self.artifacts.output),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.artifacts.dir.as_os_str().is_empty() {
        anyhow::bail!("artifacts.dir must not be empty");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
