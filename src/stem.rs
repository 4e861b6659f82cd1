//! Stemming abstraction.
//!
//! The index builder and the store only see the [`Stemmer`] trait, so the
//! algorithm can be swapped (or faked in tests). [`SnowballStemmer`] is the
//! default: the Snowball English algorithm, also known as Porter2.

use rust_stemmers::{Algorithm, Stemmer as RustStemmer};

/// Reduces a normalized lower-case token to its stem.
///
/// Implementations must be pure: the same input always yields the same stem,
/// and no input may cause a panic.
pub trait Stemmer: Send + Sync {
    fn stem(&self, token: &str) -> String;
}

pub struct SnowballStemmer {
    inner: RustStemmer,
}

impl SnowballStemmer {
    pub fn english() -> Self {
        Self {
            inner: RustStemmer::create(Algorithm::English),
        }
    }
}

impl Default for SnowballStemmer {
    fn default() -> Self {
        Self::english()
    }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, token: &str) -> String {
        self.inner.stem(token).into_owned()
    }
}

/// Leaves every token unchanged.
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, token: &str) -> String {
        token.to_string()
    }
}
