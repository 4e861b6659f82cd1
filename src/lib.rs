//! # Concordance
//!
//! Builds verse hierarchies and word concordances from a biblical text feed
//! and serves them over a read-only HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ raw.json │──▶│ Extract  │──▶│ Assemble │──▶│  Index   │
//! │books.txt │   │ + notes  │   │ book/ch. │   │exact+stem│
//! └──────────┘   └──────────┘   └──────────┘   └────┬─────┘
//!                                                   │ parsed/*.json
//!                                                   ▼
//!                             ┌──────────┐    ┌──────────┐
//!                             │   CLI    │◀───│  Store   │
//!                             │(concord) │    │ (lazy)   │──▶ HTTP
//!                             └──────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! concord build                       # raw feed → parsed/ snapshots
//! concord lookup offering --mode stemmed
//! concord read Genesis 1 --start 1 --end 5
//! concord serve                       # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed errors for the build and query paths |
//! | [`extract`] | Raw feed parsing and annotation extraction |
//! | [`assemble`] | Book/chapter grouping and sequence validation |
//! | [`index`] | Tokenizer and exact/stemmed index builder |
//! | [`stem`] | Stemmer abstraction |
//! | [`pipeline`] | Build orchestration and snapshot writing |
//! | [`store`] | Lazily loaded artifact store |
//! | [`query`] | CLI query commands |
//! | [`server`] | HTTP server |

pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod server;
pub mod stem;
pub mod store;
