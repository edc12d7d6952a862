//! Offline half of techlingo: turn raw documentation into a scored,
//! filtered corpus of learning chunks.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod filter;
pub mod lexicon;
pub mod normalize;
pub mod scoring;
pub mod snapshot;
pub mod tokenize;
pub mod traits;
pub mod types;

pub use config::{Config, Settings};
pub use data_processor::{process_corpus, DataProcessor, LoadedDirectory};
pub use error::{Error, MalformedInput, MalformedKind, Result};
pub use lexicon::Lexicon;
pub use normalize::{normalize, normalize_with_report};
pub use scoring::TeachingScorer;
pub use types::*;
