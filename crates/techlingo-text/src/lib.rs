//! techlingo-text
//!
//! Term-weighted index over a scored corpus, learner query optimization and
//! cosine retrieval. Tokenization goes through a shared Tantivy analyzer.
pub mod analyzer;
pub mod error;
pub mod index;
pub mod query;
pub mod search;

pub use analyzer::Analyzer;
pub use error::IndexError;
pub use index::{build_index, Index, IndexBuilder, IndexedChunk};
pub use query::{BiasMode, OptimizedQuery, QueryOptimizer, QueryTerm, TechnologyBias, TermOrigin};
pub use search::{retrieve, tie_break, Candidate};
