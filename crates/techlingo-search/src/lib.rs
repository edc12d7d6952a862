//! techlingo-search
//!
//! Online query path: optimize, retrieve, compose, over an index snapshot
//! that can be rebuilt and swapped while queries are running.

pub mod compose;
pub mod error;
pub mod store;

use std::sync::Arc;

use techlingo_core::config::{QueryConfig, RankingConfig, Settings};
use techlingo_core::{Corpus, Level, Lexicon, Query, QueryResult, TechnologyFilter};
use techlingo_text::{retrieve, Index, IndexBuilder, QueryOptimizer};

pub use compose::RankingComposer;
pub use error::{QueryError, QueryStage};
pub use store::IndexStore;

pub struct SearchEngine {
    builder: IndexBuilder,
    optimizer: QueryOptimizer,
    composer: RankingComposer,
    ranking: RankingConfig,
    store: IndexStore,
}

impl SearchEngine {
    /// Fails on query or ranking settings the query path cannot run with.
    pub fn new(settings: &Settings, lexicon: &Lexicon) -> techlingo_core::Result<Self> {
        settings.query.validate()?;
        Ok(Self {
            builder: IndexBuilder::new(lexicon),
            optimizer: QueryOptimizer::new(lexicon, settings.query),
            composer: RankingComposer::new(&settings.ranking)?,
            ranking: settings.ranking,
            store: IndexStore::new(),
        })
    }

    /// Build an index for `corpus` and publish it; returns the new generation.
    pub fn rebuild(&self, corpus: &Corpus) -> u64 {
        self.publish(self.builder.build(corpus))
    }

    pub fn publish(&self, index: Index) -> u64 {
        self.store.publish(index)
    }

    pub fn snapshot(&self) -> Arc<Index> {
        self.store.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    /// Run against whatever index is current when the call starts.
    pub fn query(&self, query: &Query) -> Result<QueryResult, QueryError> {
        let index = self.store.snapshot();
        self.run(&index, query)
    }

    /// Run against a snapshot the caller holds; fails if a newer one was published since.
    pub fn query_snapshot(&self, index: &Index, query: &Query) -> Result<QueryResult, QueryError> {
        let latest = self.store.generation();
        if index.generation() != latest {
            return Err(QueryError::Stale { snapshot: index.generation(), latest });
        }
        self.run(index, query)
    }

    fn run(&self, index: &Index, query: &Query) -> Result<QueryResult, QueryError> {
        run_query(&self.optimizer, &self.composer, &self.ranking, index, query)
    }
}

fn run_query(
    optimizer: &QueryOptimizer,
    composer: &RankingComposer,
    ranking: &RankingConfig,
    index: &Index,
    query: &Query,
) -> Result<QueryResult, QueryError> {
    let optimized = optimizer
        .optimize(&query.text, query.technology.as_ref())
        .map_err(|e| QueryError::rejected(QueryStage::Optimize, e))?;
    let n = query.n_results.min(ranking.max_results);
    if n == 0 || optimized.is_empty() || index.is_empty() {
        return Ok(QueryResult::empty());
    }

    let candidates = retrieve(index, &optimized, n.saturating_mul(ranking.candidate_multiplier));
    if let Some(bad) = candidates.iter().find(|c| !c.similarity.is_finite()) {
        return Err(QueryError::rejected(
            QueryStage::Retrieve,
            format!("chunk {} has a non-finite similarity", bad.entry.chunk.id),
        ));
    }
    let result = composer.compose(candidates, n, query.level)?;
    tracing::debug!(
        query = %query.text,
        generation = index.generation(),
        results = result.count(),
        "query answered"
    );
    Ok(result)
}

/// One-shot query against `index` with the built-in configuration and lexicon.
pub fn query(
    index: &Index,
    text: &str,
    n_results: usize,
    technology: Option<TechnologyFilter>,
    level: Option<Level>,
) -> Result<QueryResult, QueryError> {
    let optimizer = QueryOptimizer::new(&Lexicon::default(), QueryConfig::default());
    let ranking = RankingConfig::default();
    let request = Query { text: text.to_string(), n_results, technology, level };
    run_query(&optimizer, &RankingComposer::default(), &ranking, index, &request)
}
