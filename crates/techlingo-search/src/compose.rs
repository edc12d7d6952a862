use techlingo_core::config::RankingConfig;
use techlingo_core::{Level, QueryResult, RankedChunk};
use techlingo_text::{tie_break, Candidate};

use crate::error::{QueryError, QueryStage};

/// Blends retrieval similarity with pedagogical score into the final order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingComposer {
    alpha: f32,
    level_penalty: f32,
}

impl RankingComposer {
    pub fn new(config: &RankingConfig) -> techlingo_core::Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: &RankingConfig) -> Self {
        Self { alpha: config.alpha, level_penalty: config.level_penalty }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// `alpha * similarity + (1 - alpha) * score / 10`.
    pub fn combined(&self, similarity: f32, pedagogical_score: f32) -> f32 {
        self.alpha * similarity + (1.0 - self.alpha) * (pedagogical_score / 10.0)
    }

    /// Out-of-level candidates lose `level_penalty` only when the pool holds at
    /// least one in-level candidate; otherwise the level request is ignored.
    pub fn compose(&self, candidates: Vec<Candidate<'_>>, n: usize, level: Option<Level>) -> Result<QueryResult, QueryError> {
        if let Some(bad) = candidates.iter().find(|c| !c.entry.pedagogy.score.is_finite()) {
            return Err(QueryError::rejected(
                QueryStage::Compose,
                format!("chunk {} has a non-finite pedagogical score", bad.entry.chunk.id),
            ));
        }
        let requested = level;
        let level = level.filter(|l| candidates.iter().any(|c| c.entry.pedagogy.level == *l));
        if let (Some(wanted), None) = (requested, level) {
            tracing::debug!(level = %wanted, "no in-level candidates, level preference dropped");
        }

        let mut scored: Vec<(Candidate<'_>, f32)> = candidates
            .into_iter()
            .map(|c| {
                let mut combined = self.combined(c.similarity, c.entry.pedagogy.score);
                if level.is_some_and(|l| c.entry.pedagogy.level != l) {
                    combined -= self.level_penalty;
                }
                (c, combined)
            })
            .collect();
        scored.sort_by(|(a, sa), (b, sb)| sb.total_cmp(sa).then_with(|| tie_break(a.entry, b.entry)));
        scored.truncate(n);

        let items = scored
            .into_iter()
            .map(|(c, combined)| RankedChunk {
                chunk: c.entry.chunk.clone(),
                similarity: c.similarity,
                pedagogical_score: c.entry.pedagogy.score,
                combined_score: combined,
            })
            .collect();
        Ok(QueryResult { items })
    }
}

impl Default for RankingComposer {
    fn default() -> Self {
        Self::from_config(&RankingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use techlingo_core::{Assessment, ChunkId, DocumentId, RawChunk};
    use techlingo_text::index::PedagogyRef;
    use techlingo_text::IndexedChunk;

    fn entry(id: u32, score: f32, level: Level) -> IndexedChunk {
        let chunk = RawChunk {
            id: ChunkId(id),
            doc_id: DocumentId(0),
            technology: "react".to_string(),
            text: format!("chunk {}", id),
            ordinal: id as usize,
            token_count: 2,
        }
        .assess(Assessment { score, level, vocabulary: BTreeSet::new(), grammar: BTreeSet::new() });
        IndexedChunk { chunk, pedagogy: PedagogyRef { score, level }, technology_key: "react".to_string(), vector: Vec::new() }
    }

    fn ids(result: &QueryResult) -> Vec<u32> {
        result.items.iter().map(|r| r.chunk.id.0).collect()
    }

    #[test]
    fn pedagogy_can_outrank_slightly_better_similarity() {
        let entries = [entry(0, 3.0, Level::B2), entry(1, 9.0, Level::B2)];
        let candidates = vec![
            Candidate { entry: &entries[0], similarity: 0.8 },
            Candidate { entry: &entries[1], similarity: 0.7 },
        ];
        let result = RankingComposer::default().compose(candidates, 2, None).unwrap();
        assert_eq!(ids(&result), vec![1, 0]);
        assert!((result.items[0].combined_score - 0.76).abs() < 1e-5);
        assert!((result.items[1].combined_score - 0.65).abs() < 1e-5);
    }

    #[test]
    fn level_penalty_deprioritizes_without_removing() {
        let entries = [entry(0, 8.0, Level::C1), entry(1, 5.0, Level::B1), entry(2, 6.0, Level::C1)];
        let candidates: Vec<Candidate<'_>> = entries.iter().map(|e| Candidate { entry: e, similarity: 0.6 }).collect();
        let result = RankingComposer::default().compose(candidates, 3, Some(Level::B1)).unwrap();
        assert_eq!(ids(&result), vec![1, 0, 2]);
    }

    #[test]
    fn missing_level_degrades_to_plain_ranking() {
        let entries = [entry(0, 4.0, Level::C1), entry(1, 8.0, Level::C1)];
        let candidates: Vec<Candidate<'_>> = entries.iter().map(|e| Candidate { entry: e, similarity: 0.5 }).collect();
        let result = RankingComposer::default().compose(candidates, 5, Some(Level::B1)).unwrap();
        assert_eq!(ids(&result), vec![1, 0]);
        let expected = RankingComposer::default().combined(0.5, 8.0);
        assert_eq!(result.items[0].combined_score, expected);
    }

    #[test]
    fn equal_combined_scores_break_by_id() {
        let entries = [entry(4, 5.0, Level::B2), entry(2, 5.0, Level::B2)];
        let candidates: Vec<Candidate<'_>> = entries.iter().map(|e| Candidate { entry: e, similarity: 0.5 }).collect();
        let result = RankingComposer::default().compose(candidates, 1, None).unwrap();
        assert_eq!(ids(&result), vec![2]);
    }

    #[test]
    fn out_of_range_alpha_is_refused() {
        for alpha in [1.0, 3.0, -0.1, f32::NAN] {
            let config = RankingConfig { alpha, ..RankingConfig::default() };
            let err = RankingComposer::new(&config).unwrap_err();
            assert!(err.to_string().contains("ranking.alpha"), "alpha {}: {}", alpha, err);
        }
        let config = RankingConfig { alpha: 0.5, ..RankingConfig::default() };
        assert_eq!(RankingComposer::new(&config).unwrap().alpha(), 0.5);
    }

    #[test]
    fn non_finite_score_is_rejected_at_compose() {
        let entries = [entry(0, f32::NAN, Level::B2)];
        let err = RankingComposer::default().compose(vec![Candidate { entry: &entries[0], similarity: 0.5 }], 1, None).unwrap_err();
        assert!(matches!(err, QueryError::Rejected { stage: QueryStage::Compose, .. }));
    }
}
