use std::collections::HashSet;

use crate::types::Chunk;

/// Result of thresholding and deduplicating scored chunks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<Chunk>,
    pub total_in: usize,
    pub below_threshold: usize,
    pub duplicates: usize,
}

/// Drop chunks scoring below `min_score`, then drop repeated texts keeping
/// the first occurrence. Source order is preserved. An empty outcome is valid.
pub fn filter_chunks(chunks: Vec<Chunk>, min_score: f32) -> FilterOutcome {
    let total_in = chunks.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(chunks.len());
    let mut outcome = FilterOutcome { total_in, ..FilterOutcome::default() };
    for chunk in chunks {
        if chunk.score() < min_score {
            outcome.below_threshold += 1;
        } else if !seen.insert(chunk.text.clone()) {
            outcome.duplicates += 1;
        } else {
            outcome.kept.push(chunk);
        }
    }
    outcome
}

/// Smallest threshold keeping roughly the top `fraction` of `scores`
/// (ties at the cut are kept). `None` for an empty score list.
pub fn threshold_for_fraction(scores: &[f32], fraction: f32) -> Option<f32> {
    if scores.is_empty() {
        return None;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let fraction = fraction.clamp(0.0, 1.0);
    let keep = ((sorted.len() as f32 * fraction).ceil() as usize).clamp(1, sorted.len());
    Some(sorted[keep - 1].clamp(1.0, 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Assessment, ChunkId, DocumentId, Level, RawChunk};
    use std::collections::BTreeSet;

    fn chunk(id: u32, text: &str, score: f32) -> Chunk {
        RawChunk {
            id: ChunkId(id),
            doc_id: DocumentId(0),
            technology: "react".to_string(),
            text: text.to_string(),
            ordinal: id as usize,
            token_count: text.split_whitespace().count(),
        }
        .assess(Assessment { score, level: Level::B1, vocabulary: BTreeSet::new(), grammar: BTreeSet::new() })
    }

    #[test]
    fn drops_low_scores_and_duplicates_keeping_first() {
        let chunks = vec![
            chunk(0, "Hooks let you use state.", 7.0),
            chunk(1, "Low value text.", 2.0),
            chunk(2, "Hooks let you use state.", 7.0),
            chunk(3, "Effects run after render.", 5.0),
        ];
        let outcome = filter_chunks(chunks, 5.0);
        let ids: Vec<u32> = outcome.kept.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![0, 3]);
        assert_eq!((outcome.total_in, outcome.below_threshold, outcome.duplicates), (4, 1, 1));
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let outcome = filter_chunks(Vec::new(), 5.0);
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.total_in, 0);
    }

    #[test]
    fn threshold_keeps_top_quartile() {
        let scores = [2.0, 9.0, 4.0, 7.5, 3.0, 6.0, 8.0, 5.0];
        assert_eq!(threshold_for_fraction(&scores, 0.25), Some(8.0));
        assert_eq!(threshold_for_fraction(&scores, 1.0), Some(2.0));
        assert_eq!(threshold_for_fraction(&scores, 0.0), Some(9.0));
        assert_eq!(threshold_for_fraction(&[], 0.25), None);
    }
}
