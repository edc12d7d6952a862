//! Universally quantified properties of the batch pipeline.

use proptest::prelude::*;
use std::collections::BTreeSet;

use techlingo_core::chunker::chunk;
use techlingo_core::config::{ChunkingConfig, ScoringConfig};
use techlingo_core::filter::filter_chunks;
use techlingo_core::tokenize::count_tokens;
use techlingo_core::{normalize, Assessment, Chunk, ChunkId, DocumentId, Lexicon, Level, RawChunk, TeachingScorer};

fn scored_chunk(id: u32, text: String, score: f32) -> Chunk {
    RawChunk { id: ChunkId(id), doc_id: DocumentId(0), technology: "misc".into(), token_count: 1, ordinal: 0, text }
        .assess(Assessment { score, level: Level::B1, vocabulary: BTreeSet::new(), grammar: BTreeSet::new() })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in "[a-zA-Z0-9 .,!?#*`<>\\[\\]()\n_-]{0,200}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_markdownish_lines(
        lines in prop::collection::vec("(#{1,3} |- |> |1\\. )?[A-Za-z ]{0,30}(`[a-z]{0,8}`)?[.!?]?", 0..12)
    ) {
        let raw = lines.join("\n");
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn scoring_is_pure_and_bounded(text in "[A-Za-z ,.!?]{0,300}") {
        let scorer = TeachingScorer::new(&ScoringConfig::default(), &Lexicon::default()).unwrap();
        let first = scorer.score(&text);
        prop_assert!((1.0..=10.0).contains(&first.score));
        prop_assert_eq!(&scorer.score(&text), &first);
    }

    #[test]
    fn filtering_is_monotonic_in_min_score(
        entries in prop::collection::vec((0u8..6, 1.0f32..=10.0), 0..40),
        a in 1.0f32..=10.0,
        b in 1.0f32..=10.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let chunks: Vec<Chunk> = entries
            .iter()
            .enumerate()
            .map(|(i, (text, score))| scored_chunk(i as u32, format!("text {}", text), *score))
            .collect();
        let kept_low = filter_chunks(chunks.clone(), low).kept.len();
        let kept_high = filter_chunks(chunks, high).kept.len();
        prop_assert!(kept_high <= kept_low);
    }

    #[test]
    fn chunks_cover_every_token_once(
        sentences in prop::collection::vec("[A-Z][a-z]{0,6}( [a-z]{1,6}){0,12}\\.", 0..30),
        max_tokens in 3usize..20,
    ) {
        let text = sentences.join(" ");
        let config = ChunkingConfig { max_tokens, min_tokens: max_tokens / 2 };
        let chunks = chunk(&text, &config);
        let total: usize = chunks.iter().map(count_tokens).sum();
        prop_assert_eq!(total, count_tokens(&text));
        let again: Vec<&str> = chunks.iter().collect();
        prop_assert_eq!(chunks.iter().collect::<Vec<_>>(), again);
    }
}
