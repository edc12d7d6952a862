//! Sentence-aligned chunking.
//!
//! Sentence boundaries and token counts are computed once by [`chunk`]; the
//! returned [`Chunks`] can be iterated any number of times, each iterator
//! carrying its own cursor.

use std::ops::Range;

use crate::config::ChunkingConfig;
use crate::tokenize::{count_tokens, sentence_spans};

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    spans: Vec<Range<usize>>,
    tokens: Vec<usize>,
    /// `suffix[i]` = tokens in sentences `i..`.
    suffix: Vec<usize>,
    max_tokens: usize,
    min_tokens: usize,
}

/// Split `text` into sentences and prepare greedy grouping under `config`.
pub fn chunk<'a>(text: &'a str, config: &ChunkingConfig) -> Chunks<'a> {
    let spans = sentence_spans(text);
    let tokens: Vec<usize> = spans.iter().map(|r| count_tokens(&text[r.clone()])).collect();
    let mut suffix = vec![0; tokens.len() + 1];
    for i in (0..tokens.len()).rev() {
        suffix[i] = suffix[i + 1] + tokens[i];
    }
    Chunks { text, spans, tokens, suffix, max_tokens: config.max_tokens, min_tokens: config.min_tokens }
}

impl<'a> Chunks<'a> {
    pub fn iter(&self) -> ChunkIter<'_, 'a> {
        ChunkIter { chunks: self, next: 0 }
    }

    pub fn sentence_count(&self) -> usize {
        self.spans.len()
    }

    pub fn total_tokens(&self) -> usize {
        self.suffix[0]
    }
}

impl<'c, 'a> IntoIterator for &'c Chunks<'a> {
    type Item = &'a str;
    type IntoIter = ChunkIter<'c, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Yields chunk texts as slices of the source text.
#[derive(Debug, Clone)]
pub struct ChunkIter<'c, 'a> {
    chunks: &'c Chunks<'a>,
    next: usize,
}

impl<'a> Iterator for ChunkIter<'_, 'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.chunks;
        let n = c.spans.len();
        if self.next >= n {
            return None;
        }
        let start = self.next;
        let mut end = start + 1;
        let mut used = c.tokens[start];
        // An oversized first sentence stands alone; it is never cut.
        while end < n && used + c.tokens[end] <= c.max_tokens {
            used += c.tokens[end];
            end += 1;
        }
        // A short tail joins this chunk instead of standing alone.
        if end < n && c.suffix[end] < c.min_tokens {
            end = n;
        }
        self.next = end;
        Some(&c.text[c.spans[start].start..c.spans[end - 1].end])
    }
}
