use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::index::{Index, IndexedChunk};
use crate::query::{BiasMode, OptimizedQuery};

/// A retrieved chunk borrowed from the index it came from.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
	pub entry: &'a IndexedChunk,
	/// Cosine similarity after technology bias, in (0, 1].
	pub similarity: f32,
}

/// Higher pedagogical score first, then lower chunk id.
pub fn tie_break(a: &IndexedChunk, b: &IndexedChunk) -> Ordering {
	b.pedagogy.score.total_cmp(&a.pedagogy.score).then(a.chunk.id.cmp(&b.chunk.id))
}

/// Saturating boost: stays within [0, 1] and keeps the order among matching chunks.
pub fn boost(similarity: f32, factor: f32) -> f32 {
	similarity * (1.0 + factor) / (1.0 + factor * similarity)
}

/// Unit query vector over terms the index knows, keyed by term id.
fn query_vector(index: &Index, query: &OptimizedQuery) -> BTreeMap<u32, f32> {
	let mut vector: BTreeMap<u32, f32> = BTreeMap::new();
	for term in &query.terms {
		if let Some(stats) = index.term(&term.text) {
			*vector.entry(stats.id).or_insert(0.0) += term.weight * stats.idf;
		}
	}
	let norm = vector.values().map(|w| w * w).sum::<f32>().sqrt();
	if norm > 0.0 {
		for w in vector.values_mut() {
			*w /= norm;
		}
	}
	vector
}

/// Up to `top_k` chunks with positive similarity, best first.
///
/// Terms missing from the index contribute nothing. A hard technology bias
/// removes every other technology before ranking.
pub fn retrieve<'a>(index: &'a Index, query: &OptimizedQuery, top_k: usize) -> Vec<Candidate<'a>> {
	if top_k == 0 || index.is_empty() {
		return Vec::new();
	}
	let vector = query_vector(index, query);
	if vector.is_empty() {
		return Vec::new();
	}

	let mut dots = vec![0.0f32; index.len()];
	for (&term, &qw) in &vector {
		for posting in index.postings(term) {
			dots[posting.entry as usize] += qw * posting.weight;
		}
	}

	let mut candidates: Vec<Candidate<'a>> = index
		.entries()
		.iter()
		.zip(dots)
		.filter_map(|(entry, dot)| {
			let mut similarity = dot.clamp(0.0, 1.0);
			if let Some(bias) = &query.technology {
				let matches = entry.technology_key == bias.tag;
				match bias.mode {
					BiasMode::Hard if !matches => return None,
					BiasMode::Soft { boost: factor } if matches => similarity = boost(similarity, factor),
					_ => {}
				}
			}
			(similarity > 0.0).then_some(Candidate { entry, similarity })
		})
		.collect();

	candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity).then_with(|| tie_break(a.entry, b.entry)));
	candidates.truncate(top_k);
	tracing::debug!(terms = vector.len(), candidates = candidates.len(), "retrieved");
	candidates
}
