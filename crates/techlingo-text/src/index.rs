use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use techlingo_core::snapshot::{decode, encode, read_snapshot, write_snapshot};
use techlingo_core::{Chunk, Corpus, Level, Lexicon};

use crate::analyzer::Analyzer;
use crate::error::IndexError;

pub const INDEX_FORMAT: &str = "techlingo-index";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermStats {
	pub id: u32,
	pub document_frequency: u32,
	pub idf: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
	pub entry: u32,
	pub weight: f32,
}

/// Score and level kept next to the vector so ranking never goes back to the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PedagogyRef {
	pub score: f32,
	pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
	pub chunk: Chunk,
	pub pedagogy: PedagogyRef,
	/// Lower-cased technology tag used for filter matching.
	pub technology_key: String,
	/// Unit-length tf-idf vector as `(term id, weight)`, sorted by term id.
	pub vector: Vec<(u32, f32)>,
}

/// Immutable term-weighted index over one corpus snapshot.
///
/// There is no incremental update: a changed corpus means a new `Index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
	generation: u64,
	terms: BTreeMap<String, TermStats>,
	/// `postings[term id]`, ordered by entry.
	postings: Vec<Vec<Posting>>,
	entries: Vec<IndexedChunk>,
}

/// Smoothed inverse document frequency; stays positive for terms in every chunk.
pub fn idf(chunks: usize, document_frequency: u32) -> f32 {
	((1.0 + chunks as f32) / (1.0 + document_frequency as f32)).ln() + 1.0
}

impl Index {
	pub fn empty() -> Self {
		Self { generation: 0, terms: BTreeMap::new(), postings: Vec::new(), entries: Vec::new() }
	}

	/// 0 for an index that was never published through a store.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn with_generation(mut self, generation: u64) -> Self {
		self.generation = generation;
		self
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn term_count(&self) -> usize {
		self.terms.len()
	}

	pub fn term(&self, text: &str) -> Option<&TermStats> {
		self.terms.get(text)
	}

	pub fn postings(&self, term_id: u32) -> &[Posting] {
		self.postings.get(term_id as usize).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn entries(&self) -> &[IndexedChunk] {
		&self.entries
	}

	pub fn entry(&self, index: u32) -> Option<&IndexedChunk> {
		self.entries.get(index as usize)
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>, IndexError> {
		Ok(encode(INDEX_FORMAT, self)?)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
		let index: Index = decode(INDEX_FORMAT, bytes)?;
		index.check()?;
		Ok(index)
	}

	pub fn save(&self, path: &Path) -> Result<(), IndexError> {
		write_snapshot(path, INDEX_FORMAT, self)?;
		Ok(())
	}

	pub fn load(path: &Path) -> Result<Self, IndexError> {
		let index: Index = read_snapshot(path, INDEX_FORMAT)?;
		index.check()?;
		Ok(index)
	}

	/// Structural consistency of a decoded snapshot.
	fn check(&self) -> Result<(), IndexError> {
		if self.postings.len() != self.terms.len() {
			return Err(IndexError::Corrupt(format!(
				"{} posting lists for {} terms",
				self.postings.len(),
				self.terms.len()
			)));
		}
		let mut seen = vec![false; self.terms.len()];
		for (term, stats) in &self.terms {
			match seen.get_mut(stats.id as usize) {
				Some(slot) if !*slot => *slot = true,
				_ => return Err(IndexError::Corrupt(format!("bad id {} for term '{}'", stats.id, term))),
			}
		}
		let entries = self.entries.len();
		let dangling = self.postings.iter().flatten().any(|p| p.entry as usize >= entries)
			|| self.entries.iter().flat_map(|e| &e.vector).any(|(t, _)| *t as usize >= self.terms.len());
		if dangling {
			return Err(IndexError::Corrupt("posting or vector points outside the index".to_string()));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
	analyzer: Analyzer,
}

impl IndexBuilder {
	pub fn new(lexicon: &Lexicon) -> Self {
		Self { analyzer: Analyzer::from_lexicon(lexicon) }
	}

	pub fn with_analyzer(analyzer: Analyzer) -> Self {
		Self { analyzer }
	}

	fn term_frequencies(&self, text: &str) -> BTreeMap<String, u32> {
		let mut tf = BTreeMap::new();
		for token in self.analyzer.tokens(text) {
			*tf.entry(token).or_insert(0) += 1;
		}
		tf
	}

	/// Map term frequencies per chunk, reduce document frequencies once all
	/// chunks are done, then re-weight every chunk against the final IDF.
	pub fn build(&self, corpus: &Corpus) -> Index {
		let frequencies: Vec<BTreeMap<String, u32>> =
			corpus.chunks.par_iter().map(|c| self.term_frequencies(&c.text)).collect();

		let mut document_frequency: BTreeMap<&str, u32> = BTreeMap::new();
		for tf in &frequencies {
			for term in tf.keys() {
				*document_frequency.entry(term.as_str()).or_insert(0) += 1;
			}
		}
		let n = corpus.chunks.len();
		let terms: BTreeMap<String, TermStats> = document_frequency
			.into_iter()
			.enumerate()
			.map(|(id, (term, df))| {
				(term.to_string(), TermStats { id: id as u32, document_frequency: df, idf: idf(n, df) })
			})
			.collect();

		let vectors: Vec<Vec<(u32, f32)>> = frequencies.par_iter().map(|tf| weigh(tf, &terms)).collect();

		let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); terms.len()];
		for (entry, vector) in vectors.iter().enumerate() {
			for &(term, weight) in vector {
				postings[term as usize].push(Posting { entry: entry as u32, weight });
			}
		}

		let entries: Vec<IndexedChunk> = corpus
			.chunks
			.iter()
			.zip(vectors)
			.map(|(chunk, vector)| IndexedChunk {
				pedagogy: PedagogyRef { score: chunk.score(), level: chunk.level() },
				technology_key: chunk.technology.to_lowercase(),
				chunk: chunk.clone(),
				vector,
			})
			.collect();

		tracing::info!(chunks = entries.len(), terms = terms.len(), "index built");
		Index { generation: 0, terms, postings, entries }
	}
}

/// tf-idf weights scaled to unit length. Keys iterate in term order, which is
/// also id order, so the vector comes out sorted.
fn weigh(tf: &BTreeMap<String, u32>, terms: &BTreeMap<String, TermStats>) -> Vec<(u32, f32)> {
	let mut vector: Vec<(u32, f32)> = tf
		.iter()
		.filter_map(|(term, count)| terms.get(term).map(|s| (s.id, *count as f32 * s.idf)))
		.collect();
	let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
	if norm > 0.0 {
		for (_, w) in &mut vector {
			*w /= norm;
		}
	}
	vector
}

/// Build with the built-in lexicon's stop words.
pub fn build_index(corpus: &Corpus) -> Index {
	IndexBuilder::default().build(corpus)
}
