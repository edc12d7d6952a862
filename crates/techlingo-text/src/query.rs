//! Learner query reformulation: analyze, expand toward learning intent, bias by technology.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use techlingo_core::config::QueryConfig;
use techlingo_core::{Lexicon, TechnologyFilter};

use crate::analyzer::Analyzer;
use crate::error::IndexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermOrigin {
	Original,
	Expansion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTerm {
	pub text: String,
	/// Multiplies the term's IDF in the query vector.
	pub weight: f32,
	pub origin: TermOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BiasMode {
	/// Matching chunks get a saturating similarity boost; others stay eligible.
	Soft { boost: f32 },
	/// Other technologies are excluded.
	Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyBias {
	/// Lower-cased technology tag.
	pub tag: String,
	pub mode: BiasMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedQuery {
	pub terms: Vec<QueryTerm>,
	pub technology: Option<TechnologyBias>,
}

impl OptimizedQuery {
	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn originals(&self) -> impl Iterator<Item = &QueryTerm> {
		self.terms.iter().filter(|t| t.origin == TermOrigin::Original)
	}
}

#[derive(Debug, Clone)]
pub struct QueryOptimizer {
	analyzer: Analyzer,
	expansions: BTreeMap<String, Vec<String>>,
	phrase_expansions: BTreeMap<String, Vec<String>>,
	config: QueryConfig,
}

impl QueryOptimizer {
	pub fn new(lexicon: &Lexicon, config: QueryConfig) -> Self {
		let lower_keys = |m: &BTreeMap<String, Vec<String>>| -> BTreeMap<String, Vec<String>> {
			m.iter().map(|(k, v)| (plain_words(k), v.clone())).collect()
		};
		Self {
			analyzer: Analyzer::from_lexicon(lexicon),
			expansions: lower_keys(&lexicon.expansions),
			phrase_expansions: lower_keys(&lexicon.phrase_expansions),
			config,
		}
	}

	/// Original terms are never dropped. Expansions are appended at reduced
	/// weight until the query holds `max_expansion_factor` times the original
	/// term count. Repeated original terms add up their weight.
	pub fn optimize(&self, raw: &str, technology: Option<&TechnologyFilter>) -> Result<OptimizedQuery, IndexError> {
		let chars = raw.chars().count();
		if chars > self.config.max_query_chars {
			return Err(IndexError::QueryTooLong { chars, max: self.config.max_query_chars });
		}

		let mut terms: Vec<QueryTerm> = Vec::new();
		let mut position: HashMap<String, usize> = HashMap::new();
		for token in self.analyzer.tokens(raw) {
			match position.get(&token) {
				Some(&i) => terms[i].weight += 1.0,
				None => {
					position.insert(token.clone(), terms.len());
					terms.push(QueryTerm { text: token, weight: 1.0, origin: TermOrigin::Original });
				}
			}
		}

		let budget = terms.len() * self.config.max_expansion_factor;
		let phrase = format!(" {} ", plain_words(raw));
		let from_phrases = self
			.phrase_expansions
			.iter()
			.filter(|(key, _)| !key.is_empty() && phrase.contains(&format!(" {} ", key)))
			.flat_map(|(_, words)| words.iter());
		let from_terms = terms
			.iter()
			.filter_map(|t| self.expansions.get(&t.text))
			.flatten()
			.cloned()
			.collect::<Vec<String>>();
		let candidates: Vec<String> = from_phrases.cloned().chain(from_terms).collect();

		'expand: for candidate in candidates {
			for token in self.analyzer.tokens(&candidate) {
				if terms.len() >= budget {
					break 'expand;
				}
				if position.contains_key(&token) {
					continue;
				}
				position.insert(token.clone(), terms.len());
				terms.push(QueryTerm { text: token, weight: self.config.expansion_weight, origin: TermOrigin::Expansion });
			}
		}

		let technology = technology.filter(|f| !f.tag.trim().is_empty()).map(|f| TechnologyBias {
			tag: f.tag.trim().to_lowercase(),
			mode: if f.strict { BiasMode::Hard } else { BiasMode::Soft { boost: self.config.technology_boost } },
		});
		let optimized = OptimizedQuery { terms, technology };
		tracing::debug!(
			query = raw,
			original = optimized.originals().count(),
			terms = optimized.terms.len(),
			"query optimized"
		);
		Ok(optimized)
	}
}

/// Lower-cased alphanumeric words joined by single spaces, so phrase keys
/// match on word boundaries regardless of punctuation.
fn plain_words(text: &str) -> String {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|w| !w.is_empty())
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join(" ")
}
