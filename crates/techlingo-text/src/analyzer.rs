//! Tantivy text analysis shared by the index builder and the query optimizer.
//!
//! Both sides must tokenize identically, so the analyzer is always built from
//! the same stop-word list.
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

use techlingo_core::Lexicon;

pub fn build_analyzer(stop_words: &[String]) -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.iter().cloned()))
		.build()
}

#[derive(Clone)]
pub struct Analyzer {
	inner: TextAnalyzer,
}

impl Analyzer {
	pub fn new(stop_words: &[String]) -> Self {
		Self { inner: build_analyzer(stop_words) }
	}

	pub fn from_lexicon(lexicon: &Lexicon) -> Self {
		Self::new(&lexicon.stop_words)
	}

	/// Lower-cased tokens of `text` with stop words removed, in text order.
	pub fn tokens(&self, text: &str) -> Vec<String> {
		// token_stream needs &mut; clones share the tokenizer configuration.
		let mut analyzer = self.inner.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() {
			tokens.push(stream.token().text.clone());
		}
		tokens
	}
}

impl Default for Analyzer {
	fn default() -> Self {
		Self::from_lexicon(&Lexicon::default())
	}
}

impl std::fmt::Debug for Analyzer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Analyzer").finish_non_exhaustive()
	}
}
