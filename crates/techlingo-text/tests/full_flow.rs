use techlingo_core::config::QueryConfig;
use techlingo_core::{process_corpus, Corpus, Lexicon, TechnologyFilter};
use techlingo_text::{build_index, retrieve, Index, QueryOptimizer};

fn docs() -> Vec<(&'static str, &'static str)> {
	vec![
		(
			"react",
			"# Hooks\n\nHooks let function components manage state. The useState hook returns the current value and a setter function.",
		),
		("aws", "An S3 bucket stores objects. Each object is addressed by a key inside the bucket."),
		("git", "A commit records a snapshot of the repository. Every commit points to its parent commit."),
	]
}

fn ids(index: &Index, text: &str, tech: Option<TechnologyFilter>) -> Vec<(u32, f32)> {
	let optimizer = QueryOptimizer::new(&Lexicon::default(), QueryConfig::default());
	let query = optimizer.optimize(text, tech.as_ref()).expect("optimize");
	retrieve(index, &query, 10).iter().map(|c| (c.entry.chunk.id.0, c.similarity)).collect()
}

#[test]
fn corpus_to_index_to_retrieval() {
	let corpus = process_corpus(docs(), 1.0).expect("corpus");
	assert_eq!(corpus.len(), 3);
	let index = build_index(&corpus);
	assert_eq!(index.len(), 3);

	let hits = ids(&index, "How do hooks manage state?", None);
	let react = corpus.chunks.iter().find(|c| c.technology == "react").expect("react chunk");
	assert_eq!(hits.first().map(|h| h.0), Some(react.id.0));
	assert!(hits.windows(2).all(|w| w[0].1 >= w[1].1));

	let strict = ids(&index, "commit", Some(TechnologyFilter::strict("aws")));
	assert!(strict.is_empty(), "git chunk excluded, aws chunk has no shared term");
}

#[test]
fn saved_index_answers_identically() {
	let dir = tempfile::tempdir().expect("tempdir");
	let corpus = process_corpus(docs(), 1.0).expect("corpus");
	let corpus_path = dir.path().join("corpus.json");
	corpus.save(&corpus_path).expect("save corpus");
	let reloaded = Corpus::load(&corpus_path).expect("load corpus");
	assert_eq!(reloaded, corpus);

	let index = build_index(&reloaded);
	let index_path = dir.path().join("index.json");
	index.save(&index_path).expect("save index");
	let loaded = Index::load(&index_path).expect("load index");
	assert_eq!(loaded, index);

	for q in ["bucket objects", "commit history", "state"] {
		assert_eq!(ids(&index, q, None), ids(&loaded, q, None), "query '{}'", q);
	}
}

#[test]
fn rebuilding_is_deterministic() {
	let corpus = process_corpus(docs(), 1.0).expect("corpus");
	assert_eq!(build_index(&corpus).to_bytes().expect("bytes"), build_index(&corpus).to_bytes().expect("bytes"));
}

#[test]
fn empty_corpus_is_searchable() {
	let index = build_index(&Corpus::empty(5.0));
	assert!(index.is_empty());
	assert!(ids(&index, "anything at all", None).is_empty());
}
