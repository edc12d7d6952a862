use std::fs;
use tempfile::TempDir;

use techlingo_core::chunker::chunk;
use techlingo_core::config::{ChunkingConfig, Settings};
use techlingo_core::data_processor::{process_corpus, DataProcessor};
use techlingo_core::{Corpus, Lexicon};

const HOOKS_MD: &str = "# Hooks\n\n\
A hook is a function. For example, you can call useState to keep state. \
This means the component remembers values between renders. First, import the hook. \
Then call it inside the component.\n\n\
```js\nconst [count, setCount] = useState(0);\nconsole.log(count);\n```\n\n\
Edit this page\n";

const S3_TXT: &str = "A bucket is a container for objects. You can store files in a bucket. \
Unlike a folder, a bucket lives in one region because data stays close to users.";

#[test]
fn load_directory_tags_documents_by_first_folder() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("react")).unwrap();
    fs::create_dir_all(dir.join("aws")).unwrap();
    fs::write(dir.join("react/hooks.md"), HOOKS_MD).unwrap();
    fs::write(dir.join("aws/s3.txt"), S3_TXT).unwrap();
    fs::write(dir.join("aws/diagram.png"), [0u8, 1, 2]).unwrap();
    fs::write(dir.join("readme.md"), "Top level notes about the docs.").unwrap();

    let processor = DataProcessor::new(&Settings::default(), &Lexicon::default())
        .unwrap()
        .with_min_score(1.0)
        .unwrap();
    let loaded = processor.load_directory(dir).expect("load");
    assert!(loaded.unreadable.is_empty());
    let tags: Vec<&str> = loaded.documents.iter().map(|d| d.source_id.as_str()).collect();
    assert_eq!(tags, vec!["aws", "react", "misc"]);

    let corpus = processor.process_loaded(&loaded, &|| {});
    assert_eq!(corpus.stats.documents_in, 3);
    assert_eq!(corpus.stats.documents_skipped, 0);
    let react: Vec<&str> =
        corpus.chunks.iter().filter(|c| c.technology == "react").map(|c| c.text.as_str()).collect();
    assert_eq!(react.len(), 1);
    assert!(react[0].starts_with("Hooks. A hook is a function."));
    assert!(react[0].contains("useState"));
    assert!(!react[0].contains("console"), "code blocks are stripped");
    assert!(!react[0].contains("Edit this page"), "navigation is stripped");
}

#[test]
fn load_directory_missing_dir_is_not_found() {
    let processor = DataProcessor::new(&Settings::default(), &Lexicon::default()).unwrap();
    let err = processor.load_directory(std::path::Path::new("/no/such/docs")).unwrap_err();
    assert!(matches!(err, techlingo_core::Error::NotFound(_)));
}

#[test]
fn empty_document_list_gives_empty_corpus() {
    let corpus = process_corpus(Vec::<(String, String)>::new(), 5.0).expect("process");
    assert!(corpus.is_empty());
    assert_eq!(corpus.stats.chunks_in, 0);
    assert_eq!(corpus.stats.average_score, 0.0);
}

#[test]
fn raising_min_score_never_keeps_more() {
    let docs = vec![("react", HOOKS_MD), ("aws", S3_TXT), ("misc", "Data. Stuff happens. Things exist.")];
    let counts: Vec<usize> = [1.0, 3.0, 5.0, 7.0, 10.0]
        .iter()
        .map(|&t| process_corpus(docs.clone(), t).expect("process").len())
        .collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{:?}", counts);
    assert_eq!(counts[0], 3);
}

#[test]
fn oversized_sentence_survives_as_one_chunk() {
    let sentence = format!("{}.", vec!["word"; 500].join(" "));
    let chunks: Vec<&str> = chunk(&sentence, &ChunkingConfig { max_tokens: 400, min_tokens: 150 }).iter().collect();
    assert_eq!(chunks, vec![sentence.as_str()]);

    let corpus = process_corpus(vec![("misc", sentence.clone())], 1.0).expect("process");
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.chunks[0].token_count, 500);
}

#[test]
fn malformed_markup_degrades_instead_of_failing() {
    let raw = "Closures capture variables.\n```rust\nThis sentence is inside an unclosed fence.\n<div class=";
    let corpus = process_corpus(vec![("rust", raw)], 1.0).expect("process");
    assert_eq!(corpus.len(), 1);
    assert!(corpus.chunks[0].text.contains("Closures capture variables."));
    assert!(corpus.chunks[0].text.contains("unclosed fence"));
}

#[test]
fn corpus_snapshot_round_trips() {
    let corpus = process_corpus(vec![("aws", S3_TXT)], 1.0).expect("process");
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.json");
    corpus.save(&path).expect("save");
    assert_eq!(Corpus::load(&path).expect("load"), corpus);
}
