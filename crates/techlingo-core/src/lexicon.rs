//! Curated word lists driving scoring and query expansion.
//!
//! The lists are corpus-dependent data rather than code: a `Lexicon` carries a
//! `version` and can be replaced wholesale, or list by list, from a TOML file.
//! `Lexicon::default()` is the built-in seed set.

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub version: String,
    pub technical_terms: BTreeSet<String>,
    pub technical_verbs: BTreeSet<String>,
    pub explanatory_markers: Vec<String>,
    pub step_markers: Vec<String>,
    pub comparison_markers: Vec<String>,
    pub causal_markers: Vec<String>,
    pub subordinators: Vec<String>,
    pub complex_words: BTreeSet<String>,
    pub stop_words: Vec<String>,
    /// Single-term expansions, keyed by lower-case term.
    pub expansions: BTreeMap<String, Vec<String>>,
    /// Expansions triggered when the lower-cased query contains the key phrase.
    pub phrase_expansions: BTreeMap<String, Vec<String>>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

fn owned_set(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

fn owned_map(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries.iter().map(|(k, v)| ((*k).to_string(), owned(v))).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            technical_terms: owned_set(&[
                "api", "argument", "arguments", "array", "async", "await", "binary", "boolean", "branch", "buffer",
                "build", "bucket", "cache", "callback", "class", "cli", "client", "closure", "cluster", "commit",
                "compiler", "component", "configuration", "constructor", "container", "database", "dependency",
                "deployment", "docker", "endpoint", "environment", "event", "exception", "framework", "function",
                "functions", "git", "hook", "hooks", "http", "image", "import", "index", "instance", "interface",
                "json", "kubernetes", "lambda", "library", "loop", "merge", "method", "methods", "module", "node",
                "object", "package", "parameter", "parameters", "pipeline", "pod", "promise", "property", "props",
                "protocol", "query", "queue", "react", "repository", "request", "response", "return", "runtime",
                "schema", "server", "service", "state", "string", "syntax", "thread", "token", "type", "typescript",
                "value", "variable", "variables", "version", "volume",
            ]),
            technical_verbs: owned_set(&[
                "define", "declare", "initialize", "iterate", "execute", "compile", "debug", "deploy", "configure",
                "implement", "instantiate", "invoke", "install", "refactor", "serialize",
            ]),
            explanatory_markers: owned(&[
                "how to", "you can", "we use", "this means", "for example", "for instance", "in practice",
                "typically", "commonly used", "the purpose of", "allows you to", "enables", "provides", "helps you",
                "lets you", "in other words", "that is to say", "refers to", "is defined as", "is called",
                "is known as", "such as", "think of",
            ]),
            step_markers: owned(&[
                "first", "second", "then", "next", "finally", "after that", "afterwards", "step", "once you",
                "to begin",
            ]),
            comparison_markers: owned(&[
                "unlike", "compared to", "compared with", "whereas", "on the other hand", "instead of",
                "similar to", "in contrast", "rather than", "the difference between",
            ]),
            causal_markers: owned(&[
                "because", "therefore", "as a result", "so that", "consequently", "due to", "this causes",
                "which means", "this is why", "thus",
            ]),
            subordinators: owned(&[
                "because", "although", "though", "which", "while", "whereas", "unless", "if", "when", "whenever",
                "since", "whether", "until", "after", "before", "so that", "even though", "once",
            ]),
            complex_words: owned_set(&[
                "implementation", "configuration", "optimization", "architecture", "asynchronous", "concurrent",
                "comprehensive", "documentation", "infrastructure", "deployment", "synchronization",
                "compatibility", "functionality", "repository", "dependency", "environment",
            ]),
            stop_words: owned(&[
                "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it", "its",
                "of", "on", "that", "the", "to", "was", "will", "with", "or", "but", "not", "this", "these", "they",
                "them", "their", "there", "then", "than", "so", "if", "when", "where", "why", "how", "what", "which",
                "who", "whom", "whose", "can", "could", "should", "would", "may", "might", "must", "shall", "do",
                "does", "did", "have", "had", "having", "i", "you", "your", "we", "our", "me", "my",
            ]),
            expansions: owned_map(&[
                ("define", &["declare", "syntax"]),
                ("function", &["parameter", "method"]),
                ("variable", &["declare", "value", "assignment"]),
                ("error", &["exception", "handling"]),
                ("errors", &["exception", "handling"]),
                ("component", &["props", "render"]),
                ("deploy", &["deployment", "release"]),
                ("container", &["docker", "image"]),
                ("commit", &["message", "history"]),
                ("install", &["setup", "installation"]),
            ]),
            phrase_expansions: owned_map(&[
                ("define a function", &["declare", "syntax", "parameters"]),
                ("purpose of a variable", &["variable", "usage", "value"]),
                ("explain the concept of", &["concept", "explanation", "definition"]),
                ("version control", &["git", "commit", "history"]),
            ]),
        }
    }
}

impl Lexicon {
    /// Load a TOML lexicon; lists it omits fall back to the built-in seed set.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("lexicon file {}", path.display())));
        }
        Figment::from(Serialized::defaults(Lexicon::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("lexicon {}: {}", path.display(), e)))
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Figment::from(Serialized::defaults(Lexicon::default()))
            .merge(Toml::string(source))
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("lexicon: {}", e)))
    }

    /// Technical terms and verbs together, as scoring looks them up.
    pub fn technical_vocabulary(&self) -> BTreeSet<String> {
        self.technical_terms.union(&self.technical_verbs).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_replaces_only_named_lists() {
        let lexicon = Lexicon::from_toml_str(
            r#"
            version = "aws-2"
            technical_terms = ["bucket", "lambda", "iam"]
            "#,
        )
        .expect("lexicon");
        assert_eq!(lexicon.version, "aws-2");
        let vocabulary = lexicon.technical_vocabulary();
        assert!(vocabulary.contains("iam"));
        assert!(!vocabulary.contains("react"));
        assert!(vocabulary.contains("deploy"), "verbs keep the built-in list");
        assert_eq!(lexicon.stop_words, Lexicon::default().stop_words);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Lexicon::from_toml_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
