use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::TextProfile;
use crate::types::GrammarPattern;

const PARTICIPLES: &str = "built|done|given|known|made|seen|shown|taken|written|found|kept|sent|held|thrown|hidden|chosen|run";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[a-z][a-z0-9]*(?:_[a-z0-9]+)+|[a-z][a-z0-9]*(?:[A-Z][a-z0-9]*)+|(?:[A-Z][a-z0-9]+){2,})\b")
        .expect("static regex")
});

/// Recognizes the grammar structures a learner can practise on a chunk.
#[derive(Debug, Clone)]
pub struct GrammarDetector {
    text_patterns: Vec<(GrammarPattern, Regex)>,
    imperative: Regex,
}

impl Default for GrammarDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarDetector {
    pub fn new() -> Self {
        let patterns = [
            (GrammarPattern::PresentSimple, r"\b(?:is|are|does|do|has|have)\b".to_string()),
            (GrammarPattern::ModalVerb, r"\b(?:can|could|should|would|may|might|must)\b".to_string()),
            (GrammarPattern::PassiveVoice, format!(r"\b(?:is|are|was|were|be|been|being)\s+(?:\w+ed|{})\b", PARTICIPLES)),
            (GrammarPattern::Conditional, r"\b(?:if|unless)\b".to_string()),
            (GrammarPattern::RelativeClause, r",\s*which\b|\b(?:who|whose)\b".to_string()),
            (GrammarPattern::PresentPerfect, format!(r"\b(?:has|have)\s+(?:been|\w+ed|{})\b", PARTICIPLES)),
            (GrammarPattern::Future, r"\bwill\b".to_string()),
        ];
        let text_patterns = patterns
            .into_iter()
            .map(|(pattern, source)| (pattern, Regex::new(&format!("(?i){}", source)).expect("static regex")))
            .collect();
        let imperative = Regex::new(
            r"(?i)^(?:create|add|use|define|install|run|open|call|set|make|import|configure|check|remember|note|try|avoid|keep|pass|return)\b",
        )
        .expect("static regex");
        Self { text_patterns, imperative }
    }

    pub fn detect(&self, profile: &TextProfile) -> BTreeSet<GrammarPattern> {
        let mut found: BTreeSet<GrammarPattern> =
            self.text_patterns.iter().filter(|(_, re)| re.is_match(&profile.text)).map(|(p, _)| *p).collect();
        if profile.sentences.iter().any(|s| self.imperative.is_match(s.trim_start())) {
            found.insert(GrammarPattern::Imperative);
        }
        found
    }
}

/// Lexicon terms found in the text plus compound identifiers
/// (`snake_case`, `camelCase`, `PascalCase`).
pub fn extract_vocabulary(profile: &TextProfile, terms: &BTreeSet<String>) -> BTreeSet<String> {
    let mut vocabulary: BTreeSet<String> =
        profile.words.iter().filter(|w| terms.contains(w.as_str())).cloned().collect();
    vocabulary.extend(IDENTIFIER.find_iter(&profile.text).map(|m| m.as_str().to_string()));
    vocabulary
}
