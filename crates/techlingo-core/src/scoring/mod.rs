//! Teaching-quality scoring.
//!
//! A [`TeachingScorer`] is a fixed-weight aggregate of independent
//! [`Signal`]s, each normalized to [0, 1]. The proficiency level is derived
//! from the [`ComplexityModel`] alone, so score and level may diverge.

mod grammar;
mod signals;

pub use grammar::{extract_vocabulary, GrammarDetector};
pub use signals::{ClaritySignal, ExplanationSignal, StructureSignal, VocabularySignal};

use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use crate::config::{LevelThresholds, ScoringConfig};
use crate::error::{Error, Result};
use crate::lexicon::Lexicon;
use crate::tokenize::{lowercase_words, sentences};
use crate::traits::{Assessor, Signal};
use crate::types::{Assessment, Level};

/// Pre-split view of a chunk shared by all signals.
#[derive(Debug, Clone)]
pub struct TextProfile {
    pub text: String,
    pub lower: String,
    pub sentences: Vec<String>,
    /// Lower-cased word tokens.
    pub words: Vec<String>,
}

impl TextProfile {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            lower: text.to_lowercase(),
            sentences: sentences(text).into_iter().map(str::to_string).collect(),
            words: lowercase_words(text),
        }
    }

    /// Sentence count, never zero so per-sentence rates stay finite.
    pub fn sentence_count(&self) -> usize {
        self.sentences.len().max(1)
    }
}

/// Case-insensitive whole-word matcher over a list of cue phrases.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    regex: Option<Regex>,
}

impl PhraseSet {
    pub fn new(phrases: &[String]) -> Result<Self> {
        let mut phrases: Vec<&str> = phrases.iter().map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
        if phrases.is_empty() {
            return Ok(Self { regex: None });
        }
        // Longest first so "in other words" wins over "in".
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        phrases.dedup();
        let alternation = phrases.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|");
        let regex = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cue phrase list: {}", e)))?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn count(&self, text: &str) -> usize {
        self.regex.as_ref().map_or(0, |r| r.find_iter(text).count())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }
}

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Sentence complexity in [0, 1]: long sentences, subordinate clauses and
/// complex words all push it up.
#[derive(Debug, Clone)]
pub struct ComplexityModel {
    subordinators: PhraseSet,
    complex_words: BTreeSet<String>,
}

impl ComplexityModel {
    const LENGTH_WEIGHT: f32 = 0.45;
    const CLAUSE_WEIGHT: f32 = 0.35;
    const WORD_WEIGHT: f32 = 0.20;

    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        Ok(Self {
            subordinators: PhraseSet::new(&lexicon.subordinators)?,
            complex_words: lexicon.complex_words.clone(),
        })
    }

    pub fn complexity(&self, profile: &TextProfile) -> f32 {
        if profile.words.is_empty() {
            return 0.0;
        }
        let sentences = profile.sentence_count() as f32;
        let avg_len = profile.words.len() as f32 / sentences;
        let length = clamp01((avg_len - 6.0) / 22.0);

        let clauses = clamp01(self.subordinators.count(&profile.lower) as f32 / sentences / 1.5);

        let complex = profile
            .words
            .iter()
            .filter(|w| self.complex_words.contains(w.as_str()) || w.chars().count() >= 12)
            .count();
        let words = clamp01(complex as f32 / profile.words.len() as f32 / 0.08);

        Self::LENGTH_WEIGHT * length + Self::CLAUSE_WEIGHT * clauses + Self::WORD_WEIGHT * words
    }
}

pub fn level_for(complexity: f32, thresholds: &LevelThresholds) -> Level {
    if complexity < thresholds.b2 {
        Level::B1
    } else if complexity < thresholds.c1 {
        Level::B2
    } else {
        Level::C1
    }
}

/// Per-signal values behind one score.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub signals: Vec<(&'static str, f32)>,
    pub complexity: f32,
    pub score: f32,
    pub level: Level,
}

pub struct TeachingScorer {
    signals: Vec<(Box<dyn Signal>, f32)>,
    complexity: ComplexityModel,
    levels: LevelThresholds,
    grammar: GrammarDetector,
    vocabulary: BTreeSet<String>,
}

impl TeachingScorer {
    pub fn new(config: &ScoringConfig, lexicon: &Lexicon) -> Result<Self> {
        config.validate()?;
        let complexity = ComplexityModel::new(lexicon)?;
        let weights = config.weights;
        let signals: Vec<(Box<dyn Signal>, f32)> = vec![
            (
                Box::new(ExplanationSignal::new(
                    PhraseSet::new(&lexicon.explanatory_markers)?,
                    config.marker_saturation,
                )),
                weights.explanation,
            ),
            (
                Box::new(VocabularySignal::new(lexicon, config.vocabulary_peak, config.vocabulary_width)),
                weights.vocabulary,
            ),
            (Box::new(ClaritySignal::new(complexity.clone())), weights.clarity),
            (
                Box::new(StructureSignal::new(
                    PhraseSet::new(&lexicon.step_markers)?,
                    PhraseSet::new(&lexicon.comparison_markers)?,
                    PhraseSet::new(&lexicon.causal_markers)?,
                )),
                weights.structure,
            ),
        ];
        let vocabulary = lexicon.technical_vocabulary();
        Ok(Self { signals, complexity, levels: config.levels, grammar: GrammarDetector::new(), vocabulary })
    }

    pub fn breakdown(&self, text: &str) -> Breakdown {
        let profile = TextProfile::new(text);
        self.breakdown_profile(&profile)
    }

    fn breakdown_profile(&self, profile: &TextProfile) -> Breakdown {
        let mut weighted = 0.0f32;
        let mut total = 0.0f32;
        let mut signals = Vec::with_capacity(self.signals.len());
        for (signal, weight) in &self.signals {
            let value = clamp01(signal.measure(profile));
            weighted += weight * value;
            total += weight;
            signals.push((signal.name(), value));
        }
        let normalized = if total > 0.0 { weighted / total } else { 0.0 };
        let complexity = self.complexity.complexity(profile);
        Breakdown {
            signals,
            complexity,
            score: (1.0 + 9.0 * normalized).clamp(1.0, 10.0),
            level: level_for(complexity, &self.levels),
        }
    }

    pub fn score(&self, text: &str) -> Assessment {
        let profile = TextProfile::new(text);
        let breakdown = self.breakdown_profile(&profile);
        Assessment {
            score: breakdown.score,
            level: breakdown.level,
            vocabulary: extract_vocabulary(&profile, &self.vocabulary),
            grammar: self.grammar.detect(&profile),
        }
    }
}

impl Assessor for TeachingScorer {
    fn assess(&self, text: &str) -> Assessment {
        self.score(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GrammarPattern;

    fn scorer() -> TeachingScorer {
        TeachingScorer::new(&ScoringConfig::default(), &Lexicon::default()).expect("scorer")
    }

    const RICH: &str = "A function is a block of code. For example, you can call it many times. \
                        This means you write the code once. First, define the function. Then call it.";
    const DENSE: &str = "Although the asynchronous implementation of the synchronization infrastructure \
                         guarantees comprehensive compatibility whenever concurrent configuration optimization \
                         occurs, which consequently necessitates architectural documentation because dependency \
                         resolution, unless carefully orchestrated, introduces nondeterministic behaviour.";

    #[test]
    fn explained_text_outscores_bare_text() {
        let s = scorer();
        let rich = s.score(RICH);
        let bare = s.score("Data. Stuff happens. Things exist.");
        assert!(rich.score > bare.score + 3.0, "rich={} bare={}", rich.score, bare.score);
        assert!((1.0..=10.0).contains(&rich.score));
        assert!((1.0..=10.0).contains(&bare.score));
    }

    #[test]
    fn level_follows_complexity_not_score() {
        let s = scorer();
        assert_eq!(s.score(RICH).level, Level::B1);
        assert_eq!(s.score(DENSE).level, Level::C1);
    }

    #[test]
    fn scoring_is_deterministic() {
        let s = scorer();
        assert_eq!(s.score(RICH), s.score(RICH));
        assert_eq!(scorer().score(DENSE), s.score(DENSE));
    }

    #[test]
    fn empty_text_scores_minimum_band() {
        let a = scorer().score("");
        assert!((1.0..=10.0).contains(&a.score));
        assert_eq!(a.level, Level::B1);
        assert!(a.vocabulary.is_empty());
        assert!(a.grammar.is_empty());
    }

    #[test]
    fn breakdown_reports_every_signal_in_range() {
        let b = scorer().breakdown(RICH);
        let names: Vec<&str> = b.signals.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["explanation", "vocabulary", "clarity", "structure"]);
        assert!(b.signals.iter().all(|(_, v)| (0.0..=1.0).contains(v)));
        assert_eq!(b.signals[0].1, 1.0, "three markers over five sentences saturate");
    }

    #[test]
    fn vocabulary_and_grammar_are_extracted() {
        let a = scorer().score("If you call useState, the component will re-render. The state is stored by React.");
        assert!(a.vocabulary.contains("useState"));
        assert!(a.vocabulary.contains("component"));
        assert!(a.vocabulary.contains("state"));
        assert!(a.grammar.contains(&GrammarPattern::Conditional));
        assert!(a.grammar.contains(&GrammarPattern::Future));
        assert!(a.grammar.contains(&GrammarPattern::PassiveVoice));
        assert!(!a.grammar.contains(&GrammarPattern::ModalVerb));
    }

    #[test]
    fn phrase_set_matches_whole_words_only() {
        let set = PhraseSet::new(&["for example".to_string(), "step".to_string()]).expect("phrases");
        assert_eq!(set.count("For example, each STEP runs. Footsteps do not."), 2);
        assert!(!PhraseSet::new(&[]).expect("empty").is_match("anything"));
    }
}
