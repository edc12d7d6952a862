use std::collections::BTreeSet;

use super::{ComplexityModel, PhraseSet, TextProfile};
use crate::lexicon::Lexicon;
use crate::traits::Signal;

/// Explanatory discourse markers per sentence, saturating at `saturation`.
#[derive(Debug, Clone)]
pub struct ExplanationSignal {
    markers: PhraseSet,
    saturation: f32,
}

impl ExplanationSignal {
    pub fn new(markers: PhraseSet, saturation: f32) -> Self {
        Self { markers, saturation }
    }
}

impl Signal for ExplanationSignal {
    fn name(&self) -> &'static str {
        "explanation"
    }

    fn measure(&self, profile: &TextProfile) -> f32 {
        let per_sentence = self.markers.count(&profile.text) as f32 / profile.sentence_count() as f32;
        (per_sentence / self.saturation).min(1.0)
    }
}

/// Technical-term density, peaked: sparse text is not technical enough and
/// dense text is a jargon dump.
#[derive(Debug, Clone)]
pub struct VocabularySignal {
    terms: BTreeSet<String>,
    peak: f32,
    width: f32,
}

impl VocabularySignal {
    pub fn new(lexicon: &Lexicon, peak: f32, width: f32) -> Self {
        let terms = lexicon.technical_vocabulary();
        Self { terms, peak, width }
    }

    pub fn density(&self, profile: &TextProfile) -> f32 {
        if profile.words.is_empty() {
            return 0.0;
        }
        let hits = profile.words.iter().filter(|w| self.terms.contains(w.as_str())).count();
        hits as f32 / profile.words.len() as f32
    }
}

impl Signal for VocabularySignal {
    fn name(&self) -> &'static str {
        "vocabulary"
    }

    fn measure(&self, profile: &TextProfile) -> f32 {
        let density = self.density(profile);
        if density == 0.0 {
            return 0.0;
        }
        let z = (density - self.peak) / self.width;
        (-z * z).exp()
    }
}

/// Inverse of sentence complexity: plain sentences teach better.
#[derive(Debug, Clone)]
pub struct ClaritySignal {
    model: ComplexityModel,
}

impl ClaritySignal {
    pub fn new(model: ComplexityModel) -> Self {
        Self { model }
    }
}

impl Signal for ClaritySignal {
    fn name(&self) -> &'static str {
        "clarity"
    }

    fn measure(&self, profile: &TextProfile) -> f32 {
        1.0 - self.model.complexity(profile)
    }
}

/// Share of cue categories present: step ordering, comparison, cause and effect.
#[derive(Debug, Clone)]
pub struct StructureSignal {
    categories: [PhraseSet; 3],
}

impl StructureSignal {
    pub fn new(steps: PhraseSet, comparisons: PhraseSet, causes: PhraseSet) -> Self {
        Self { categories: [steps, comparisons, causes] }
    }
}

impl Signal for StructureSignal {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn measure(&self, profile: &TextProfile) -> f32 {
        let present = self.categories.iter().filter(|c| c.is_match(&profile.text)).count();
        present as f32 / self.categories.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases(words: &[&str]) -> PhraseSet {
        PhraseSet::new(&words.iter().map(|w| w.to_string()).collect::<Vec<_>>()).expect("phrases")
    }

    #[test]
    fn explanation_saturates() {
        let signal = ExplanationSignal::new(phrases(&["for example", "this means"]), 0.5);
        let none = TextProfile::new("Plain words. More words.");
        let one = TextProfile::new("For example, a loop repeats. It stops at the end.");
        let many = TextProfile::new("For example, x. This means y.");
        assert_eq!(signal.measure(&none), 0.0);
        assert_eq!(signal.measure(&one), 1.0);
        assert_eq!(signal.measure(&many), 1.0);
        let sparse = TextProfile::new("For example, x. A. B. C.");
        assert!((signal.measure(&sparse) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn vocabulary_is_peaked_not_monotonic() {
        let signal = VocabularySignal::new(&Lexicon::default(), 0.10, 0.07);
        let none = TextProfile::new("The cat sat on the mat today.");
        let moderate = TextProfile::new("Each function takes one input and gives back a result.");
        let jargon = TextProfile::new("function closure promise callback lambda module");
        assert_eq!(signal.measure(&none), 0.0);
        assert!(signal.measure(&moderate) > 0.9);
        assert!(signal.measure(&jargon) < 0.01);
    }

    #[test]
    fn structure_counts_categories_not_occurrences() {
        let signal = StructureSignal::new(phrases(&["first", "then"]), phrases(&["unlike"]), phrases(&["because"]));
        assert_eq!(signal.measure(&TextProfile::new("First do this, then that, then more.")), 1.0 / 3.0);
        let all = TextProfile::new("First, unlike before, it fails because of x.");
        assert_eq!(signal.measure(&all), 1.0);
    }
}
