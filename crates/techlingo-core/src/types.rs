//! Domain types shared by the batch pipeline and the query path.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Position of a document in the ingested batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u32);

/// Globally unique chunk identifier, assigned in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub u32);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw text blob handed over by the acquisition side.
///
/// - `source_id`: technology tag, e.g. "react" or "aws"
/// - `uri`: where the text came from
/// - `text`: unprocessed content (markdown, HTML, plain text)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source_id: String,
    pub uri: String,
    pub text: String,
}

impl Document {
    pub fn new(source_id: impl Into<String>, uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), uri: uri.into(), text: text.into() }
    }
}

impl<S: Into<String>, T: Into<String>> From<(S, T)> for Document {
    fn from((source_id, text): (S, T)) -> Self {
        let source_id = source_id.into();
        let uri = format!("memory://{}", source_id);
        Self { source_id, uri, text: text.into() }
    }
}

/// CEFR-style band estimating the reader skill a chunk requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    B1,
    B2,
    C1,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::B1, Level::B2, Level::C1];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            "C1" => Ok(Level::C1),
            other => Err(Error::InvalidConfig(format!("unknown proficiency level '{}'", other))),
        }
    }
}

/// Grammar structures a learner can study in a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarPattern {
    PresentSimple,
    ModalVerb,
    Imperative,
    PassiveVoice,
    Conditional,
    RelativeClause,
    PresentPerfect,
    Future,
}

impl GrammarPattern {
    pub fn label(self) -> &'static str {
        match self {
            GrammarPattern::PresentSimple => "present simple",
            GrammarPattern::ModalVerb => "modal verbs",
            GrammarPattern::Imperative => "imperative",
            GrammarPattern::PassiveVoice => "passive voice",
            GrammarPattern::Conditional => "conditional",
            GrammarPattern::RelativeClause => "relative clause",
            GrammarPattern::PresentPerfect => "present perfect",
            GrammarPattern::Future => "future",
        }
    }
}

impl fmt::Display for GrammarPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of the teaching-quality scorer.
///
/// Score and level only ever travel together, so a chunk carrying an
/// `Assessment` always has both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Continuous pedagogical score in [1, 10].
    pub score: f32,
    pub level: Level,
    pub vocabulary: BTreeSet<String>,
    pub grammar: BTreeSet<GrammarPattern>,
}

/// A chunk as cut by the chunker, before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChunk {
    pub id: ChunkId,
    pub doc_id: DocumentId,
    pub technology: String,
    pub text: String,
    /// Position within the parent document.
    pub ordinal: usize,
    pub token_count: usize,
}

impl RawChunk {
    /// Attach the scorer's verdict. This is the only way to obtain a `Chunk`.
    pub fn assess(self, assessment: Assessment) -> Chunk {
        Chunk {
            id: self.id,
            doc_id: self.doc_id,
            technology: self.technology,
            text: self.text,
            ordinal: self.ordinal,
            token_count: self.token_count,
            assessment,
        }
    }
}

/// The atomic, scored learning unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: DocumentId,
    pub technology: String,
    pub text: String,
    pub ordinal: usize,
    pub token_count: usize,
    pub assessment: Assessment,
}

impl Chunk {
    pub fn score(&self) -> f32 {
        self.assessment.score
    }

    pub fn level(&self) -> Level {
        self.assessment.level
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub b1: usize,
    pub b2: usize,
    pub c1: usize,
}

impl LevelCounts {
    pub fn add(&mut self, level: Level) {
        match level {
            Level::B1 => self.b1 += 1,
            Level::B2 => self.b2 += 1,
            Level::C1 => self.c1 += 1,
        }
    }

    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::B1 => self.b1,
            Level::B2 => self.b2,
            Level::C1 => self.c1,
        }
    }
}

/// Summary statistics reported by `process_corpus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub documents_in: usize,
    pub documents_skipped: usize,
    pub chunks_in: usize,
    pub below_threshold: usize,
    pub duplicates: usize,
    pub chunks_kept: usize,
    pub per_level: LevelCounts,
    pub per_technology: BTreeMap<String, usize>,
    pub average_score: f32,
}

/// Filtered, deduplicated chunks eligible for retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub min_score: f32,
    pub chunks: Vec<Chunk>,
    pub stats: CorpusStats,
}

impl Corpus {
    /// Wrap already-filtered chunks, deriving the kept-side statistics.
    pub fn from_chunks(chunks: Vec<Chunk>, min_score: f32) -> Self {
        let mut stats = CorpusStats { chunks_in: chunks.len(), ..CorpusStats::default() };
        stats.fill_kept(&chunks);
        Self { min_score, chunks, stats }
    }

    pub fn empty(min_score: f32) -> Self {
        Self::from_chunks(Vec::new(), min_score)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl CorpusStats {
    pub(crate) fn fill_kept(&mut self, kept: &[Chunk]) {
        self.chunks_kept = kept.len();
        self.per_level = LevelCounts::default();
        self.per_technology.clear();
        let mut total = 0.0f64;
        for chunk in kept {
            self.per_level.add(chunk.level());
            *self.per_technology.entry(chunk.technology.clone()).or_default() += 1;
            total += f64::from(chunk.score());
        }
        self.average_score = if kept.is_empty() { 0.0 } else { (total / kept.len() as f64) as f32 };
    }
}

/// Technology restriction attached to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyFilter {
    pub tag: String,
    /// Exclude other technologies instead of only favouring this one.
    pub strict: bool,
}

impl TechnologyFilter {
    pub fn soft(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), strict: false }
    }

    pub fn strict(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), strict: true }
    }
}

/// A learner request. Transient, never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub n_results: usize,
    pub technology: Option<TechnologyFilter>,
    pub level: Option<Level>,
}

impl Query {
    pub fn new(text: impl Into<String>, n_results: usize) -> Self {
        Self { text: text.into(), n_results, technology: None, level: None }
    }

    pub fn with_technology(mut self, filter: TechnologyFilter) -> Self {
        self.technology = Some(filter);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }
}

/// One ranked entry of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub similarity: f32,
    pub pedagogical_score: f32,
    pub combined_score: f32,
}

/// Ordered results, at most `n_results` long.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub items: Vec<RankedChunk>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
