//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `TECHLINGO_*` env vars, then extracts and validates a typed `Settings`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("TECHLINGO_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an explicit figment, e.g. one built from `Toml::string` in tests.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    /// Typed, validated view of the whole configuration.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if matches!(env, "prod" | "production") && settings.filter.min_score < 3.0 {
            return Err(anyhow::anyhow!(
                "Prod config keeps almost every chunk: filter.min_score = {}. Should be >= 3.0",
                settings.filter.min_score
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub docs_dir: String,
    pub corpus_path: String,
    pub index_path: String,
    pub lexicon_path: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            docs_dir: "./data/docs".to_string(),
            corpus_path: "./data/corpus.json".to_string(),
            index_path: "./data/index.json".to_string(),
            lexicon_path: None,
        }
    }
}

/// Sentence grouping bounds, in whitespace-delimited tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub min_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 400, min_tokens: 150 }
    }
}

/// Fixed aggregation weights of the teaching-quality signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub explanation: f32,
    pub vocabulary: f32,
    pub clarity: f32,
    pub structure: f32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self { explanation: 0.35, vocabulary: 0.25, clarity: 0.15, structure: 0.25 }
    }
}

impl SignalWeights {
    pub fn total(&self) -> f32 {
        self.explanation + self.vocabulary + self.clarity + self.structure
    }
}

/// Complexity cut-offs: below `b2` is B1, below `c1` is B2, otherwise C1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    pub b2: f32,
    pub c1: f32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self { b2: 0.35, c1: 0.65 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: SignalWeights,
    /// Technical-term density that earns the full vocabulary signal.
    pub vocabulary_peak: f32,
    pub vocabulary_width: f32,
    /// Explanatory markers per sentence that saturate the signal.
    pub marker_saturation: f32,
    pub levels: LevelThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            vocabulary_peak: 0.10,
            vocabulary_width: 0.07,
            marker_saturation: 0.5,
            levels: LevelThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_score: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { min_score: 5.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Upper bound of total terms as a multiple of the original term count.
    pub max_expansion_factor: usize,
    pub expansion_weight: f32,
    pub technology_boost: f32,
    pub max_query_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_expansion_factor: 3, expansion_weight: 0.5, technology_boost: 0.25, max_query_chars: 1024 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Weight of similarity in the combined score; the rest goes to pedagogy.
    pub alpha: f32,
    pub level_penalty: f32,
    /// Candidates retrieved per requested result.
    pub candidate_multiplier: usize,
    pub default_results: usize,
    pub max_results: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { alpha: 0.7, level_penalty: 0.2, candidate_multiplier: 4, default_results: 5, max_results: 100 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingConfig,
    pub scoring: ScoringConfig,
    pub filter: FilterConfig,
    pub query: QueryConfig,
    pub ranking: RankingConfig,
}

fn invalid(msg: String) -> Error {
    Error::InvalidConfig(msg)
}

pub fn validate_min_score(min_score: f32) -> Result<()> {
    if !(1.0..=10.0).contains(&min_score) {
        return Err(invalid(format!("filter.min_score must be within [1, 10], got {}", min_score)));
    }
    Ok(())
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 || self.min_tokens == 0 {
            return Err(invalid("chunking token bounds must be positive".to_string()));
        }
        if self.min_tokens > self.max_tokens {
            return Err(invalid(format!(
                "chunking.min_tokens ({}) exceeds chunking.max_tokens ({})",
                self.min_tokens, self.max_tokens
            )));
        }
        Ok(())
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        if [w.explanation, w.vocabulary, w.clarity, w.structure].iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(invalid("scoring weights must be finite and non-negative".to_string()));
        }
        if w.total() <= 0.0 {
            return Err(invalid("scoring weights must not all be zero".to_string()));
        }
        if !(self.vocabulary_peak > 0.0 && self.vocabulary_peak < 1.0) || self.vocabulary_width <= 0.0 {
            return Err(invalid("vocabulary peak must be in (0, 1) and width positive".to_string()));
        }
        if self.marker_saturation <= 0.0 {
            return Err(invalid("scoring.marker_saturation must be positive".to_string()));
        }
        let l = &self.levels;
        if !(0.0 < l.b2 && l.b2 < l.c1 && l.c1 < 1.0) {
            return Err(invalid(format!(
                "level thresholds must satisfy 0 < b2 < c1 < 1, got b2={} c1={}",
                l.b2, l.c1
            )));
        }
        Ok(())
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_expansion_factor < 1 {
            return Err(invalid("query.max_expansion_factor must be at least 1".to_string()));
        }
        if !(self.expansion_weight > 0.0 && self.expansion_weight <= 1.0) {
            return Err(invalid(format!("query.expansion_weight must be in (0, 1], got {}", self.expansion_weight)));
        }
        if !self.technology_boost.is_finite() || self.technology_boost < 0.0 {
            return Err(invalid("query.technology_boost must be non-negative".to_string()));
        }
        if self.max_query_chars == 0 {
            return Err(invalid("query.max_query_chars must be positive".to_string()));
        }
        Ok(())
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.alpha) {
            return Err(invalid(format!("ranking.alpha must be within [0, 1), got {}", self.alpha)));
        }
        if !(0.0..=1.0).contains(&self.level_penalty) {
            return Err(invalid(format!("ranking.level_penalty must be within [0, 1], got {}", self.level_penalty)));
        }
        if self.candidate_multiplier < 2 {
            return Err(invalid("ranking.candidate_multiplier must be at least 2".to_string()));
        }
        if self.default_results == 0 || self.default_results > self.max_results {
            return Err(invalid(format!(
                "ranking.default_results must be in 1..={}, got {}",
                self.max_results, self.default_results
            )));
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.scoring.validate()?;
        validate_min_score(self.filter.min_score)?;
        self.query.validate()?;
        self.ranking.validate()
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
