//! Offline batch pipeline: normalize, chunk, score, filter.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunker::chunk;
use crate::config::{validate_min_score, ChunkingConfig, Settings};
use crate::error::{Error, Result};
use crate::filter::filter_chunks;
use crate::lexicon::Lexicon;
use crate::normalize::normalize_with_report;
use crate::scoring::TeachingScorer;
use crate::tokenize::count_tokens;
use crate::traits::Assessor;
use crate::types::{Assessment, ChunkId, Corpus, CorpusStats, Document, DocumentId, RawChunk};

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "html", "htm", "rst"];

/// A chunk cut from one document, not yet given a corpus-wide id.
struct DraftChunk {
    ordinal: usize,
    text: String,
    token_count: usize,
    assessment: Assessment,
}

/// Documents read from a directory, plus the files that could not be read.
#[derive(Debug, Default)]
pub struct LoadedDirectory {
    pub documents: Vec<Document>,
    pub unreadable: Vec<PathBuf>,
}

pub struct DataProcessor {
    chunking: ChunkingConfig,
    min_score: f32,
    assessor: Box<dyn Assessor>,
}

impl DataProcessor {
    pub fn new(settings: &Settings, lexicon: &Lexicon) -> Result<Self> {
        let scorer = TeachingScorer::new(&settings.scoring, lexicon)?;
        Self::with_assessor(settings, scorer)
    }

    /// Use a custom assessor in place of the heuristic teaching scorer.
    pub fn with_assessor(settings: &Settings, assessor: impl Assessor + 'static) -> Result<Self> {
        settings.validate()?;
        Ok(Self { chunking: settings.chunking, min_score: settings.filter.min_score, assessor: Box::new(assessor) })
    }

    pub fn with_min_score(mut self, min_score: f32) -> Result<Self> {
        validate_min_score(min_score)?;
        self.min_score = min_score;
        Ok(self)
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    /// Score every chunk without filtering; useful to calibrate `min_score`.
    pub fn score_documents(&self, documents: &[Document]) -> Vec<f32> {
        documents
            .par_iter()
            .enumerate()
            .filter_map(|(i, doc)| self.process_document(DocumentId(i as u32), doc))
            .flat_map_iter(|drafts| drafts.into_iter().map(|d| d.assessment.score))
            .collect()
    }

    pub fn process_documents(&self, documents: &[Document]) -> Corpus {
        self.process_with_progress(documents, &|| {})
    }

    /// Documents are processed in parallel; `on_document` fires once per
    /// document as it finishes. Chunk ids follow source order regardless.
    pub fn process_with_progress(&self, documents: &[Document], on_document: &(dyn Fn() + Sync)) -> Corpus {
        self.process_counting(documents, 0, on_document)
    }

    /// Like [`Self::process_with_progress`]; unreadable files count as skipped documents.
    pub fn process_loaded(&self, loaded: &LoadedDirectory, on_document: &(dyn Fn() + Sync)) -> Corpus {
        self.process_counting(&loaded.documents, loaded.unreadable.len(), on_document)
    }

    fn process_counting(&self, documents: &[Document], unreadable: usize, on_document: &(dyn Fn() + Sync)) -> Corpus {
        let per_document: Vec<Option<Vec<DraftChunk>>> = documents
            .par_iter()
            .enumerate()
            .map(|(i, doc)| {
                let drafts = self.process_document(DocumentId(i as u32), doc);
                on_document();
                drafts
            })
            .collect();

        let mut scored = Vec::new();
        let mut skipped = unreadable;
        let mut next_id = 0u32;
        for (i, drafts) in per_document.into_iter().enumerate() {
            let Some(drafts) = drafts else {
                skipped += 1;
                continue;
            };
            let technology = technology_tag(&documents[i].source_id);
            for draft in drafts {
                let raw = RawChunk {
                    id: ChunkId(next_id),
                    doc_id: DocumentId(i as u32),
                    technology: technology.clone(),
                    text: draft.text,
                    ordinal: draft.ordinal,
                    token_count: draft.token_count,
                };
                next_id += 1;
                scored.push(raw.assess(draft.assessment));
            }
        }

        let outcome = filter_chunks(scored, self.min_score);
        let mut stats = CorpusStats {
            documents_in: documents.len() + unreadable,
            documents_skipped: skipped,
            chunks_in: outcome.total_in,
            below_threshold: outcome.below_threshold,
            duplicates: outcome.duplicates,
            ..CorpusStats::default()
        };
        stats.fill_kept(&outcome.kept);
        tracing::info!(
            documents = stats.documents_in,
            skipped = stats.documents_skipped,
            chunks_in = stats.chunks_in,
            kept = stats.chunks_kept,
            min_score = self.min_score,
            "corpus processed"
        );
        Corpus { min_score: self.min_score, chunks: outcome.kept, stats }
    }

    /// `None` when the document is skipped.
    fn process_document(&self, id: DocumentId, doc: &Document) -> Option<Vec<DraftChunk>> {
        if doc.source_id.trim().is_empty() {
            tracing::warn!(doc = id.0, uri = %doc.uri, "skipping document without a technology tag");
            return None;
        }
        let (cleaned, problems) = normalize_with_report(&doc.text);
        for problem in &problems {
            tracing::warn!(doc = id.0, uri = %doc.uri, "{problem}");
        }
        if cleaned.is_empty() {
            tracing::warn!(doc = id.0, uri = %doc.uri, "skipping document with no explanatory prose");
            return None;
        }
        let chunks = chunk(&cleaned, &self.chunking);
        let drafts: Vec<DraftChunk> = chunks
            .iter()
            .enumerate()
            .map(|(ordinal, text)| DraftChunk {
                ordinal,
                text: text.to_string(),
                token_count: count_tokens(text),
                assessment: self.assessor.assess(text),
            })
            .collect();
        tracing::debug!(
            doc = id.0,
            uri = %doc.uri,
            sentences = chunks.sentence_count(),
            tokens = chunks.total_tokens(),
            chunks = drafts.len(),
            "document chunked"
        );
        Some(drafts)
    }

    /// Load every supported file under `data_dir`. The technology tag is the
    /// first directory below `data_dir` (`docs/react/hooks.md` -> `react`).
    /// A file that cannot be read is logged and left out.
    pub fn load_directory(&self, data_dir: &Path) -> Result<LoadedDirectory> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("document directory {}", data_dir.display())));
        }
        let files = self.list_doc_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no documents found");
        }
        Ok(self.read_documents(files, data_dir))
    }

    fn read_documents(&self, files: Vec<PathBuf>, data_dir: &Path) -> LoadedDirectory {
        let mut loaded = LoadedDirectory { documents: Vec::with_capacity(files.len()), unreadable: Vec::new() };
        for file_path in files {
            match self.read_file_content(&file_path) {
                Ok(text) => {
                    let technology = self.get_technology_from_path(&file_path, data_dir);
                    loaded.documents.push(Document::new(technology, file_path.to_string_lossy(), text));
                }
                Err(e) => {
                    tracing::warn!(path = %file_path.display(), error = %e, "skipping unreadable document");
                    loaded.unreadable.push(file_path);
                }
            }
        }
        loaded
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn get_technology_from_path(&self, file_path: &Path, data_dir: &Path) -> String {
        let relative_path = file_path.strip_prefix(data_dir).unwrap_or(file_path);
        let mut components = relative_path.components();
        match (components.next(), components.next()) {
            (Some(first), Some(_)) => first.as_os_str().to_string_lossy().to_lowercase(),
            _ => "misc".to_string(),
        }
    }

    fn list_doc_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut doc_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| DOC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        doc_files.sort();
        doc_files
    }
}

fn technology_tag(source_id: &str) -> String {
    source_id.trim().to_lowercase()
}

/// Run normalize, chunk, score and filter over `(source_id, raw_text)` pairs
/// with the built-in configuration and lexicon.
pub fn process_corpus<I, D>(documents: I, min_score: f32) -> Result<Corpus>
where
    I: IntoIterator<Item = D>,
    D: Into<Document>,
{
    let documents: Vec<Document> = documents.into_iter().map(Into::into).collect();
    let processor = DataProcessor::new(&Settings::default(), &Lexicon::default())?.with_min_score(min_score)?;
    Ok(processor.process_documents(&documents))
}
