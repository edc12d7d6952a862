use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use techlingo_core::config::{resolve_with_base, Config, Settings};
use techlingo_core::filter::threshold_for_fraction;
use techlingo_core::{Assessment, Corpus, CorpusStats, DataProcessor, Level, Lexicon, Query, TechnologyFilter};
use techlingo_search::SearchEngine;
use techlingo_text::{Index, IndexBuilder};

#[derive(Parser)]
#[command(name = "techlingo", about = "Technical documentation as English learning material", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize, chunk, score and filter a documentation directory into a corpus
    Process {
        /// Directory with one sub-directory per technology
        dir: Option<String>,

        /// Minimum pedagogical score a chunk needs to be kept
        #[arg(long, conflicts_with = "keep_fraction")]
        min_score: Option<f32>,

        /// Keep roughly this top fraction of chunks instead of a fixed threshold
        #[arg(long)]
        keep_fraction: Option<f32>,

        /// Corpus snapshot to write
        #[arg(long)]
        out: Option<String>,
    },

    /// Build the retrieval index from a corpus snapshot
    Index {
        #[arg(long)]
        corpus: Option<String>,

        #[arg(long)]
        out: Option<String>,
    },

    /// Ask a question and print the best learning chunks
    Query {
        text: String,

        #[arg(long)]
        index: Option<String>,

        #[arg(short, long)]
        n: Option<usize>,

        /// Favour chunks about this technology
        #[arg(long)]
        tech: Option<String>,

        /// Exclude other technologies instead of favouring one
        #[arg(long, requires = "tech")]
        strict_tech: bool,

        /// B1, B2 or C1
        #[arg(long)]
        level: Option<String>,
    },

    /// Print statistics of a corpus snapshot
    Inspect {
        #[arg(long)]
        corpus: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let base = std::env::current_dir().context("reading current directory")?;
    let lexicon = load_lexicon(&settings, &base)?;

    match cli.command {
        Commands::Process { dir, min_score, keep_fraction, out } => {
            let dir = resolve_with_base(&base, dir.unwrap_or_else(|| settings.data.docs_dir.clone()));
            let out = resolve_with_base(&base, out.unwrap_or_else(|| settings.data.corpus_path.clone()));
            process(&settings, &lexicon, &dir, &out, min_score, keep_fraction)?;
        }
        Commands::Index { corpus, out } => {
            let corpus_path = resolve_with_base(&base, corpus.unwrap_or_else(|| settings.data.corpus_path.clone()));
            let out = resolve_with_base(&base, out.unwrap_or_else(|| settings.data.index_path.clone()));
            let corpus =
                Corpus::load(&corpus_path).with_context(|| format!("loading corpus {}", corpus_path.display()))?;
            let index = IndexBuilder::new(&lexicon).build(&corpus);
            index.save(&out).with_context(|| format!("writing index {}", out.display()))?;
            println!("Indexed {} chunks ({} terms) into {}", index.len(), index.term_count(), out.display());
        }
        Commands::Query { text, index, n, tech, strict_tech, level } => {
            let index_path = resolve_with_base(&base, index.unwrap_or_else(|| settings.data.index_path.clone()));
            let index =
                Index::load(&index_path).with_context(|| format!("loading index {}", index_path.display()))?;
            let engine = SearchEngine::new(&settings, &lexicon)?;
            engine.publish(index);

            let mut request = Query::new(text, n.unwrap_or(settings.ranking.default_results));
            if let Some(tag) = tech {
                request = request.with_technology(if strict_tech {
                    TechnologyFilter::strict(tag)
                } else {
                    TechnologyFilter::soft(tag)
                });
            }
            if let Some(level) = level {
                request = request.with_level(level.parse::<Level>()?);
            }
            let result = engine.query(&request)?;
            if result.is_empty() {
                println!("No matching chunks.");
            }
            for (rank, item) in result.items.iter().enumerate() {
                println!(
                    "{}. [{} | {} | score {:.1}] combined {:.3} (similarity {:.3})",
                    rank + 1,
                    item.chunk.technology,
                    item.chunk.level(),
                    item.pedagogical_score,
                    item.combined_score,
                    item.similarity
                );
                println!("   {}", item.chunk.text);
                for line in teaching_context(&item.chunk.assessment) {
                    println!("   {}", line);
                }
            }
        }
        Commands::Inspect { corpus } => {
            let corpus_path = resolve_with_base(&base, corpus.unwrap_or_else(|| settings.data.corpus_path.clone()));
            let corpus =
                Corpus::load(&corpus_path).with_context(|| format!("loading corpus {}", corpus_path.display()))?;
            println!("Corpus {} (min_score {:.1})", corpus_path.display(), corpus.min_score);
            print_stats(&corpus.stats);
        }
    }
    Ok(())
}

fn load_lexicon(settings: &Settings, base: &Path) -> anyhow::Result<Lexicon> {
    match &settings.data.lexicon_path {
        Some(path) => {
            let path = resolve_with_base(base, path);
            let lexicon =
                Lexicon::from_toml_file(&path).with_context(|| format!("loading lexicon {}", path.display()))?;
            tracing::info!(version = %lexicon.version, path = %path.display(), "lexicon loaded");
            Ok(lexicon)
        }
        None => Ok(Lexicon::default()),
    }
}

fn process(
    settings: &Settings,
    lexicon: &Lexicon,
    dir: &Path,
    out: &Path,
    min_score: Option<f32>,
    keep_fraction: Option<f32>,
) -> anyhow::Result<()> {
    let mut processor = DataProcessor::new(settings, lexicon)?;
    let loaded = processor.load_directory(dir)?;
    println!("Processing {} documents from {}", loaded.documents.len(), dir.display());
    if !loaded.unreadable.is_empty() {
        println!("Skipped {} unreadable files", loaded.unreadable.len());
    }

    if let Some(fraction) = keep_fraction {
        let scores = processor.score_documents(&loaded.documents);
        if let Some(threshold) = threshold_for_fraction(&scores, fraction) {
            println!("Keeping the top {:.0}% of {} chunks: min_score {:.2}", fraction * 100.0, scores.len(), threshold);
            processor = processor.with_min_score(threshold)?;
        }
    } else if let Some(min_score) = min_score {
        processor = processor.with_min_score(min_score)?;
    }

    let pb = ProgressBar::new(loaded.documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let corpus = processor.process_loaded(&loaded, &|| pb.inc(1));
    pb.finish_and_clear();

    corpus.save(out).with_context(|| format!("writing corpus {}", out.display()))?;
    println!("Wrote {} chunks to {}", corpus.len(), out.display());
    print_stats(&corpus.stats);
    Ok(())
}

/// Grammar and vocabulary a learner can study in a chunk, one labelled line each.
fn teaching_context(assessment: &Assessment) -> Vec<String> {
    let mut lines = Vec::new();
    if !assessment.grammar.is_empty() {
        let grammar: Vec<String> = assessment.grammar.iter().map(|g| g.to_string()).collect();
        lines.push(format!("grammar: {}", grammar.join(", ")));
    }
    if !assessment.vocabulary.is_empty() {
        let vocabulary: Vec<&str> = assessment.vocabulary.iter().map(String::as_str).collect();
        lines.push(format!("vocabulary: {}", vocabulary.join(", ")));
    }
    lines
}

fn print_stats(stats: &CorpusStats) {
    println!("Documents: {} in, {} skipped", stats.documents_in, stats.documents_skipped);
    println!(
        "Chunks: {} in, {} below threshold, {} duplicates, {} kept",
        stats.chunks_in, stats.below_threshold, stats.duplicates, stats.chunks_kept
    );
    println!("Average score: {:.2}", stats.average_score);
    for level in Level::ALL {
        println!("  {}: {}", level, stats.per_level.get(level));
    }
    for (tech, count) in &stats.per_technology {
        println!("  {}: {}", tech, count);
    }
}
