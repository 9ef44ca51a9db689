//! Tonal CLI — build and query the text/acoustic indices and the
//! metadata store directly, no server involved.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tonal_core::acoustic::{AcousticArtifacts, AcousticIndexBuilder, AcousticSearcher};
use tonal_core::artifacts::read_artifact;
use tonal_core::config::Config;
use tonal_core::corpus::{read_histogram_manifest, read_text_corpus};
use tonal_core::metadata::MetadataStore;
use tonal_core::text::{TextArtifacts, TextIndexBuilder, TextSearcher};
use tonal_core::{normalize_track_id, Analyzer, FusionEngine};

/// Tonal — multimodal music retrieval from the terminal.
#[derive(Parser)]
#[command(name = "tonal", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to tonal.toml (defaults if missing)
    #[arg(long, global = true, default_value = "tonal.toml")]
    config: PathBuf,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the text inverted index from a CSV corpus
    BuildText {
        /// Path to the corpus CSV
        corpus: PathBuf,
        /// Column holding the track id
        #[arg(long, default_value = "track_id")]
        id_column: String,
    },
    /// Build the acoustic inverted index from a histogram manifest
    BuildAudio {
        /// Path to the line-delimited JSON histogram manifest
        manifest: PathBuf,
    },
    /// Rank documents against a text query
    SearchText {
        query: String,
        #[arg(long, default_value = "10")]
        top_k: usize,
    },
    /// Rank documents against a raw codeword histogram (comma-separated counts)
    SearchAudio {
        histogram: String,
        #[arg(long, default_value = "10")]
        top_k: usize,
        #[arg(long, default_value = "0.0")]
        min_score: f64,
    },
    /// Rank documents similar to an already-indexed track
    SearchAudioById {
        track_id: String,
        #[arg(long, default_value = "10")]
        top_k: usize,
        #[arg(long, default_value = "0.0")]
        min_score: f64,
    },
    /// Run a SQL-like query against the metadata store
    Query {
        /// Short-form condition or a full SELECT statement
        expression: String,
    },
    /// Fuse acoustic similarity with metadata similarity for a query track
    Fuse {
        track_id: String,
        #[arg(long, default_value = "10")]
        top_k: usize,
        /// Overrides the config's fusion_alpha when set
        #[arg(long)]
        alpha: Option<f64>,
    },
}

fn load_text_artifacts(dir: &std::path::Path) -> tonal_core::Result<TextArtifacts> {
    Ok(TextArtifacts {
        postings: read_artifact(&dir.join("final_postings.json"))?,
        idf: read_artifact(&dir.join("idf.json"))?,
        doc_norms: read_artifact(&dir.join("doc_norms.json"))?,
    })
}

fn load_acoustic_artifacts(dir: &std::path::Path) -> tonal_core::Result<AcousticArtifacts> {
    Ok(AcousticArtifacts {
        postings: read_artifact(&dir.join("acoustic_postings.json"))?,
        idf: read_artifact(&dir.join("acoustic_idf.json"))?,
        doc_norms: read_artifact(&dir.join("acoustic_doc_norms.json"))?,
    })
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("tonal=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config).unwrap_or_else(|e| fail(e));

    match cli.command {
        Commands::BuildText { corpus, id_column } => {
            let docs = read_text_corpus(&corpus, &id_column, &config.text_fields).unwrap_or_else(|e| fail(e));
            let analyzer = Analyzer::new(config.stoplist_path.as_deref(), &config.extra_stopwords);
            let builder = TextIndexBuilder::new(
                analyzer,
                config.text_fields.clone(),
                config.block_limit,
                config.text_index_dir.clone(),
            );
            let artifacts = builder.build(&docs).unwrap_or_else(|e| fail(e));

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "documents": docs.len(),
                        "terms": artifacts.postings.len(),
                    })
                );
            } else {
                println!("indexed {} documents, {} terms", docs.len(), artifacts.postings.len());
            }
        }

        Commands::BuildAudio { manifest } => {
            let (docs, skipped) =
                read_histogram_manifest(&manifest, config.codebook_size).unwrap_or_else(|e| fail(e));
            let builder = AcousticIndexBuilder::new(config.codebook_size, config.acoustic_index_dir.clone());
            let summary = builder.build(&docs).unwrap_or_else(|e| fail(e));

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "indexed": summary.indexed,
                        "skipped_build": summary.skipped,
                        "skipped_manifest": skipped,
                    })
                );
            } else {
                println!(
                    "indexed {} tracks ({} skipped at build, {} skipped in manifest)",
                    summary.indexed, summary.skipped, skipped
                );
            }
        }

        Commands::SearchText { query, top_k } => {
            let artifacts = load_text_artifacts(&config.text_index_dir).unwrap_or_else(|e| fail(e));
            let analyzer = Analyzer::new(config.stoplist_path.as_deref(), &config.extra_stopwords);
            let searcher = TextSearcher::new(&artifacts, &analyzer, config.text_fields.clone());
            let results = searcher.search(&query, top_k, None);
            print_ranked(&results, cli.json);
        }

        Commands::SearchAudio { histogram, top_k, min_score } => {
            let counts = parse_histogram(&histogram).unwrap_or_else(|e| fail(e));
            let artifacts = load_acoustic_artifacts(&config.acoustic_index_dir).unwrap_or_else(|e| fail(e));
            let searcher = AcousticSearcher::new(&artifacts);
            let results = searcher.search(&counts, top_k, min_score);
            print_ranked(&results, cli.json);
        }

        Commands::SearchAudioById { track_id, top_k, min_score } => {
            let artifacts = load_acoustic_artifacts(&config.acoustic_index_dir).unwrap_or_else(|e| fail(e));
            let searcher = AcousticSearcher::new(&artifacts);
            let results = searcher.search_by_id(&normalize_track_id(&track_id), top_k, min_score);
            print_ranked(&results, cli.json);
        }

        Commands::Query { expression } => {
            let store = MetadataStore::open(&config.metadata_db_path).unwrap_or_else(|e| fail(e));
            let rows = store.run_query(&expression).unwrap_or_else(|e| fail(e));

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows).unwrap());
            } else if rows.is_empty() {
                println!("no rows");
            } else {
                for row in &rows {
                    println!("{row:?}");
                }
            }
        }

        Commands::Fuse { track_id, top_k, alpha } => {
            let artifacts = load_acoustic_artifacts(&config.acoustic_index_dir).unwrap_or_else(|e| fail(e));
            let store = MetadataStore::open(&config.metadata_db_path).unwrap_or_else(|e| fail(e));
            let searcher = AcousticSearcher::new(&artifacts);
            let engine = FusionEngine::new(searcher, &store);
            let results =
                engine.fuse(&track_id, top_k, alpha.unwrap_or(config.fusion_alpha)).unwrap_or_else(|e| fail(e));

            if cli.json {
                let items: Vec<_> = results
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "track_id": r.track_id,
                            "score": r.score,
                            "score_audio": r.score_audio,
                            "score_metadata": r.score_metadata,
                            "title": r.title,
                            "artist": r.artist,
                            "genre": r.genre,
                            "year": r.year,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&items).unwrap());
            } else if results.is_empty() {
                println!("no matches");
            } else {
                for r in &results {
                    println!(
                        "{:<10} {:>7.4} (audio {:>6.4}, metadata {:>3.1})  {}",
                        r.track_id,
                        r.score,
                        r.score_audio,
                        r.score_metadata,
                        r.title.as_deref().unwrap_or("?")
                    );
                }
            }
        }
    }
}

fn parse_histogram(input: &str) -> Result<Vec<f64>, String> {
    input
        .split(',')
        .map(|s| s.trim().parse::<f64>().map_err(|e| format!("invalid histogram value {s:?}: {e}")))
        .collect()
}

fn print_ranked(results: &[(String, f64)], json: bool) {
    if json {
        let items: Vec<_> = results.iter().map(|(id, score)| serde_json::json!({"doc_id": id, "score": score})).collect();
        println!("{}", serde_json::to_string_pretty(&items).unwrap());
    } else if results.is_empty() {
        println!("no matches");
    } else {
        for (id, score) in results {
            println!("{id:<10} {score:.4}");
        }
    }
}
