use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pgrkam_core::config::{Config, Settings};
use pgrkam_core::data_processor::DataProcessor;
use pgrkam_core::types::PreferenceProfile;
use pgrkam_embed::get_default_embedder;
use pgrkam_rag::{classify_intent, detect_language, general_answer, Answer, AnswerSynthesizer, ChatCompletionsProvider, Language};
use pgrkam_recommend::{load_catalog, Recommender};
use pgrkam_vector::VectorStore;

#[derive(Parser, Debug)]
#[command(name = "pgrkam", about = "Portal assistant: grounded answers and job recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a question, grounded in the documents under --docs when given
    Ask {
        question: String,
        /// Directory of paged .txt documents and crawled .jsonl pages
        #[arg(long)]
        docs: Option<PathBuf>,
        /// Skip the knowledge base and ask the model directly
        #[arg(long)]
        no_kb: bool,
        /// Answer language (en, hi, pa); detected from the question by default
        #[arg(long)]
        lang: Option<String>,
    },
    /// Build the index over --docs and print its statistics
    IndexStats {
        #[arg(long)]
        docs: PathBuf,
    },
    /// Rank catalog jobs against the given preferences
    Recommend {
        /// Job catalog: `.csv` with a header row, else JSON Lines or a JSON array
        #[arg(long)]
        catalog: PathBuf,
        /// Comma-separated roles
        #[arg(long)]
        roles: Option<String>,
        #[arg(long)]
        sectors: Option<String>,
        #[arg(long)]
        locations: Option<String>,
        #[arg(long)]
        degree: Option<String>,
        #[arg(long)]
        experience: Option<String>,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pgrkam=debug")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;
    let settings = config.settings()?;
    tracing::debug!(env = config.env_name(), "configuration loaded");

    match cli.command {
        Command::Ask { question, docs, no_kb, lang } => ask(&settings, &question, docs.as_deref().filter(|_| !no_kb), lang.as_deref()),
        Command::IndexStats { docs } => index_stats(&settings, &docs),
        Command::Recommend { catalog, roles, sectors, locations, degree, experience, top_k } => {
            let defaults = PreferenceProfile::default();
            let prefs = PreferenceProfile::parse(
                roles.as_deref().unwrap_or(&defaults.roles.join(",")),
                sectors.as_deref().unwrap_or(&defaults.sectors.join(",")),
                locations.as_deref().unwrap_or(&defaults.locations.join(",")),
                degree.as_deref().unwrap_or(&defaults.degree),
                experience.as_deref().unwrap_or(&defaults.experience),
            );
            recommend(&settings, &catalog, &prefs, top_k.unwrap_or(settings.recommend.top_k))
        }
    }
}

fn build_store(settings: &Settings, docs: &Path) -> Result<VectorStore> {
    let processor = DataProcessor::with_configs(settings.chunking.document, settings.chunking.web);
    let chunks = processor.process_directory(docs).with_context(|| format!("failed to read documents from {}", docs.display()))?;
    let embedder = get_default_embedder(&settings.model_dir(), settings.embedding.max_len)?;
    let store = VectorStore::new(embedder).with_batch_size(settings.retrieval.embed_batch_size);
    store.build_chunks(chunks)?;
    Ok(store)
}

fn ask(settings: &Settings, question: &str, docs: Option<&Path>, lang: Option<&str>) -> Result<()> {
    let question = question.trim();
    if question.is_empty() { bail!("question must not be empty"); }
    let lang = match lang {
        Some(code) => Language::from_code(code).with_context(|| format!("unsupported language '{code}' (expected en, hi or pa)"))?,
        None => detect_language(question),
    };
    let intent = classify_intent(question);
    tracing::info!(%lang, %intent, "handling question");

    let provider = Arc::new(ChatCompletionsProvider::from_settings(&settings.llm)?);
    tracing::info!(model = provider.model(), "completion provider ready");
    let text = match docs {
        Some(dir) => {
            let store = Arc::new(build_store(settings, dir)?);
            let synth = AnswerSynthesizer::new(store, provider)
                .with_top_k(settings.retrieval.top_k)
                .with_citation_limit(settings.retrieval.citation_limit)
                .with_portal_url(&settings.portal.base_url);
            match synth.answer(question, lang)? {
                Answer::Refused(text) => text,
                Answer::Grounded { text, citations, .. } => {
                    tracing::debug!(?citations, "grounded answer");
                    text
                }
            }
        }
        None => general_answer(provider.as_ref(), question, lang)?,
    };

    println!("{text}");
    println!();
    println!("Intent: {intent}");
    println!("Portal: {}", intent.deep_link(&settings.portal.base_url));
    Ok(())
}

fn index_stats(settings: &Settings, docs: &Path) -> Result<()> {
    let store = build_store(settings, docs)?;
    let Some(stats) = store.stats() else { bail!("index was not built") };
    println!("chunks:     {}", stats.chunks);
    println!("dimension:  {}", stats.dim);
    println!("max tokens: {}", stats.max_tokens);
    println!("embedded:   {}", stats.embedded);
    println!("cache hits: {}", stats.cache_hits);
    println!("built at:   {}", stats.built_at.to_rfc3339());
    Ok(())
}

fn recommend(settings: &Settings, catalog: &Path, prefs: &PreferenceProfile, top_k: usize) -> Result<()> {
    prefs.validate()?;
    let rows = load_catalog(catalog)?;
    let embedder = get_default_embedder(&settings.model_dir(), settings.embedding.max_len)?;
    let recs = Recommender::new(embedder).recommend(&rows, prefs, top_k)?;
    if recs.is_empty() {
        println!("No jobs in the catalog.");
        return Ok(());
    }
    for (rank, rec) in recs.iter().enumerate() {
        let job = &rec.job;
        println!("{:>2}. [{:.3}] {} | {} | {}", rank + 1, rec.score, job.title, job.sector, job.location);
        if !job.url.is_empty() { println!("    {}", job.url); }
        if !job.deadline.is_empty() { println!("    deadline: {}", job.deadline); }
    }
    Ok(())
}
