use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::commands::search_commands::{self, SearchOutcome};
use crate::commands::session_commands;
use crate::config::{AppConfig, ProviderKind};
use crate::error::AppError;
use crate::models::candidate::Candidate;
use crate::models::facet::{BaseColour, Category, FacetFilter, Gender};
use crate::models::image_ref::ImageReference;
use crate::services::embedding_service;
use crate::state::AppState;

const PREVIEW_VALUES: usize = 5;
const THUMBNAIL_SIZE: u32 = 400;

#[derive(Debug, Parser)]
#[command(name = "lookalike", version, about = "Find visually similar products")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "LOOKALIKE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute the embedding of an image URL or local file
    Embed {
        /// http(s) URL or path to a local image
        target: String,

        /// Override the configured provider
        #[arg(long)]
        provider: Option<ProviderKind>,
    },
    /// Search the catalog for products similar to an image
    Search(SearchArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub url: Option<String>,

    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long)]
    pub gender: Option<Gender>,

    #[arg(long)]
    pub colour: Option<BaseColour>,

    #[arg(long)]
    pub category: Option<Category>,

    /// Minimum similarity percentage (0 disables the floor)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_similarity: u8,

    /// Print the session snapshot as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    fn facets(&self) -> FacetFilter {
        FacetFilter {
            gender: self.gender,
            base_colour: self.colour,
            category: self.category,
            ..Default::default()
        }
        .with_similarity_floor(self.min_similarity)
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    crate::init_logging(&config.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Command::Embed { target, provider } => embed(config, &target, provider).await,
            Command::Search(args) => search(config, args).await,
        }
    })
}

fn is_remote(target: &str) -> bool {
    let lower = target.trim_start().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

async fn embed(
    mut config: AppConfig,
    target: &str,
    provider: Option<ProviderKind>,
) -> anyhow::Result<()> {
    if let Some(kind) = provider {
        config.embedding.provider = kind;
    }
    let image = if is_remote(target) {
        ImageReference::remote(target)?
    } else {
        ImageReference::from_path(Path::new(target))
            .with_context(|| format!("failed to read image {target}"))?
    };

    let provider = embedding_service::build_provider(&config)?;
    info!(provider = provider.name(), image = %image.describe(), "embedding image");
    let vector = provider.embed(&image).await?;

    let preview: Vec<String> = vector
        .as_slice()
        .iter()
        .take(PREVIEW_VALUES)
        .map(|v| format!("{v:.6}"))
        .collect();
    println!("provider:   {}", provider.name());
    println!("dimensions: {}", vector.len());
    println!("preview:    [{}, ...]", preview.join(", "));
    Ok(())
}

async fn search(config: AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    match (&args.url, &args.file) {
        (Some(url), _) => session_commands::set_image_url(&state, url.clone())?,
        (None, Some(path)) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read image {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            session_commands::set_image_file(&state, bytes, filename)?;
        }
        (None, None) => anyhow::bail!("pass --url or --file"),
    }

    let facets = args.facets();
    let restricted = !facets.is_unrestricted();
    session_commands::update_facets(&state, facets);

    match search_commands::search(&state).await? {
        SearchOutcome::Applied(candidates) => {
            info!(count = candidates.len(), "search complete");
        }
        SearchOutcome::Superseded => anyhow::bail!("search was superseded"),
    }
    if restricted {
        refine_results(&state)?;
    }

    let snapshot = session_commands::snapshot(&state);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    if let Some(message) = &snapshot.message {
        println!("{message}");
    }
    for candidate in &snapshot.displayed {
        print_candidate(candidate);
    }
    Ok(())
}

fn refine_results(state: &AppState) -> Result<(), AppError> {
    match search_commands::apply_filters(state) {
        // The no-match hint is already stored as the session message.
        Ok(_) | Err(AppError::EmptyResult) => Ok(()),
        Err(err) => Err(err),
    }
}

fn print_candidate(candidate: &Candidate) {
    println!(
        "{:>3}%  {:<15}  {}",
        candidate.similarity_percent(),
        candidate.match_quality(),
        candidate.display_name
    );
    println!(
        "      {} / {} / {}",
        candidate.gender, candidate.base_colour, candidate.master_category
    );
    println!(
        "      {}",
        candidate.thumbnail_url(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    );
}
