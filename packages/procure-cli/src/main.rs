//! Developer CLI for the procurement AI library
//!
//! Wires the library to OpenAI and LlamaCloud from environment settings
//! (a `.env` file is honoured) so extraction agents, extractions and
//! comparisons can be exercised from a terminal.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use futures::StreamExt;
use procure_ai::{
    AiConfig, CallContext, ComparisonEngine, ComparisonProfile, DocumentExtractionPipeline,
    DocumentKind, ExtractionAgentRegistry, GenerationRequest, ProviderRegistry, SourceRecord,
    UploadedFile,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "procure")]
#[command(about = "Procurement document extraction and comparison")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured data from a document
    Extract {
        /// quote, rfq, fuel-bid, contract or invoice
        kind: DocumentKind,
        file: PathBuf,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Rank records from a JSON array file
    Compare {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Profile::Quotes)]
        profile: Profile,
        /// Generation provider; the registry default when omitted
        #[arg(long)]
        provider: Option<String>,
    },

    /// Create or update every built-in extraction agent
    SyncAgents,

    /// List generation providers and their availability
    Providers,

    /// Send a single prompt to a provider
    Generate {
        prompt: String,
        #[arg(long)]
        system: Option<String>,
        #[arg(long)]
        provider: Option<String>,
        /// Print deltas as they arrive
        #[arg(long)]
        stream: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Quotes,
    FuelBids,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,procure_ai=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AiConfig::from_env().context("Invalid configuration")?;
    tracing::debug!(model = %config.model, missing = ?config.missing(), "Configuration loaded");

    match cli.command {
        Commands::Extract {
            kind,
            file,
            content_type,
        } => cmd_extract(&config, kind, &file, content_type).await,
        Commands::Compare {
            file,
            profile,
            provider,
        } => cmd_compare(&config, &file, profile, provider.as_deref()).await,
        Commands::SyncAgents => cmd_sync_agents(&config).await,
        Commands::Providers => cmd_providers(&config).await,
        Commands::Generate {
            prompt,
            system,
            provider,
            stream,
        } => cmd_generate(&config, prompt, system, provider.as_deref(), stream).await,
    }
}

/// Context cancelled by Ctrl+C.
fn interruptible() -> CallContext {
    let ctx = CallContext::new();
    let token = ctx.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    ctx
}

async fn providers(config: &AiConfig) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new().with_defaults(config.generation_defaults());
    registry.register(Arc::new(config.openai_provider()?), true);
    registry.initialize().await;
    Ok(registry)
}

fn agent_registry(config: &AiConfig) -> Result<ExtractionAgentRegistry> {
    let service = config
        .extraction_service()
        .context("Extraction service is not configured")?;
    Ok(ExtractionAgentRegistry::new(Arc::new(service))
        .with_schema_sync(config.update_extractor_schema))
}

fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "doc" => Some("application/msword"),
        _ => None,
    }
}

async fn cmd_extract(
    config: &AiConfig,
    kind: DocumentKind,
    path: &Path,
    content_type: Option<String>,
) -> Result<()> {
    let specs = config.document_specs();
    let spec = specs
        .get(kind)
        .with_context(|| format!("No spec registered for {kind}"))?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("File name is not valid UTF-8")?;
    let content_type = content_type.or_else(|| guess_content_type(path).map(String::from));
    let upload = UploadedFile::new(filename, content_type, bytes);

    println!("{} {} with {}", "Extracting".bright_blue().bold(), filename, spec.name.cyan());

    let pipeline = DocumentExtractionPipeline::new(Arc::new(agent_registry(config)?));
    match pipeline.extract_with(&upload, spec, &interruptible()).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result.data)?);
            println!(
                "{} {} pages, {} output tokens",
                "✓".bright_green(),
                result.usage.pages,
                result.usage.output_tokens
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".bright_red(), e.user_message(&spec.label));
            Err(e).context("Extraction failed")
        }
    }
}

async fn cmd_compare(
    config: &AiConfig,
    path: &Path,
    profile: Profile,
    provider: Option<&str>,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw).context("Records file is not JSON")?;
    let serde_json::Value::Array(items) = value else {
        bail!("Records file must contain a JSON array");
    };
    let records: Vec<SourceRecord> = items.into_iter().map(SourceRecord::from_json).collect();

    let profile = match profile {
        Profile::Quotes => ComparisonProfile::quotes(),
        Profile::FuelBids => ComparisonProfile::fuel_bids(),
    };
    let adapter = providers(config).await?.adapter(provider)?;
    let engine = ComparisonEngine::new(adapter).with_profile(profile);

    let result = engine.compare_with(&records, &interruptible()).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    println!();
    println!(
        "{} {} ({:.0}% confidence)",
        "Winner:".bright_yellow().bold(),
        result.winner.id.bright_green(),
        result.winner.confidence * 100.0
    );
    println!("  {}", result.winner.reason.dimmed());
    Ok(())
}

async fn cmd_sync_agents(config: &AiConfig) -> Result<()> {
    let registry = agent_registry(config)?;
    let specs = config.document_specs();

    let report = registry.sync_all(specs.all()).await;

    for (name, outcome) in &report.outcomes {
        println!("  {} {} {}", "✓".bright_green(), name, outcome.to_string().dimmed());
    }
    for (name, err) in &report.failures {
        println!("  {} {} {}", "✗".bright_red(), name, err.to_string().red());
    }

    if !report.is_clean() {
        bail!("{} agent(s) failed to sync", report.failures.len());
    }
    Ok(())
}

async fn cmd_providers(config: &AiConfig) -> Result<()> {
    let registry = providers(config).await?;

    for info in registry.providers() {
        let status = if info.available {
            "available".bright_green()
        } else {
            "unavailable".bright_red()
        };
        let marker = if info.is_default { " (default)" } else { "" };
        println!("  {}{} {}", info.name.bold(), marker, status);
    }
    Ok(())
}

async fn cmd_generate(
    config: &AiConfig,
    prompt: String,
    system: Option<String>,
    provider: Option<&str>,
    stream: bool,
) -> Result<()> {
    let adapter = providers(config).await?.adapter(provider)?;
    let mut request = GenerationRequest::prompt(prompt);
    request.system = system;

    if !stream {
        let result = adapter
            .generate_with(None, request, &interruptible())
            .await
            .context("Generation failed")?;
        println!("{}", result.content);
        println!("{}", format!("{} tokens, {}", result.usage.total_tokens, result.model).dimmed());
        return Ok(());
    }

    let mut results = adapter.stream_generate_with(None, request, interruptible());
    let mut printed = 0;
    let mut stdout = std::io::stdout();
    while let Some(result) = results.next().await {
        let result = result.context("Generation stream failed")?;
        print!("{}", &result.content[printed..]);
        stdout.flush()?;
        printed = result.content.len();

        if result.is_final {
            println!();
            let footer = format!("{} tokens, {}", result.usage.total_tokens, result.model);
            println!("{}", footer.dimmed());
        }
    }
    Ok(())
}
