// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Sigprobe - Signature Scanner CLI
 * Operator tooling for signature sets and scan plans
 *
 * Features:
 * - Validate a directory of YAML signatures
 * - Dry-run the job plan for a captured request
 *
 * No probes are sent from this binary.
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sigprobe_scanner::config::{load_signature_dir, ConfigFormat, ConfigLoader, ScannerConfig};
use sigprobe_scanner::errors::JobError;
use sigprobe_scanner::exchange::RawExchange;
use sigprobe_scanner::runner::{Job, JobContext, JobRunner};
use sigprobe_scanner::scanner::Scanner;
use sigprobe_scanner::signature::SignatureId;
use sigprobe_scanner::types::{Confidence, Severity};

/// Sigprobe - signature-driven scan planning
#[derive(Parser)]
#[command(name = "sigprobe")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Validate signature sets and preview scan plans", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (yaml, toml or json)
    #[arg(short, long, global = true, env = "SIGPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Config file format, when the extension does not tell
    #[arg(long, global = true, value_enum)]
    config_format: Option<ConfigFormatArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormatArg {
    Yaml,
    Toml,
    Json,
}

impl From<ConfigFormatArg> for ConfigFormat {
    fn from(arg: ConfigFormatArg) -> Self {
        match arg {
            ConfigFormatArg::Yaml => ConfigFormat::Yaml,
            ConfigFormatArg::Toml => ConfigFormat::Toml,
            ConfigFormatArg::Json => ConfigFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every signature in a directory and list the result
    Validate {
        /// Directory of .yaml/.yml signature files
        #[arg(short, long)]
        signatures: PathBuf,
    },

    /// Print the jobs a scan would dispatch, as JSON
    Plan {
        /// Directory of .yaml/.yml signature files
        #[arg(short, long)]
        signatures: PathBuf,

        /// File holding the raw captured HTTP request
        #[arg(short, long)]
        request: PathBuf,

        /// File holding the raw captured HTTP response
        #[arg(long)]
        response: Option<PathBuf>,

        /// Override the URL derived from the request
        #[arg(short, long)]
        url: Option<String>,

        /// Signature ids to plan; all loaded signatures when omitted
        #[arg(short, long, value_delimiter = ',')]
        ids: Vec<SignatureId>,
    },
}

/// Stands in for a real runner; this binary only plans
struct DryRunRunner;

#[async_trait::async_trait]
impl JobRunner for DryRunRunner {
    async fn run(&self, job: Job, _ctx: JobContext) -> Result<(), JobError> {
        Err(JobError::Other(format!("dry run, not probing {}", job.url)))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match (&cli.config, cli.config_format) {
        (Some(path), Some(format)) => ConfigLoader::with_format(path, format.into()).load_config()?,
        (Some(path), None) => ConfigLoader::new(path)?.load_config()?,
        (None, _) => ScannerConfig::default(),
    };

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { signatures } => validate(&signatures, config),
        Commands::Plan {
            signatures,
            request,
            response,
            url,
            ids,
        } => plan(&signatures, &request, response.as_deref(), url, ids, config),
    }
}

fn load_scanner(dir: &Path, config: ScannerConfig) -> Result<Scanner> {
    let signatures = load_signature_dir(dir)?;
    Scanner::builder(Arc::new(DryRunRunner))
        .with_config(config)
        .build(&signatures)
        .with_context(|| format!("Failed to load signatures from {:?}", dir))
}

fn validate(dir: &Path, config: ScannerConfig) -> Result<()> {
    let scanner = load_scanner(dir, config)?;
    let store = scanner.store();

    let listing: Vec<_> = store
        .ids()
        .into_iter()
        .filter_map(|id| store.lookup(id))
        .map(|signature| {
            serde_json::json!({
                "id": signature.id,
                "name": signature.name(),
                "type": signature.kind.as_str(),
                "severity": Severity::from_risk(&signature.info.risk),
                "confidence": Confidence::from_label(&signature.info.confidence),
                "requests": signature.requests.len(),
            })
        })
        .collect();

    info!("{} signatures are valid", listing.len());
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn plan(
    dir: &Path,
    request: &Path,
    response: Option<&Path>,
    url: Option<String>,
    ids: Vec<SignatureId>,
    config: ScannerConfig,
) -> Result<()> {
    let scanner = load_scanner(dir, config)?;

    let raw_request = std::fs::read(request)
        .with_context(|| format!("Failed to read request file: {:?}", request))?;
    let mut exchange = RawExchange::new(raw_request);
    if let Some(path) = response {
        let raw_response = std::fs::read(path)
            .with_context(|| format!("Failed to read response file: {:?}", path))?;
        exchange = exchange.with_response(raw_response);
    }
    if let Some(url) = url {
        exchange = exchange.with_url(url);
    }

    let ids = if ids.is_empty() { scanner.store().ids() } else { ids };
    debug!("Planning {} signatures", ids.len());

    let jobs = scanner
        .plan(&[exchange], &ids)
        .context("Failed to build scan plan")?;

    info!(
        "{} jobs planned (concurrency {})",
        jobs.len(),
        scanner.config().concurrency
    );
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}
