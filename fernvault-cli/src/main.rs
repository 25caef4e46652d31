//! fernvault: command-line front-end for a Fernvault encryption server
//!
//! Commands:
//!   generate-key            - ask the server for a fresh key
//!   validate-key <KEY>      - check a key locally, optionally with the server
//!   encrypt <FILE> --key K  - upload a file for encryption and save the result
//!   decrypt <FILE> --key K  - upload a file for decryption and save the result

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fernvault_client::api_client::FernvaultApi;
use fernvault_client::download::DirectorySink;
use fernvault_client::key;
use fernvault_client::notify::{Alert, Severity};
use fernvault_client::selection::{AreaEvent, AreaUpdate, UploadArea, file_from_path};
use fernvault_client::submission::SubmissionController;
use fernvault_client::ui::UiState;
use fernvault_client::{ClientConfig, Delivered, Operation};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fernvault",
    version,
    about = "Encrypt and decrypt files through a Fernvault server"
)]
struct Cli {
    /// Path to a fernvault.toml configuration file
    #[arg(long, short = 'c', env = "FERNVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Server base URL (overrides config)
    #[arg(long, env = "FERNVAULT_API")]
    api: Option<String>,

    /// Directory for downloaded results (overrides config)
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// Upload limit in MiB (overrides config)
    #[arg(long)]
    max_upload_mb: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the server for a new 44-character key
    GenerateKey,

    /// Check a key's format; with --remote also ask the server
    ValidateKey {
        key: String,
        #[arg(long)]
        remote: bool,
    },

    /// Encrypt a file
    Encrypt(SubmitArgs),

    /// Decrypt a file
    Decrypt(SubmitArgs),
}

#[derive(clap::Args, Debug)]
struct SubmitArgs {
    /// File to upload
    file: PathBuf,

    /// 44-character URL-safe base64 key
    #[arg(long, short = 'k', env = "FERNVAULT_KEY", hide_env_values = true, default_value = "")]
    key: String,

    /// Do not fetch the result when the server only returns a download link
    #[arg(long)]
    no_follow: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    debug!("using server {}", config.api_base_url);

    let ok = match cli.command {
        Commands::GenerateKey => cmd_generate_key(config).await?,
        Commands::ValidateKey { key, remote } => cmd_validate_key(config, &key, remote).await?,
        Commands::Encrypt(args) => cmd_submit(config, Operation::Encrypt, args).await?,
        Commands::Decrypt(args) => cmd_submit(config, Operation::Decrypt, args).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Config file (if any), then flag overrides.
fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(api) = &cli.api {
        config.api_base_url = api.clone();
    }
    if let Some(out) = &cli.out {
        config.download_dir = out.clone();
    }
    if let Some(mb) = cli.max_upload_mb {
        config.max_upload_bytes = mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("--max-upload-mb {mb} is too large"))?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn controller(config: ClientConfig) -> Result<SubmissionController<DirectorySink>> {
    let ui = Arc::new(UiState::new(&config));
    let sink = DirectorySink::new(config.download_dir.clone());
    let api = FernvaultApi::new(config).context("building HTTP client")?;
    Ok(SubmissionController::new(api, ui, sink))
}

// ── `fernvault generate-key` ──────────────────────────────────────────────────

async fn cmd_generate_key(config: ClientConfig) -> Result<bool> {
    let controller = controller(config)?;
    let mut alerts = controller.ui().notifications().subscribe();

    let key = controller.generate_key().await;
    print_alerts(&mut alerts);
    match key {
        Some(key) => {
            println!("{key}");
            Ok(true)
        }
        None => Ok(false),
    }
}

// ── `fernvault validate-key` ──────────────────────────────────────────────────

async fn cmd_validate_key(config: ClientConfig, candidate: &str, remote: bool) -> Result<bool> {
    if let Err(e) = key::validate(candidate) {
        eprintln!("invalid: {e}");
        return Ok(false);
    }
    if !remote {
        println!("valid");
        return Ok(true);
    }

    let api = FernvaultApi::new(config).context("building HTTP client")?;
    let confirmation = api
        .confirm_key(candidate)
        .await
        .context("asking the server to validate the key")?;
    match (confirmation.valid, confirmation.message) {
        (true, _) => println!("valid (confirmed by server)"),
        (false, Some(message)) => eprintln!("rejected by server: {message}"),
        (false, None) => eprintln!("rejected by server"),
    }
    Ok(confirmation.valid)
}

// ── `fernvault encrypt` / `fernvault decrypt` ─────────────────────────────────

async fn cmd_submit(config: ClientConfig, operation: Operation, args: SubmitArgs) -> Result<bool> {
    let mut area = UploadArea::new(config.max_upload_bytes);
    let controller = controller(config)?;
    let ui = controller.ui().clone();
    let mut alerts = ui.notifications().subscribe();

    let file = file_from_path(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    match area.handle(AreaEvent::PickerChanged(vec![file])) {
        AreaUpdate::Committed(panel) => {
            eprintln!("{}  [{}]", panel.headline, panel.type_line);
        }
        AreaUpdate::Rejected(err) => {
            ui.notifications()
                .notify(err.alert_message(operation), Severity::Error);
            print_alerts(&mut alerts);
            return Ok(false);
        }
        AreaUpdate::Highlight(_) | AreaUpdate::Ignored => {}
    }

    let bar = make_progress_bar(operation)?;
    let renderer = spawn_progress_renderer(&ui, bar.clone());

    let mut result = controller.submit(operation, area.selected(), &args.key).await;
    if let Ok(Delivered::Link { url, .. }) = &result
        && !args.no_follow
    {
        let url = url.clone();
        result = controller.follow_link(operation, &url).await;
    }

    renderer.abort();
    bar.finish_and_clear();
    print_alerts(&mut alerts);

    match result {
        Ok(Delivered::Saved { path, .. }) => {
            println!("{}", path.display());
            Ok(true)
        }
        Ok(Delivered::Link { url, .. }) => {
            println!("{url}");
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

// ── Rendering helpers ─────────────────────────────────────────────────────────

fn print_alerts(alerts: &mut broadcast::Receiver<Alert>) {
    while let Ok(alert) = alerts.try_recv() {
        let prefix = match alert.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        eprintln!("{prefix}: {}", alert.message);
    }
}

fn make_progress_bar(operation: Operation) -> Result<ProgressBar> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}%")?
            .progress_chars("=>-"),
    );
    pb.set_prefix(format!("{}ing", operation.verb()));
    Ok(pb)
}

fn spawn_progress_renderer(ui: &UiState, pb: ProgressBar) -> tokio::task::JoinHandle<()> {
    let mut rx = ui.progress().subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = *rx.borrow();
            if state.visible {
                pb.set_position(u64::from(state.percent));
            }
        }
    })
}
