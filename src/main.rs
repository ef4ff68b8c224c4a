//! prompt-enhancer - enhancement service and terminal front-end

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prompt_enhancer::config::{Backend, CliOverrides, EnhancerConfig, ServiceConfig};
use prompt_enhancer::enhancer::OperationContext;
use prompt_enhancer::interactive::{
    spawn_interrupt_handler, CommandOutcome, Disposition, Document, InteractiveEnhancer,
    JsonFileStore, KeyValueStore, MemoryStore, TerminalProgress, TerminalWorkbench,
};
use prompt_enhancer::server;

/// How long a blocked terminal prompt may ignore Ctrl+C before the process exits
const INTERRUPT_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "prompt-enhancer")]
#[command(about = "Rewrite raw prompts into clearer, structured prompts")]
struct Cli {
    #[command(flatten)]
    upstream: UpstreamArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct UpstreamArgs {
    /// OpenAI API key (defaults to OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Completion API base URL (defaults to OPENAI_BASE_URL or https://api.openai.com)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Maximum output tokens
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Upstream request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP enhancement service
    Serve {
        /// Port to listen on (defaults to PORT or 3000)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Enhance a prompt from the terminal
    Enhance(EnhanceArgs),
}

#[derive(ClapArgs, Debug)]
struct EnhanceArgs {
    /// Prompt text; read from the file selection or stdin when omitted
    prompt: Option<String>,

    /// File to treat as the editor document
    #[arg(long)]
    file: Option<PathBuf>,

    /// Selected lines of --file, as START:END (1-based, inclusive)
    #[arg(long, requires = "file", value_parser = parse_line_range)]
    lines: Option<(usize, usize)>,

    /// Require a selection, like the "enhance selection" command
    #[arg(long)]
    selection_only: bool,

    /// What to do with the result: replace, new-doc or copy
    #[arg(long)]
    action: Option<Disposition>,

    /// Do not open new documents in the default viewer
    #[arg(long)]
    no_open: bool,

    /// Backend: direct (call OpenAI) or service (proxy through a running service)
    #[arg(long)]
    backend: Option<Backend>,

    /// Enhancement service URL for the service backend
    #[arg(long)]
    service_url: Option<String>,
}

fn parse_line_range(s: &str) -> Result<(usize, usize), String> {
    let (start, end) = match s.split_once(':') {
        Some((start, end)) => (start, end),
        None => (s, s),
    };
    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid start line: {}", e))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid end line: {}", e))?;
    Ok((start, end))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Keep stdout free for command output
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = dotenv::dotenv() {
        if !e.not_found() {
            warn!("Failed to load .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    let overrides = CliOverrides {
        api_key: cli.upstream.api_key,
        base_url: cli.upstream.base_url,
        model: cli.upstream.model,
        max_tokens: cli.upstream.max_tokens,
        timeout_secs: cli.upstream.timeout,
        ..Default::default()
    };

    match cli.command {
        Command::Serve { port } => {
            let config = EnhancerConfig::from_env()?.with_overrides(overrides)?;
            let mut service = ServiceConfig::from_env()?;
            if let Some(port) = port {
                service.port = port;
            }
            server::run(config, service).await
        }
        Command::Enhance(args) => {
            let overrides = CliOverrides {
                backend: args.backend,
                service_url: args.service_url.clone(),
                ..overrides
            };
            let config = EnhancerConfig::from_env()?.with_overrides(overrides)?;
            run_enhance(config, args).await
        }
    }
}

async fn run_enhance(config: EnhancerConfig, args: EnhanceArgs) -> Result<()> {
    if args.action.is_none() && !std::io::stdin().is_terminal() {
        return Err(anyhow!(
            "--action is required when stdin is not a terminal"
        ));
    }

    let document = match &args.file {
        Some(path) => Some(Document::open(path, args.lines)?),
        None => None,
    };

    let mut workbench = TerminalWorkbench::new(document)
        .with_disposition(args.action)
        .with_open_documents(!args.no_open);

    let enhancer = InteractiveEnhancer::new(config)?;

    let mut store: Box<dyn KeyValueStore> = match JsonFileStore::default_path() {
        Some(path) => match JsonFileStore::open(&path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!("{}; welcome state will not persist", e);
                Box::new(MemoryStore::new())
            }
        },
        None => Box::new(MemoryStore::new()),
    };
    enhancer.activate(store.as_mut(), &mut workbench);

    // Ctrl+C during the API call cancels it; during a terminal prompt it exits
    let cancel = CancellationToken::new();
    let ctrl_c = spawn_interrupt_handler(
        tokio::signal::ctrl_c(),
        cancel.clone(),
        INTERRUPT_GRACE,
        || std::process::exit(130),
    );

    let progress = TerminalProgress;
    let ctx = OperationContext::new(cancel, &progress);

    let outcome = match args.prompt {
        Some(prompt) => enhancer.enhance_text(&mut workbench, &prompt, &ctx).await,
        None if args.selection_only => enhancer.enhance_selection(&mut workbench, &ctx).await,
        None => enhancer.enhance_prompt(&mut workbench, &ctx).await,
    };
    ctrl_c.abort();

    match outcome {
        CommandOutcome::Failed(e) => Err(anyhow!(e)),
        CommandOutcome::ApplyFailed(e) => Err(anyhow!(e)),
        CommandOutcome::NotConfigured => Err(anyhow!("OpenAI API key not configured")),
        _ => Ok(()),
    }
}
