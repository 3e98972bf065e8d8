mod config;
mod crew;
mod errors;
mod llm_client;
mod routes;
mod state;
mod tailoring;
mod tools;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::crew::RunInputs;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tools::ResumeSource;

/// Resume tailoring crew: research a job posting, profile the candidate,
/// and produce a tailored resume plus interview materials.
#[derive(Parser)]
#[command(name = "resume-tailor")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Run one pipeline and write the artifacts to disk
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// URL of the job posting to tailor for
    #[arg(long)]
    job_posting_url: String,

    /// Candidate's GitHub profile URL
    #[arg(long)]
    github_url: String,

    /// Personal write-up, inline
    #[arg(long, conflicts_with = "writeup_file", required_unless_present = "writeup_file")]
    writeup: Option<String>,

    /// Personal write-up, read from a file
    #[arg(long)]
    writeup_file: Option<PathBuf>,

    /// Resume file (markdown, text or PDF)
    #[arg(long, default_value = "./fake_resume.md")]
    resume: PathBuf,

    /// Directory the tailored resume and interview materials are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-tailor v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Run(args) => run_once(config, args).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    let port = config.port;
    let state = AppState::from_config(config)?;
    info!(
        "Crew loaded: {} agents, {} tasks (model: {})",
        state.crew.agents.len(),
        state.crew.tasks.len(),
        state.llm.model_id()
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_once(mut config: Config, args: RunArgs) -> Result<()> {
    let personal_writeup = match (args.writeup, args.writeup_file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read write-up from {}", path.display()))?,
        (None, None) => anyhow::bail!("either --writeup or --writeup-file is required"),
    };

    config.artifact_dir = Some(args.output_dir);
    let state = AppState::from_config(config)?;

    let inputs = RunInputs {
        job_posting_url: args.job_posting_url,
        github_url: args.github_url,
        personal_writeup,
        resume: ResumeSource::Path(args.resume),
    };

    let application = tailoring::tailor(&state, inputs).await?;

    println!("{}", application.title);
    for result in application.result.results() {
        if let Some(path) = &result.artifact {
            println!("  {} -> {}", result.task, path.display());
        }
    }

    Ok(())
}
