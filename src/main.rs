use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use estimator::{
    constants,
    prompt::build_estimate_prompt,
    web_server::{self, AppState},
    ChatClient, ChatConfig, Estimator, ProjectSpec,
};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web UI.
    Serve {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
    },
    /// Print the prompt built from a project spec without calling the API.
    Prompt {
        #[arg(long, help = "Path to a project spec JSON file.")]
        file: PathBuf,
    },
    /// Ask the model for an estimate of a project spec.
    Estimate {
        #[arg(long, help = "Path to a project spec JSON file.")]
        file: PathBuf,
    },
    /// Ask the model for a quotation.
    Quote,
}

fn read_spec(path: &Path) -> Result<ProjectSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project spec {}", path.display()))?;
    let spec: ProjectSpec = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse project spec {}", path.display()))?;
    Ok(spec.normalized())
}

fn build_estimator() -> Result<Estimator> {
    let client = ChatClient::new(ChatConfig::from_env()).context("Failed to create chat client")?;
    info!(model = client.model(), "Chat client ready");
    Ok(Estimator::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for OPENAI_API_KEY and friends)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,estimator=debug).
    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("Estimator starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Serve { port } => {
            let state = AppState::new(build_estimator()?, constants::TEMPLATES_DIR.as_str());
            let static_dir = constants::STATIC_DIR.clone();

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(port, state, static_dir).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down...");
                    web_server_handle.abort();
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Prompt { file } => {
            let spec = read_spec(&file)?;
            println!("{}", build_estimate_prompt(&spec));
        }
        Commands::Estimate { file } => {
            let spec = read_spec(&file)?;
            let estimate = build_estimator()?
                .try_estimate(&spec)
                .await
                .context("Estimate request failed")?;
            println!("{}", estimate.headline);
            for item in &estimate.breakdown {
                if item.value.is_empty() {
                    println!("{}", item.label);
                } else {
                    println!("{}: {}", item.label, item.value);
                }
            }
        }
        Commands::Quote => {
            let quotation = build_estimator()?
                .try_quotation()
                .await
                .context("Quotation request failed")?;
            println!("{}", quotation);
        }
    }

    Ok(())
}
