use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "dbagent")]
#[command(about = "Turns a natural-language feature request into schema, route and component edits", long_about = None)]
struct Cli {
    #[arg(help = "Feature request; prompted for when omitted", trailing_var_arg = true)]
    query: Vec<String>,

    #[arg(long, help = "Write every file without asking")]
    yes: bool,

    #[arg(long, help = "Preview the plan without writing files")]
    dry_run: bool,

    #[arg(long, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, default_value = ".", help = "Project root")]
    root: PathBuf,

    #[arg(long, help = "Override the model named in dbagent.yml")]
    model: Option<String>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn ask_for_query() -> Result<String> {
    print!("What database feature would you like to implement? ");
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read user input")?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Ignoring unreadable .env: {}", e);
        }
    }

    let mut query = cli.query.join(" ").trim().to_string();
    if query.is_empty() {
        query = ask_for_query()?;
    }
    if query.is_empty() {
        anyhow::bail!("No feature request given");
    }

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
        auto_yes: cli.yes,
        root: cli.root,
        model: cli.model,
    };

    cli::run(&query, &config).await
}
