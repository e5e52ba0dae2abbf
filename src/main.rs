use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use helpline::config::{self, Config};
use helpline::{Helpline, commands, ui};

#[derive(Parser)]
#[command(name = "helpline")]
#[command(version)]
#[command(about = "Empathetic helpline chat assistant", long_about = None)]
struct Cli {
    /// Directory holding config.toml, secrets.toml and logs
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// CSV file with example dialogues
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation (default)
    Chat {
        /// Line-mode chat on stdin/stdout instead of the full-screen UI
        #[arg(long)]
        plain: bool,
    },
    /// Send a single message and print the reply
    Ask { message: String },
    /// Print the few-shot system primer
    Primer,
    /// Write a default config file
    Init,
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn init_tracing(verbose: bool, target: LogTarget) -> Result<()> {
    let default_level = if verbose { "helpline=debug" } else { "helpline=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("❌ {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let home = cli.home.clone().unwrap_or_else(config::default_home);
    let mut config = Config::load_from(&home)?;
    if let Some(dataset) = cli.dataset {
        config.dataset.path = dataset;
    }

    let command = cli.command.unwrap_or(Commands::Chat { plain: false });
    let full_screen = matches!(command, Commands::Chat { plain: false }) && std::io::stdout().is_terminal();
    let log_target = if full_screen {
        LogTarget::File(config.log_dir().join("helpline.log"))
    } else {
        LogTarget::Stderr
    };
    init_tracing(cli.verbose, log_target)?;
    info!(home = %config.home.display(), "configuration loaded");

    match command {
        Commands::Init => commands::init_config(&config),
        Commands::Primer => commands::print_primer(&config),
        Commands::Ask { message } => {
            let helpline = Helpline::bootstrap(&config)?;
            commands::ask(&helpline, &message).await
        }
        Commands::Chat { .. } => {
            let helpline = Helpline::bootstrap(&config)?;
            let mut session = helpline.new_session();
            if full_screen {
                ui::run(session, config.ui.clone()).await
            } else {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                commands::plain_chat(&mut session, stdin, tokio::io::stdout()).await
            }
        }
    }
}
