use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fabi_core::{commands::Outcome, config::Config, App, Exit};

#[derive(Parser, Debug)]
#[command(name = "fabi")]
#[command(about = "AT-command driven button core of the FABI assistive input device")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/fabi/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run an AT command and exit (repeatable)
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    commands: Vec<String>,

    /// Print the bindings of the active slot and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Replies go to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if cli.list {
        let app = App::new(config)?;
        let dispatcher = app.input().dispatcher();
        println!("Slot: {}", dispatcher.settings().slot_name);
        for line in dispatcher.table().describe() {
            println!("{}", line);
        }
        return Ok(());
    }

    if !cli.commands.is_empty() {
        let mut app = App::new(config)?;
        if app.run_commands(&cli.commands) == Outcome::Reboot {
            info!("Reboot requested");
        }
        app.shutdown();
        return Ok(());
    }

    info!("Starting {}", config.device.name);

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let mut app = App::new(config.clone())?;

        let result = tokio::select! {
            result = app.run(&mut lines) => result,
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                Ok(Exit::Eof)
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                Ok(Exit::Eof)
            }
        };

        // Always run shutdown
        app.shutdown();

        match result? {
            Exit::Reboot => info!("Rebooting"),
            Exit::Eof => return Ok(()),
        }
    }
}
