mod check;
mod console;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    cibot_config::BotConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "cibot", about = "cibot, a plugin-driven chat bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./cibot.yaml and ~/.config/cibot/).
    #[arg(short, long, global = true, env = "CIBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the bot from the terminal (default when no subcommand is provided).
    Console,
    /// Validate the configuration and list the commands it registers.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

/// `logging.debug` in the config lowers the default filter; `RUST_LOG` still
/// wins over both.
fn init_telemetry(cli: &Cli, debug: bool) {
    let level = if debug {
        "debug"
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Parse the config without validating it, so `check` can report problems.
fn read_config(path: Option<&Path>) -> anyhow::Result<(PathBuf, BotConfig)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => cibot_config::find_config_file().ok_or(cibot_config::Error::NotFound)?,
    };
    let config = cibot_config::load_config(&path)?;
    Ok((path, config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = read_config(cli.config.as_deref());
    init_telemetry(&cli, loaded.as_ref().is_ok_and(|(_, c)| c.logging.debug));
    info!(version = env!("CARGO_PKG_VERSION"), "cibot starting");

    let (path, config) = loaded?;
    info!(path = %path.display(), "loaded configuration");

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Console => console::run(&path, config).await,
        Commands::Check { verbose } => check::run(&path, config, verbose).await,
    }
}
