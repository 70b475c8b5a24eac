use std::{path::Path, sync::Arc};

use {
    anyhow::Result,
    cibot_channels::RecordingOutbound,
    cibot_common::Lifecycle,
    cibot_config::{BotConfig, Severity, ValidationResult, validate},
    cibot_dispatch::{Bot, BotOptions},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Validate `config`, then load every plugin it enables and list the
/// commands they register. Exits with status 1 on validation errors.
pub async fn run(path: &Path, config: BotConfig, verbose: bool) -> Result<()> {
    eprintln!("Checking {}\n", path.display());

    let result = validate(&config);
    report(&result, verbose);
    if result.has_errors() {
        std::process::exit(1);
    }

    let options = BotOptions {
        loops: false,
        ..BotOptions::default()
    };
    let trigger = config.command_trigger.clone();
    let bot = Bot::bootstrap(
        config,
        Arc::new(RecordingOutbound::new()),
        Lifecycle::new(),
        options,
    )
    .await?;

    let registry = bot.registry();
    eprintln!("\n{BOLD}Plugins{RESET}: {}", registry.plugin_names().join(", "));
    eprintln!("{BOLD}Commands{RESET}:");
    for command in registry.commands() {
        match registry.help_for(command) {
            Some(help) => eprintln!("  {trigger}{command}  {help}"),
            None => eprintln!("  {trigger}{command}"),
        }
    }
    Ok(())
}

fn report(result: &ValidationResult, verbose: bool) {
    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
}
