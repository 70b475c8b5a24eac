//! Mock transport: the terminal plays user `console` in channel `mock`.
//!
//! Replies are printed instead of sent, plugin loops are not started, and
//! `@mockbot` in the input addresses the bot.

use std::{
    io::Write as _,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::{
        Attachment, BotIdentity, ChannelOutbound, InboundEvent, Sender, mention_token,
    },
    cibot_common::Lifecycle,
    cibot_config::BotConfig,
    cibot_dispatch::{Bot, BotOptions, RunningBot},
    secrecy::Secret,
    tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    tracing::{info, warn},
};

const BOT_ID: &str = "mockbot";
const USER: &str = "console";
const CHANNEL: &str = "mock";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const BANNER: &str = "\
################################################################################
## You are in mock mode. Talk to the bot as if in a private message.         ##
## Replies are printed here instead of being sent. Use '@mockbot' to mention. ##
## Set logging.debug to true in your config for more verbosity.              ##
## ^D to quit. Type 'help' to reprint this message.                          ##
################################################################################";

/// Prints every outbound call to stdout.
#[derive(Default)]
pub struct ConsoleOutbound {
    uploads: AtomicU64,
}

#[async_trait]
impl ChannelOutbound for ConsoleOutbound {
    async fn send_message(
        &self,
        _channel: &str,
        text: &str,
        attachments: &[Attachment],
        as_action: bool,
    ) -> cibot_channels::Result<()> {
        println!("---");
        println!("{}", render_message(text, attachments, as_action));
        Ok(())
    }

    async fn send_file(
        &self,
        _channel: &str,
        title: &str,
        filetype: &str,
        content: &str,
    ) -> cibot_channels::Result<Option<String>> {
        let n = self.uploads.fetch_add(1, Ordering::Relaxed) + 1;
        println!("---");
        println!(
            "\u{1F4AC} {BOLD}{BOT_ID}{RESET} uploaded {BOLD}{title}{RESET} ({filetype}, {} bytes)",
            content.len()
        );
        Ok(Some(format!("F{n}")))
    }
}

fn render_message(text: &str, attachments: &[Attachment], as_action: bool) -> String {
    let body = if text.is_empty() && attachments.is_empty() {
        "<no response>"
    } else {
        text
    };
    let mut out = if as_action {
        format!("\u{1F4AC} {BOLD}* {BOT_ID} {YELLOW}{body}{RESET}")
    } else {
        format!("\u{1F4AC} {BOLD}{BOT_ID}: {YELLOW}{body}{RESET}")
    };
    for attachment in attachments {
        if let Some(title) = &attachment.title {
            out.push_str(&format!("\n   {BOLD}{title}{RESET}"));
            if let Some(link) = &attachment.title_link {
                out.push_str(&format!(" <{link}>"));
            }
        }
        if let Some(text) = &attachment.text {
            out.push_str(&format!("\n   {text}"));
        }
        for field in &attachment.fields {
            out.push_str(&format!("\n   {}: {}", field.title, field.value));
        }
    }
    out
}

/// `@mockbot` becomes the bot's mention token.
fn to_event(line: &str) -> InboundEvent {
    InboundEvent::new(
        CHANNEL,
        Sender::new(USER).with_display_name(USER),
        line.replace("@mockbot", &mention_token(BOT_ID)),
    )
}

fn prompt() {
    print!("{GREEN}{BOLD}[{USER}@{CHANNEL}{RESET} {BOLD}cibot{GREEN}]{RESET} \u{1F5E8} ");
    if let Err(e) = std::io::stdout().flush() {
        warn!(error = %e, "failed to flush prompt");
    }
}

/// Bootstrap the bot against the terminal and start it.
async fn start(mut config: BotConfig, outbound: Arc<dyn ChannelOutbound>) -> Result<RunningBot> {
    if config.token().is_none() {
        config.slack_token = Some(Secret::new("mock".into()));
    }
    let options = BotOptions {
        loops: false,
        ..BotOptions::default()
    };
    let bot = Bot::bootstrap(config, outbound, Lifecycle::new(), options).await?;
    Ok(bot.start(BotIdentity::new(BOT_ID, BOT_ID)))
}

/// Feed terminal lines to `running` until EOF or shutdown. Returns `false`
/// on EOF.
async fn chat<R>(running: &RunningBot, lines: &mut Lines<R>) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        prompt();
        let line = tokio::select! {
            biased;
            () = running.lifecycle().cancelled() => return Ok(true),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            println!();
            return Ok(false);
        };
        match line.trim() {
            "" => {},
            "help" => println!("{BANNER}"),
            text => {
                running.handle_event(&to_event(text)).await;
            },
        }
    }
}

/// Chat with the bot until EOF or shutdown. A restart reloads the config
/// from `path` and bootstraps again, keeping the same terminal session.
pub async fn run(path: &Path, mut config: BotConfig) -> Result<()> {
    let outbound: Arc<dyn ChannelOutbound> = Arc::new(ConsoleOutbound::default());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let running = start(config, Arc::clone(&outbound)).await?;
        info!("mock initialization complete, launching console");
        println!("{BANNER}");

        let chatted = chat(&running, &mut lines).await;
        let restart = running.lifecycle().restart_requested();
        running.stop().await;
        if !chatted? || !restart {
            info!("shutting down mock console");
            return Ok(());
        }

        info!(path = %path.display(), "restarting mock console");
        config = cibot_config::load_config(path)?;
    }
}
