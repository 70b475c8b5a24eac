#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use {
    cibot_channels::{BotIdentity, InboundEvent, RecordingOutbound, Sender},
    cibot_common::Lifecycle,
    cibot_config::BotConfig,
    cibot_dispatch::{Bot, BotOptions, Error, Exit},
    secrecy::Secret,
    tokio::sync::mpsc,
};

fn config() -> BotConfig {
    BotConfig {
        bot_name: Some("cibot".into()),
        slack_token: Some(Secret::new("xoxb-test".into())),
        ..BotConfig::default()
    }
}

fn say(text: &str) -> InboundEvent {
    InboundEvent::new("C1", Sender::new("U1"), text)
}

async fn bootstrap(config: BotConfig) -> (Bot, Arc<RecordingOutbound>) {
    let out = Arc::new(RecordingOutbound::new());
    let bot = Bot::bootstrap(config, out.clone(), Lifecycle::new(), BotOptions::default())
        .await
        .unwrap();
    (bot, out)
}

#[tokio::test]
async fn missing_identity_aborts_startup() {
    let out = Arc::new(RecordingOutbound::new());

    let mut cfg = config();
    cfg.bot_name = None;
    let err = Bot::bootstrap(cfg, out.clone(), Lifecycle::new(), BotOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::MissingBotName));

    let mut cfg = config();
    cfg.slack_token = Some(Secret::new("  ".into()));
    let err = Bot::bootstrap(cfg, out, Lifecycle::new(), BotOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::MissingToken));
}

#[tokio::test]
async fn unknown_enabled_plugin_aborts_startup() {
    let mut cfg = config();
    cfg.enabled_plugins = vec!["nope".into()];
    let out = Arc::new(RecordingOutbound::new());
    let err = Bot::bootstrap(cfg, out, Lifecycle::new(), BotOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::Plugins(_)));
}

#[tokio::test]
async fn invalid_config_aborts_startup() {
    let mut cfg = config();
    cfg.contexts.sweep_interval_secs = 0;
    let out = Arc::new(RecordingOutbound::new());
    let err = Bot::bootstrap(cfg, out, Lifecycle::new(), BotOptions::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::Config(cibot_config::Error::Invalid(_))));
}

#[tokio::test]
async fn builtins_are_registered() {
    let (bot, _) = bootstrap(config()).await;
    assert_eq!(bot.registry().commands(), &[
        "list", "help", "greet", "source", "restart", "shutdown"
    ]);
    assert!(!bot.lifecycle().is_ready());
}

#[tokio::test]
async fn conversation_until_shutdown() {
    let (bot, out) = bootstrap(config()).await;
    let lifecycle = bot.lifecycle().clone();
    let (tx, mut rx) = mpsc::channel(8);
    for text in ["!greet", "bob", "!list", "!shutdown", "!list"] {
        tx.send(say(text)).await.unwrap();
    }

    let exit = bot.run(BotIdentity::new("B1", "cibot"), &mut rx).await;

    assert_eq!(exit, Exit::Shutdown);
    assert!(!lifecycle.is_running());
    assert_eq!(out.texts(), vec![
        "Who should I greet?",
        "Hiya <@bob>, nice to meet you!",
        "Loaded commands: `list`, `help`, `greet`, `source`, `restart`, `shutdown`",
        "Bye!",
    ]);
}

#[tokio::test(start_paused = true)]
async fn abandoned_context_times_out_once() {
    let mut cfg = config();
    cfg.contexts.timeout_secs = 1;
    cfg.contexts.sweep_interval_secs = 1;
    let (bot, out) = bootstrap(cfg).await;
    let (tx, mut rx) = mpsc::channel(8);
    let running =
        tokio::spawn(async move { bot.run(BotIdentity::new("B1", "cibot"), &mut rx).await });

    tx.send(say("!greet")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    drop(tx);
    running.await.unwrap();

    assert_eq!(out.texts(), vec!["Who should I greet?", "Never mind then."]);
}

#[tokio::test]
async fn closed_transport_stops_the_bot() {
    let (bot, out) = bootstrap(config()).await;
    let lifecycle = bot.lifecycle().clone();
    let (tx, mut rx) = mpsc::channel(1);
    drop(tx);

    let exit = bot.run(BotIdentity::new("B1", "cibot"), &mut rx).await;

    assert_eq!(exit, Exit::TransportClosed);
    assert!(!lifecycle.is_running());
    assert!(out.sent().is_empty());
}

#[tokio::test]
async fn restart_bootstraps_again_from_a_fresh_config() {
    let out = Arc::new(RecordingOutbound::new());
    let (tx, rx) = mpsc::channel(8);
    for text in ["!restart", "!list", "!shutdown"] {
        tx.send(say(text)).await.unwrap();
    }

    let mut loads = 0;
    let exit = Bot::serve(
        || {
            loads += 1;
            Ok(config())
        },
        BotOptions::default,
        out.clone(),
        BotIdentity::new("B1", "cibot"),
        rx,
    )
    .await
    .unwrap();

    assert_eq!(exit, Exit::Shutdown);
    assert_eq!(loads, 2);
    assert_eq!(out.texts(), vec![
        "Be back in a bit!",
        "Loaded commands: `list`, `help`, `greet`, `source`, `restart`, `shutdown`",
        "Bye!",
    ]);
}
