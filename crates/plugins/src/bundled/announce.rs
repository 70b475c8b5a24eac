//! Posts a fixed message to configured channels on a timer.
//!
//! ```yaml
//! plugins:
//!   announce:
//!     channels: ["C0123"]
//!     message: "Stand-up in 5 minutes"
//!     interval_secs: 86400
//! ```

use std::{sync::Arc, time::Duration};

use {anyhow::Result, async_trait::async_trait, tracing::info};

use crate::{Plugin, PluginScope};

pub const NAME: &str = "announce";

const DEFAULT_INTERVAL_SECS: u64 = 3600;

pub struct AnnouncePlugin {
    scope: PluginScope,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    Box::new(AnnouncePlugin { scope })
}

#[async_trait]
impl Plugin for AnnouncePlugin {
    async fn setup(&mut self) -> Result<()> {
        let config = self.scope.config();
        let channels: Vec<String> = config.get_as("channels").unwrap_or_default();
        let Some(message) = config.get_str("message").map(str::to_string) else {
            anyhow::bail!("announce needs a `message`");
        };
        if channels.is_empty() {
            anyhow::bail!("announce needs at least one channel");
        }
        let interval_secs = config
            .get_as::<u64>("interval_secs")
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS);

        info!(channels = channels.len(), interval_secs, "scheduling announcement");
        let scope = self.scope.clone();
        let message = Arc::new(message);
        let channels = Arc::new(channels);
        self.scope
            .register_loop(Duration::from_secs(interval_secs), move || {
                let scope = scope.clone();
                let message = Arc::clone(&message);
                let channels = Arc::clone(&channels);
                async move {
                    for channel in channels.iter() {
                        scope.outbound().send_text(channel, &message).await?;
                    }
                    Ok(())
                }
            });
        Ok(())
    }
}
