//! Command and trigger lookup, built once at startup.

use std::{collections::HashMap, sync::Arc};

use {
    regex::{Regex, RegexBuilder},
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    plugin::{HelpEntry, Plugin},
};

/// Commands and help pages, published to plugins after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpIndex {
    pub commands: Vec<String>,
    pub entries: Vec<HelpEntry>,
}

impl HelpIndex {
    /// Case-insensitive; the first registered page wins.
    pub fn help_for(&self, command: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.command.eq_ignore_ascii_case(command))
            .map(|e| e.text.as_str())
    }
}

/// Maps commands and trigger patterns to the plugins that own them.
#[derive(Default)]
pub struct HookRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
    /// Plugin names in registration order.
    order: Vec<String>,
    /// Lower-cased command -> owning plugin.
    commands: HashMap<String, String>,
    /// Commands in first-registration order.
    command_order: Vec<String>,
    /// Scanned in registration order.
    triggers: Vec<(Regex, String)>,
    help: Vec<HelpEntry>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plugin` under `name` with everything its manifest declares.
    ///
    /// A command already owned by another plugin moves to this one. Nothing
    /// is registered if a trigger pattern fails to compile.
    pub fn register(&mut self, name: &str, plugin: Arc<dyn Plugin>) -> Result<()> {
        if self.plugins.contains_key(name) {
            return Err(Error::duplicate_plugin(name));
        }
        let manifest = plugin.manifest();

        let triggers = manifest
            .trigger_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, name.to_string()))
                    .map_err(|e| Error::invalid_trigger(name, pattern, e))
            })
            .collect::<Result<Vec<_>>>()?;

        for hook in &manifest.hooks {
            let command = hook.to_lowercase();
            match self.commands.insert(command.clone(), name.to_string()) {
                Some(previous) if previous != name => {
                    warn!(
                        command = %command,
                        previous = %previous,
                        plugin = name,
                        "command registered by two plugins, last one wins"
                    );
                },
                Some(_) => {},
                None => self.command_order.push(command),
            }
        }

        self.triggers.extend(triggers);
        self.help.extend(manifest.help);
        self.plugins.insert(name.to_string(), plugin);
        self.order.push(name.to_string());

        info!(
            plugin = name,
            hooks = manifest.hooks.len(),
            triggers = manifest.trigger_patterns.len(),
            "registered plugin"
        );
        Ok(())
    }

    /// Owner of `token`, already stripped of the command prefix.
    pub fn resolve_command(&self, token: &str) -> Option<(&str, &Arc<dyn Plugin>)> {
        let name = self.commands.get(&token.to_lowercase())?;
        self.plugins.get(name).map(|p| (name.as_str(), p))
    }

    /// Owner of the first registered pattern that matches anywhere in `text`.
    pub fn resolve_trigger(&self, text: &str) -> Option<(&str, &Arc<dyn Plugin>)> {
        let (re, name) = self.triggers.iter().find(|(re, _)| re.is_match(text))?;
        debug!(pattern = re.as_str(), plugin = %name, "trigger matched");
        self.plugins.get(name).map(|p| (name.as_str(), p))
    }

    pub fn help_for(&self, command: &str) -> Option<&str> {
        self.help
            .iter()
            .find(|e| e.command.eq_ignore_ascii_case(command))
            .map(|e| e.text.as_str())
    }

    /// Every registered command, in registration order.
    pub fn commands(&self) -> &[String] {
        &self.command_order
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Plugin names in registration order.
    pub fn plugin_names(&self) -> &[String] {
        &self.order
    }

    pub fn help_index(&self) -> HelpIndex {
        HelpIndex {
            commands: self.command_order.clone(),
            entries: self.help.clone(),
        }
    }
}
