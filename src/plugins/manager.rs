//! Plugin manager - installs feature modules into a bot

use crate::application::errors::BotError;
use crate::application::Bot;
use crate::plugins::trait_def::{Plugin, ReplyRoute};
use std::collections::HashSet;
use tracing::info;

/// Keeps plugins in registration order and installs them into a bot
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    names: HashSet<String>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin
    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) -> Result<(), String> {
        let name = plugin.name().to_string();

        if !self.names.insert(name.clone()) {
            return Err(format!("Plugin '{}' already registered", name));
        }

        info!("Registering plugin: {}", name);
        self.plugins.push(Box::new(plugin));
        Ok(())
    }

    /// Register every plugin's commands and message handlers with `bot`,
    /// in plugin registration order
    pub fn install(&self, bot: &Bot) -> Result<(), BotError> {
        for plugin in &self.plugins {
            install_plugin(plugin.as_ref(), bot)?;
        }
        Ok(())
    }
}

/// Register one plugin with `bot`
pub fn install_plugin(plugin: &dyn Plugin, bot: &Bot) -> Result<(), BotError> {
    let sink = match plugin.reply_route() {
        ReplyRoute::Direct => bot.direct_sink(),
        ReplyRoute::Broadcast => bot.broadcast_sink(),
    };

    let mut triggers = 0;
    for command in plugin.commands() {
        triggers += bot.add_command(&command, sink.clone())?;
    }
    let mut handlers = 0;
    for handler in plugin.message_handlers() {
        if bot.add_message_handler(Some(handler), sink.clone())? {
            handlers += 1;
        }
    }

    info!(
        "Installed plugin '{}' ({}): {} triggers, {} message handlers",
        plugin.name(),
        plugin.description(),
        triggers,
        handlers
    );
    Ok(())
}
