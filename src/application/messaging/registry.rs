//! Handler registry - Command triggers and passive message handlers

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::Command;
use crate::domain::traits::{CommandHandler, MessageHandler, SharedReplySink};

/// A command handler paired with the sink its replies go to
#[derive(Clone)]
pub struct CommandBinding {
    pub module: String,
    pub handler: Arc<dyn CommandHandler>,
    pub reply: SharedReplySink,
}

/// A passive handler paired with the sink its replies go to
#[derive(Clone)]
pub struct PassiveBinding {
    pub handler: Arc<dyn MessageHandler>,
    pub reply: SharedReplySink,
}

/// Registry of everything the dispatcher can invoke.
///
/// Additions only: a trigger registered twice keeps the last binding, passive
/// handlers keep their registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    commands: HashMap<String, CommandBinding>,
    passive: Vec<PassiveBinding>,
    help: Vec<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every trigger of `command` to its handler and `reply`.
    /// Returns the number of triggers bound; a command without handler binds none.
    pub fn register_command(&mut self, command: &Command, reply: SharedReplySink) -> usize {
        let Some(handler) = &command.handler else {
            tracing::warn!("Command module '{}' has no handler, skipping", command.module);
            return 0;
        };

        let binding = CommandBinding {
            module: command.module.clone(),
            handler: handler.clone(),
            reply,
        };
        for trigger in &command.triggers {
            if self.commands.insert(trigger.clone(), binding.clone()).is_some() {
                tracing::debug!("Trigger {} rebound to module '{}'", trigger, command.module);
            }
        }
        if let Some(help) = &command.help_message {
            self.help.push(help.clone());
        }

        command.triggers.len()
    }

    /// Append a passive handler. Returns false when no handler was given.
    pub fn register_passive(
        &mut self,
        handler: Option<Arc<dyn MessageHandler>>,
        reply: SharedReplySink,
    ) -> bool {
        match handler {
            Some(handler) => {
                self.passive.push(PassiveBinding { handler, reply });
                true
            }
            None => false,
        }
    }

    pub fn command(&self, trigger: &str) -> Option<&CommandBinding> {
        self.commands.get(trigger)
    }

    pub fn passive(&self) -> &[PassiveBinding] {
        &self.passive
    }

    /// Registered triggers, sorted
    pub fn triggers(&self) -> Vec<&str> {
        let mut triggers: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        triggers.sort_unstable();
        triggers
    }

    /// Help lines of registered commands, in registration order
    pub fn help_lines(&self) -> &[String] {
        &self.help
    }
}
