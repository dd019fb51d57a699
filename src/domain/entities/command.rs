use std::fmt;
use std::sync::Arc;

use crate::domain::traits::CommandHandler;

/// Represents a bot command: a set of triggers sharing one handler
#[derive(Clone)]
pub struct Command {
    pub module: String,
    pub help_message: Option<String>,
    pub triggers: Vec<String>,
    pub handler: Option<Arc<dyn CommandHandler>>,
}

impl Command {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            help_message: None,
            triggers: Vec::new(),
            handler: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help_message = Some(help.into());
        self
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.triggers.push(trigger.into());
        self
    }

    pub fn with_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers.extend(triggers.into_iter().map(Into::into));
        self
    }

    pub fn with_handler<H: CommandHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("module", &self.module)
            .field("help_message", &self.help_message)
            .field("triggers", &self.triggers)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
