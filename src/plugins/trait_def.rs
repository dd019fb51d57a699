//! Plugin trait definitions

use std::sync::Arc;

use crate::domain::entities::Command;
use crate::domain::traits::MessageHandler;

/// Where a plugin's replies are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyRoute {
    /// To the payload's explicit target; payloads without one are dropped
    #[default]
    Direct,
    /// To the bot's primary channel
    Broadcast,
}

/// Core plugin trait that all feature modules implement
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Commands to register, each with its triggers and handler
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// Handlers invoked on every message that is not a command
    fn message_handlers(&self) -> Vec<Arc<dyn MessageHandler>> {
        Vec::new()
    }

    fn reply_route(&self) -> ReplyRoute {
        ReplyRoute::Direct
    }
}
