//! Help plugin - lists what the other commands do

use async_trait::async_trait;

use super::trait_def::Plugin;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, IncomingMessage, ReplyPayload};
use crate::domain::traits::{CommandHandler, SharedReplySink};

pub struct HelpPlugin {
    triggers: Vec<String>,
    lines: Vec<String>,
}

impl HelpPlugin {
    /// `lines` are the help messages of the commands registered so far
    pub fn new(marker: &str, mut lines: Vec<String>) -> Self {
        let triggers = vec![format!("{}help", marker), format!("{}h", marker)];
        lines.push(format!("{} => Show this help", triggers.join("/")));
        Self { triggers, lines }
    }
}

impl Plugin for HelpPlugin {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "List available commands"
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("help")
            .with_triggers(self.triggers.clone())
            .with_handler(ShowHelp {
                lines: self.lines.clone(),
            })]
    }
}

struct ShowHelp {
    lines: Vec<String>,
}

#[async_trait]
impl CommandHandler for ShowHelp {
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<bool, BotError> {
        // One reply per line so each one is paced
        for line in &self.lines {
            reply
                .deliver(ReplyPayload::to(message.sender.clone(), line.clone()))
                .await?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{ReplySink, Transport};
    use std::sync::{Arc, Mutex};

    struct NoTransport;

    #[async_trait]
    impl Transport for NoTransport {
        async fn privmsg(&self, _target: &str, _text: &str) -> Result<(), BotError> {
            Ok(())
        }

        async fn send_raw(&self, _line: &str) -> Result<(), BotError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        replies: Mutex<Vec<ReplyPayload>>,
    }

    #[async_trait]
    impl ReplySink for CollectingSink {
        async fn deliver(&self, payload: ReplyPayload) -> Result<(), BotError> {
            self.replies.lock().unwrap().push(payload);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_help_lists_every_line_to_sender() {
        let lines = vec!["!memo/!m <nick> <message> => Leave a memo".to_string()];
        let plugin = HelpPlugin::new("!", lines);
        let command = plugin.commands().remove(0);
        assert_eq!(command.triggers, vec!["!help", "!h"]);

        let sink = Arc::new(CollectingSink::default());
        let message = IncomingMessage::new("Alice", "#chan", "!help", Arc::new(NoTransport));
        assert!(command.handler.unwrap().handle(message, sink.clone()).await.unwrap());

        let replies = sink.replies.lock().unwrap().clone();
        assert_eq!(replies.len(), 2);
        assert!(replies.iter().all(|r| r.target.as_deref() == Some("Alice")));
        assert_eq!(replies[1].message, "!help/!h => Show this help");
    }
}
