use async_trait::async_trait;

use crate::application::errors::BotError;

/// Transport trait - abstraction over the live chat connection
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a chat message to a channel or nick.
    ///
    /// Resolves once the message has been written out; reply pacing is
    /// measured from that point.
    async fn privmsg(&self, target: &str, text: &str) -> Result<(), BotError>;

    /// Send a raw protocol line (without line terminator)
    async fn send_raw(&self, line: &str) -> Result<(), BotError>;

    /// Leave the network gracefully
    async fn quit(&self, reason: &str) -> Result<(), BotError> {
        self.send_raw(&format!("QUIT :{}", reason)).await
    }
}
