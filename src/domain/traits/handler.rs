use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{IncomingMessage, ReplyPayload};

/// Destination for the replies a handler produces, bound at registration time
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn deliver(&self, payload: ReplyPayload) -> Result<(), BotError>;
}

pub type SharedReplySink = Arc<dyn ReplySink>;

/// Handler bound to one or more command triggers.
///
/// Returns `Ok(true)` when it recognised and processed the message. A handler
/// owning several triggers does its own sub-parsing and may decline with
/// `Ok(false)`.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<bool, BotError>;
}

/// Handler invoked for every message that matched no command trigger
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<(), BotError>;
}

/// Adapter turning an async closure into a handler
pub struct FnHandler<F>(F);

/// Wrap an async closure as a [`CommandHandler`]
pub fn command_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(IncomingMessage, SharedReplySink) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, BotError>> + Send,
{
    FnHandler(f)
}

/// Wrap an async closure as a [`MessageHandler`]
pub fn message_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(IncomingMessage, SharedReplySink) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BotError>> + Send,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(IncomingMessage, SharedReplySink) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, BotError>> + Send,
{
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<bool, BotError> {
        (self.0)(message, reply).await
    }
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(IncomingMessage, SharedReplySink) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BotError>> + Send,
{
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<(), BotError> {
        (self.0)(message, reply).await
    }
}
