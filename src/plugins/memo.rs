//! Memo plugin - leave a message for a user who is away
//!
//! `!memo <nick> <message>` stores a memo, `!memostat` lists the memos you
//! left that are still pending, and the first message a recipient posts
//! delivers their memos.

use std::sync::Arc;

use async_trait::async_trait;

use super::trait_def::Plugin;
use crate::application::errors::{BotError, StorageError};
use crate::domain::entities::{Command, IncomingMessage, ReplyPayload};
use crate::domain::traits::{CommandHandler, MemoStore, MessageHandler, SharedReplySink};

/// Memo feature: two commands and one passive delivery handler
pub struct MemoPlugin {
    store: Arc<dyn MemoStore>,
    memo_triggers: Vec<String>,
    memostat_triggers: Vec<String>,
}

impl MemoPlugin {
    pub fn new(store: Arc<dyn MemoStore>, marker: &str) -> Self {
        Self {
            store,
            memo_triggers: vec![format!("{}memo", marker), format!("{}m", marker)],
            memostat_triggers: vec![format!("{}memostat", marker), format!("{}ms", marker)],
        }
    }
}

impl Plugin for MemoPlugin {
    fn name(&self) -> &str {
        "memo"
    }

    fn description(&self) -> &str {
        "Leave memos for users who are away"
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("memo")
                .with_help(format!(
                    "{} <nick> <message> => Leave a memo for another user",
                    self.memo_triggers.join("/")
                ))
                .with_triggers(self.memo_triggers.clone())
                .with_handler(SaveMemo {
                    store: self.store.clone(),
                    triggers: self.memo_triggers.clone(),
                }),
            Command::new("memostat")
                .with_help(format!(
                    "{} => List the unread memos you left",
                    self.memostat_triggers.join("/")
                ))
                .with_triggers(self.memostat_triggers.clone())
                .with_handler(MemoStatus {
                    store: self.store.clone(),
                    triggers: self.memostat_triggers.clone(),
                }),
        ]
    }

    fn message_handlers(&self) -> Vec<Arc<dyn MessageHandler>> {
        vec![Arc::new(DeliverMemos {
            store: self.store.clone(),
        })]
    }
}

/// Run a store call off the async runtime
async fn with_store<T, F>(store: &Arc<dyn MemoStore>, call: F) -> Result<T, BotError>
where
    F: FnOnce(&dyn MemoStore) -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|e| BotError::Internal(format!("Store task failed: {}", e)))?
        .map_err(BotError::from)
}

/// `!memo <nick> <message>`
pub struct SaveMemo {
    store: Arc<dyn MemoStore>,
    triggers: Vec<String>,
}

#[async_trait]
impl CommandHandler for SaveMemo {
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<bool, BotError> {
        let fields = message.fields();
        if fields.len() < 3 || !self.triggers.iter().any(|t| t == fields[0]) {
            return Ok(false);
        }

        let user_to = fields[1].to_string();
        let user_from = message.sender.clone();
        let text = fields[2..].join(" ");

        let (to, from) = (user_to.clone(), user_from.clone());
        with_store(&self.store, move |store| store.save_memo(&to, &from, &text)).await?;
        tracing::debug!("Memo from {} to {} saved", user_from, user_to);

        reply
            .deliver(ReplyPayload::to(
                user_from.clone(),
                format!("{}: memo for {} saved", user_from, user_to),
            ))
            .await?;
        Ok(true)
    }
}

/// `!memostat`
pub struct MemoStatus {
    store: Arc<dyn MemoStore>,
    triggers: Vec<String>,
}

#[async_trait]
impl CommandHandler for MemoStatus {
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<bool, BotError> {
        match message.trigger() {
            Some(trigger) if self.triggers.iter().any(|t| t == trigger) => {}
            _ => return Ok(false),
        }

        let sender = message.sender.clone();
        let from = sender.clone();
        let memos = with_store(&self.store, move |store| store.memos_from(&from)).await?;

        if memos.is_empty() {
            reply.deliver(ReplyPayload::to(sender, "No memo saved")).await?;
            return Ok(true);
        }
        for memo in memos {
            reply
                .deliver(ReplyPayload::to(
                    sender.clone(),
                    format!(
                        "Memo for {}: \"{}\" ({})",
                        memo.user_to,
                        memo.message,
                        memo.date_label()
                    ),
                ))
                .await?;
        }
        Ok(true)
    }
}

/// Delivers pending memos when their recipient speaks
pub struct DeliverMemos {
    store: Arc<dyn MemoStore>,
}

#[async_trait]
impl MessageHandler for DeliverMemos {
    async fn handle(
        &self,
        message: IncomingMessage,
        reply: SharedReplySink,
    ) -> Result<(), BotError> {
        let user = message.sender.clone();
        let to = user.clone();
        // Memos are removed before any reply goes out
        let memos = with_store(&self.store, move |store| store.take_memos_for(&to)).await?;

        for memo in memos {
            reply
                .deliver(ReplyPayload::to(
                    user.clone(),
                    format!(
                        "{}: memo from {} => \"{}\" ({})",
                        user,
                        memo.user_from,
                        memo.message,
                        memo.date_label()
                    ),
                ))
                .await?;
        }
        Ok(())
    }
}
