//! Message dispatcher - Routes each incoming line to its handlers

use std::sync::{Arc, RwLock};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::registry::HandlerRegistry;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, IncomingMessage};
use crate::domain::traits::{MessageHandler, SharedReplySink};

/// How a message was classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchKind {
    /// Blank text, nothing invoked
    Ignored,
    /// First token matched a trigger
    Command { trigger: String },
    /// No trigger matched; this many passive handlers were started
    Passive { handlers: usize },
}

/// Outcome of [`MessageDispatcher::on_incoming`].
///
/// Dropping it leaves the spawned handler tasks running.
#[derive(Debug)]
pub struct Dispatch {
    pub kind: DispatchKind,
    tasks: Vec<JoinHandle<()>>,
}

impl Dispatch {
    fn ignored() -> Self {
        Self {
            kind: DispatchKind::Ignored,
            tasks: Vec::new(),
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every handler task started for this message
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Handler task aborted: {}", e);
            }
        }
    }
}

/// Message dispatcher - owns the registry and starts handler tasks
pub struct MessageDispatcher {
    registry: RwLock<HandlerRegistry>,
    in_flight: Option<Arc<Semaphore>>,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HandlerRegistry::new()),
            in_flight: None,
        }
    }

    /// Bound the number of handler tasks running at once
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.in_flight = Some(Arc::new(Semaphore::new(max.max(1))));
        self
    }

    /// Register a command handler
    pub fn register_command(
        &self,
        command: &Command,
        reply: SharedReplySink,
    ) -> Result<usize, BotError> {
        let mut registry = self.registry.write()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;
        Ok(registry.register_command(command, reply))
    }

    /// Register a passive message handler
    pub fn register_passive(
        &self,
        handler: Option<Arc<dyn MessageHandler>>,
        reply: SharedReplySink,
    ) -> Result<bool, BotError> {
        let mut registry = self.registry.write()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;
        Ok(registry.register_passive(handler, reply))
    }

    /// Help lines of every registered command
    pub fn help_lines(&self) -> Vec<String> {
        self.registry.read()
            .map(|r| r.help_lines().to_vec())
            .unwrap_or_default()
    }

    /// Classify one incoming message and start its handlers.
    ///
    /// Never waits on a handler: each one runs in its own task.
    pub fn on_incoming(&self, message: IncomingMessage) -> Dispatch {
        if message.is_blank() {
            return Dispatch::ignored();
        }
        let Some(trigger) = message.trigger().map(str::to_string) else {
            return Dispatch::ignored();
        };

        // Clone the bindings out so the lock is not held by running tasks
        let (command, passive) = match self.registry.read() {
            Ok(registry) => (
                registry.command(&trigger).cloned(),
                registry.passive().to_vec(),
            ),
            Err(_) => {
                tracing::error!("Handler registry lock poisoned, dropping message");
                return Dispatch::ignored();
            }
        };

        if let Some(binding) = command {
            tracing::debug!("[{}] {} -> {}", message.origin, trigger, binding.module);
            let limit = self.in_flight.clone();
            let token = trigger.clone();
            let task = tokio::spawn(async move {
                let _permit = acquire(limit).await;
                let sender = message.sender.clone();
                match binding.handler.handle(message, binding.reply).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(
                            "{} from {} not handled by '{}'",
                            token,
                            sender,
                            binding.module
                        );
                    }
                    Err(e) => {
                        tracing::error!("Command {} from {} failed: {}", token, sender, e);
                    }
                }
            });
            return Dispatch {
                kind: DispatchKind::Command { trigger },
                tasks: vec![task],
            };
        }

        let tasks: Vec<JoinHandle<()>> = passive
            .into_iter()
            .map(|binding| {
                let message = message.clone();
                let limit = self.in_flight.clone();
                tokio::spawn(async move {
                    let _permit = acquire(limit).await;
                    let sender = message.sender.clone();
                    if let Err(e) = binding.handler.handle(message, binding.reply).await {
                        tracing::error!("Message handler failed for {}: {}", sender, e);
                    }
                })
            })
            .collect();

        Dispatch {
            kind: DispatchKind::Passive { handlers: tasks.len() },
            tasks,
        }
    }
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

async fn acquire(limit: Option<Arc<Semaphore>>) -> Option<tokio::sync::OwnedSemaphorePermit> {
    match limit {
        Some(semaphore) => semaphore.acquire_owned().await.ok(),
        None => None,
    }
}
