//! Bot - wires the connection, dispatcher, roster and throttle together

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::application::errors::BotError;
use crate::application::messaging::{
    BroadcastReply, DirectReply, Dispatch, MessageDispatcher, ReplyThrottle, DEFAULT_MIN_INTERVAL,
};
use crate::application::services::RosterTracker;
use crate::domain::entities::{Command, IncomingMessage, ReplyPayload, Roster};
use crate::domain::traits::{MessageHandler, ReplySink, SharedReplySink, Transport};
use crate::infrastructure::config::Config;
use crate::infrastructure::irc::{IrcEvents, IrcLine, RPL_ENDOFNAMES, RPL_NAMREPLY, RPL_WELCOME};

/// Lifecycle of a bot. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BotState {
    Constructed,
    /// Registered with the server, joining the channel
    Connected,
    /// Channel joined and roster loaded
    Running,
    Stopped,
}

/// Connection-independent settings for a bot
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub nick: String,
    pub channel: String,
    pub channel_key: Option<String>,
    pub min_reply_interval: Duration,
    pub roster_timeout: Option<Duration>,
    pub max_in_flight: Option<usize>,
}

impl BotSettings {
    pub fn new(nick: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            channel: channel.into(),
            channel_key: None,
            min_reply_interval: DEFAULT_MIN_INTERVAL,
            roster_timeout: None,
            max_in_flight: None,
        }
    }
}

impl From<&Config> for BotSettings {
    fn from(config: &Config) -> Self {
        Self {
            nick: config.bot.nick.clone(),
            channel: config.server.channel.clone(),
            channel_key: config.server.channel_key.clone(),
            min_reply_interval: config.min_reply_interval(),
            roster_timeout: config.roster_timeout(),
            max_in_flight: config.dispatch.max_in_flight,
        }
    }
}

/// Composition root of the bot
pub struct Bot {
    settings: BotSettings,
    transport: Arc<dyn Transport>,
    dispatcher: Arc<MessageDispatcher>,
    roster: Arc<RosterTracker>,
    throttle: Arc<ReplyThrottle>,
    state: Arc<watch::Sender<BotState>>,
}

impl Bot {
    pub fn new(settings: BotSettings, transport: Arc<dyn Transport>) -> Self {
        let mut dispatcher = MessageDispatcher::new();
        if let Some(max) = settings.max_in_flight {
            dispatcher = dispatcher.with_max_in_flight(max);
        }
        let roster = RosterTracker::new(settings.channel.clone())
            .with_timeout(settings.roster_timeout);
        let throttle = ReplyThrottle::new(transport.clone(), settings.min_reply_interval);
        let (state, _) = watch::channel(BotState::Constructed);

        Self {
            settings,
            transport,
            dispatcher: Arc::new(dispatcher),
            roster: Arc::new(roster),
            throttle: Arc::new(throttle),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> BotState {
        *self.state.borrow()
    }

    /// Resolves once the channel is joined and the roster loaded
    pub async fn wait_until_running(&self) -> Result<(), BotError> {
        let mut rx = self.state.subscribe();
        let state = *rx
            .wait_for(|s| *s >= BotState::Running)
            .await
            .map_err(|_| BotError::Internal("State channel closed".to_string()))?;
        match state {
            BotState::Running => Ok(()),
            _ => Err(BotError::Network("Stopped before joining".to_string())),
        }
    }

    /// Register a command handler replying through `reply`
    pub fn add_command(
        &self,
        command: &Command,
        reply: SharedReplySink,
    ) -> Result<usize, BotError> {
        self.dispatcher.register_command(command, reply)
    }

    /// Register a handler called for every message that is not a command
    pub fn add_message_handler(
        &self,
        handler: Option<Arc<dyn MessageHandler>>,
        reply: SharedReplySink,
    ) -> Result<bool, BotError> {
        self.dispatcher.register_passive(handler, reply)
    }

    pub fn help_lines(&self) -> Vec<String> {
        self.dispatcher.help_lines()
    }

    /// Sink sending every reply to the primary channel
    pub fn broadcast_sink(&self) -> SharedReplySink {
        Arc::new(BroadcastReply::new(self.throttle.clone(), self.settings.channel.clone()))
    }

    /// Sink sending replies to their explicit target only
    pub fn direct_sink(&self) -> SharedReplySink {
        Arc::new(DirectReply::new(self.throttle.clone()))
    }

    /// Send a message to the primary channel
    pub async fn reply_to_all(&self, payload: ReplyPayload) -> Result<(), BotError> {
        self.throttle.send(&self.settings.channel, &payload.message).await
    }

    /// Send a message to `payload.target`; does nothing without a target
    pub async fn reply(&self, payload: ReplyPayload) -> Result<(), BotError> {
        DirectReply::new(self.throttle.clone()).deliver(payload).await
    }

    pub fn is_privileged(&self, nick: &str) -> bool {
        self.roster.is_privileged(nick)
    }

    pub fn roster(&self) -> Roster {
        self.roster.snapshot()
    }

    /// Route server events until the connection closes or an `ERROR` arrives
    pub async fn run(&self, mut events: IrcEvents) -> Result<(), BotError> {
        while let Some(line) = events.recv().await {
            if line.is("ERROR") {
                tracing::warn!("Server closed the link: {}", line.trailing().unwrap_or_default());
                break;
            }
            // Handler tasks keep running on their own
            let _ = self.handle_event(line);
        }

        if advance(&self.state, BotState::Stopped) {
            tracing::info!("Disconnected from server");
        }
        Ok(())
    }

    /// Route one server line. Returns the dispatch for chat messages.
    pub fn handle_event(&self, line: IrcLine) -> Option<Dispatch> {
        match line.command.as_str() {
            RPL_WELCOME => {
                self.on_welcome();
                None
            }
            RPL_NAMREPLY => {
                if let (Some(channel), Some(names)) = (line.param(2), line.trailing()) {
                    self.roster.on_names_reply(channel, names);
                }
                None
            }
            RPL_ENDOFNAMES => {
                if let Some(channel) = line.param(1) {
                    self.roster.on_names_end(channel);
                }
                None
            }
            "PRIVMSG" => {
                let sender = line.nick()?;
                let (origin, text) = (line.param(0)?, line.param(1)?);
                let message = IncomingMessage::new(sender, origin, text, self.transport.clone());
                Some(self.dispatcher.on_incoming(message))
            }
            _ => None,
        }
    }

    /// Leave the server. Handler tasks already started are not waited for.
    pub async fn stop(&self) -> Result<(), BotError> {
        if self.state() == BotState::Stopped {
            return Ok(());
        }
        advance(&self.state, BotState::Stopped);
        tracing::info!("Stopping {}", self.settings.nick);
        self.transport.quit("Bye").await
    }

    fn on_welcome(&self) {
        if !advance(&self.state, BotState::Connected) {
            return;
        }
        tracing::info!("Registered as {}, joining {}", self.settings.nick, self.settings.channel);

        let transport = self.transport.clone();
        let roster = self.roster.clone();
        let state = self.state.clone();
        let join = match &self.settings.channel_key {
            Some(key) => format!("JOIN {} {}", self.settings.channel, key),
            None => format!("JOIN {}", self.settings.channel),
        };

        tokio::spawn(async move {
            if let Err(e) = transport.send_raw(&join).await {
                tracing::error!("Failed to join, stopping: {}", e);
                advance(&state, BotState::Stopped);
                return;
            }
            if let Err(e) = roster.refresh(transport.as_ref()).await {
                tracing::warn!("Roster refresh failed: {}", e);
            }
            if advance(&state, BotState::Running) {
                tracing::info!("Running in {}", roster.channel());
            }
        });
    }
}

/// Move to `next` if it is later than the current state
fn advance(state: &watch::Sender<BotState>, next: BotState) -> bool {
    state.send_if_modified(|current| {
        if next > *current {
            *current = next;
            true
        } else {
            false
        }
    })
}
