//! Reply throttle - Flood control for outgoing chat messages

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::application::errors::BotError;
use crate::domain::entities::ReplyPayload;
use crate::domain::traits::{ReplySink, Transport};

/// Minimum delay between two messages written to the network
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(2);

/// Serialises outgoing messages and spaces them out.
///
/// The lock is held across the wait and the write, so concurrent callers are
/// transmitted one at a time, each at least `min_interval` after the previous
/// write completed.
pub struct ReplyThrottle {
    transport: Arc<dyn Transport>,
    min_interval: Duration,
    last_sent: Mutex<Instant>,
}

impl ReplyThrottle {
    pub fn new(transport: Arc<dyn Transport>, min_interval: Duration) -> Self {
        Self {
            transport,
            min_interval,
            last_sent: Mutex::new(Instant::now()),
        }
    }

    /// Write a message to `target`, waiting out the remainder of the interval first
    pub async fn send(&self, target: &str, message: &str) -> Result<(), BotError> {
        let mut last_sent = self.last_sent.lock().await;

        let elapsed = last_sent.elapsed();
        if elapsed < self.min_interval {
            let wait = self.min_interval - elapsed;
            tracing::debug!("Pacing reply to {} by {:?}", target, wait);
            tokio::time::sleep(wait).await;
        }

        let result = self.transport.privmsg(target, message).await;
        *last_sent = Instant::now();
        result
    }
}

/// Sends every payload to the bot's primary channel
pub struct BroadcastReply {
    throttle: Arc<ReplyThrottle>,
    channel: String,
}

impl BroadcastReply {
    pub fn new(throttle: Arc<ReplyThrottle>, channel: impl Into<String>) -> Self {
        Self {
            throttle,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl ReplySink for BroadcastReply {
    async fn deliver(&self, payload: ReplyPayload) -> Result<(), BotError> {
        self.throttle.send(&self.channel, &payload.message).await
    }
}

/// Sends a payload to its explicit target; payloads without one are dropped
pub struct DirectReply {
    throttle: Arc<ReplyThrottle>,
}

impl DirectReply {
    pub fn new(throttle: Arc<ReplyThrottle>) -> Self {
        Self { throttle }
    }
}

#[async_trait]
impl ReplySink for DirectReply {
    async fn deliver(&self, payload: ReplyPayload) -> Result<(), BotError> {
        match payload.destination() {
            Some(target) => self.throttle.send(target, &payload.message).await,
            None => Ok(()),
        }
    }
}
