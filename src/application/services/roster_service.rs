//! Roster tracking - Channel operators, refreshed through a names query

use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::application::errors::BotError;
use crate::domain::entities::Roster;
use crate::domain::traits::Transport;

/// Keeps the set of privileged members of the primary channel.
///
/// A refresh sends `NAMES <channel>` and waits until the names listing has
/// been committed by the reader loop. Each refresh gets its own completion
/// signal, so concurrent refreshes do not consume each other's reply.
pub struct RosterTracker {
    channel: String,
    roster: RwLock<Roster>,
    staging: Mutex<Option<Roster>>,
    waiters: Mutex<Vec<oneshot::Sender<()>>>,
    timeout: Option<Duration>,
}

impl RosterTracker {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            roster: RwLock::new(Roster::new()),
            staging: Mutex::new(None),
            waiters: Mutex::new(Vec::new()),
            timeout: None,
        }
    }

    /// Give up waiting for the names reply after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Query the channel membership and wait for the reply to be committed.
    ///
    /// Without a timeout this waits for as long as the server takes. When the
    /// timeout expires the roster is emptied and `RosterTimeout` is returned.
    pub async fn refresh(&self, connection: &dyn Transport) -> Result<(), BotError> {
        let (done_tx, done_rx) = oneshot::channel();
        lock(&self.waiters).push(done_tx);
        // A listing left without its 366 must not leak into this one
        lock(&self.staging).take();

        connection.send_raw(&format!("NAMES {}", self.channel)).await?;

        let completed = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, done_rx).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        "No names reply for {} after {:?}, clearing roster",
                        self.channel,
                        limit
                    );
                    self.replace(Roster::new());
                    return Err(BotError::RosterTimeout {
                        channel: self.channel.clone(),
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => done_rx.await,
        };

        completed.map_err(|_| BotError::Internal("Roster signal dropped".to_string()))
    }

    /// One `353` line: add its names to the listing being received
    pub fn on_names_reply(&self, channel: &str, names: &str) {
        if !self.is_primary(channel) {
            return;
        }
        lock(&self.staging)
            .get_or_insert_with(Roster::new)
            .extend_from_names(names);
    }

    /// `366`: the listing is complete, swap it in and wake pending refreshes
    pub fn on_names_end(&self, channel: &str) {
        if !self.is_primary(channel) {
            return;
        }
        let roster = lock(&self.staging).take().unwrap_or_default();
        tracing::info!("Current administrators: {}", roster);
        self.replace(roster);

        for waiter in lock(&self.waiters).drain(..) {
            let _ = waiter.send(());
        }
    }

    pub fn is_privileged(&self, nick: &str) -> bool {
        self.roster
            .read()
            .map(|r| r.contains(nick))
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> Roster {
        self.roster
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn replace(&self, roster: Roster) {
        match self.roster.write() {
            Ok(mut current) => *current = roster,
            Err(poisoned) => *poisoned.into_inner() = roster,
        }
    }

    fn is_primary(&self, channel: &str) -> bool {
        channel.eq_ignore_ascii_case(&self.channel)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
