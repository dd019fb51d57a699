use std::fmt;
use std::sync::Arc;

use crate::domain::traits::Transport;

/// A chat line received from the network.
///
/// Built once per inbound `PRIVMSG` and never mutated afterwards; handlers
/// receive a clone.
#[derive(Clone)]
pub struct IncomingMessage {
    pub sender: String,
    /// Channel name, or the bot's own nick for a direct message
    pub origin: String,
    pub text: String,
    pub connection: Arc<dyn Transport>,
}

impl IncomingMessage {
    pub fn new(
        sender: impl Into<String>,
        origin: impl Into<String>,
        text: impl Into<String>,
        connection: Arc<dyn Transport>,
    ) -> Self {
        Self {
            sender: sender.into(),
            origin: origin.into(),
            text: text.into(),
            connection,
        }
    }

    /// Whitespace-delimited tokens of the text
    pub fn fields(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }

    /// First token, the candidate command trigger
    pub fn trigger(&self) -> Option<&str> {
        self.text.split_whitespace().next()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn from_channel(&self) -> bool {
        is_channel_name(&self.origin)
    }

    /// Where an answer to this message should go: the channel it was posted
    /// in, or the sender for a direct message.
    pub fn reply_target(&self) -> &str {
        if self.from_channel() {
            self.origin.trim()
        } else {
            &self.sender
        }
    }
}

impl fmt::Debug for IncomingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingMessage")
            .field("sender", &self.sender)
            .field("origin", &self.origin)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

pub fn is_channel_name(name: &str) -> bool {
    let name = name.trim();
    name.starts_with('#') || name.starts_with('&')
}

/// Reply produced by a handler.
///
/// `target` left unset means "the default channel" for a broadcast sink and
/// "do not answer" for a direct sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPayload {
    pub message: String,
    pub target: Option<String>,
}

impl ReplyPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target: None,
        }
    }

    pub fn to(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target: Some(target.into()),
        }
    }

    /// The explicit destination, if one was set and is not blank
    pub fn destination(&self) -> Option<&str> {
        self.target
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
