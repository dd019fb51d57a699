//! Domain entities - Core business objects

pub mod command;
pub mod memo;
pub mod message;
pub mod roster;

pub use command::Command;
pub use memo::Memo;
pub use message::{is_channel_name, IncomingMessage, ReplyPayload};
pub use roster::{Roster, PRIVILEGE_MARKER};
