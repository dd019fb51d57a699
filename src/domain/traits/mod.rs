//! Domain traits - Abstractions for infrastructure implementations

pub mod handler;
pub mod store;
pub mod transport;

pub use handler::{
    command_fn, message_fn, CommandHandler, MessageHandler, ReplySink, SharedReplySink,
};
pub use store::MemoStore;
pub use transport::Transport;
