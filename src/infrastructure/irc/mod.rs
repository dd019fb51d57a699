//! IRC transport - line codec and server connection

pub mod connection;
pub mod line;

pub use connection::{IrcClient, IrcConnection, IrcEvents};
pub use line::{IrcLine, RPL_ENDOFNAMES, RPL_NAMREPLY, RPL_WELCOME};
