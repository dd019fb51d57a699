//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Database: Memo persistence
//! - IRC: Line codec and server connection

pub mod config;
pub mod database;
pub mod irc;
