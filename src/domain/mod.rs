//! Domain layer - Core business objects and the contracts around them
//! 
//! This layer contains:
//! - Entities: Incoming messages, reply payloads, rosters, commands
//! - Traits: Abstractions for the network transport, handlers and storage

pub mod entities;
pub mod traits;
