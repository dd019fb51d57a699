//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Bot: Composition root and lifecycle
//! - Services: Roster tracking
//! - Errors: Domain-specific errors
//! - Messaging: Handler registry, dispatching, reply throttling

pub mod bot;
pub mod errors;
pub mod services;
pub mod messaging;

pub use bot::{Bot, BotSettings, BotState};
