//! Application services - Business logic orchestration

pub mod roster_service;

pub use roster_service::RosterTracker;
