//! IRC bot with a memo feature
//!
//! Incoming chat lines are dispatched to command or passive handlers, and
//! replies go out through a flood-control throttle.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
