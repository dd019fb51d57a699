//! Plugin system - feature modules built on the dispatch core

pub mod help;
pub mod manager;
pub mod memo;
pub mod trait_def;

pub use help::HelpPlugin;
pub use manager::{install_plugin, PluginManager};
pub use memo::MemoPlugin;
pub use trait_def::{Plugin, ReplyRoute};
