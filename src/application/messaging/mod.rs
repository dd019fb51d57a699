//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod registry;
pub mod throttle;

pub use dispatcher::{Dispatch, DispatchKind, MessageDispatcher};
pub use registry::{CommandBinding, HandlerRegistry, PassiveBinding};
pub use throttle::{BroadcastReply, DirectReply, ReplyThrottle, DEFAULT_MIN_INTERVAL};
