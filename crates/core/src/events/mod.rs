//! Monitor event emission and notification dispatch.

mod dispatcher;
mod handle;
mod types;

pub use dispatcher::{create_event_system, EventDispatcher, LogNotifier, Notifier, NotifyError};
pub use handle::EventHandle;
pub use types::{EventEnvelope, MonitorEvent};
