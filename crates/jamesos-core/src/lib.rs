pub mod entry;
pub mod ids;

pub use entry::{LogCategory, LogEntry, LogLevel, NewLog};
pub use ids::{LogId, SessionId};
