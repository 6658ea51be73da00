// ABOUTME: Session module — per-connection debate state and the per-turn activity log.
// ABOUTME: State lives in memory only; the log sinks are the sole durable trace.

pub mod log;
pub mod message;
pub mod sheets;
pub mod state;

pub use log::{ActivityLogger, JsonlSink, TurnRecord, TurnSink};
pub use message::{Message, Role};
pub use sheets::SheetsSink;
pub use state::{Session, greeting};
