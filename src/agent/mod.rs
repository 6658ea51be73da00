// ABOUTME: Agent module — completion provider seam and the streaming debate loop.
// ABOUTME: The loop owns the session and talks to the TUI over mpsc channels.

pub mod r#loop;
pub mod openai;
pub mod provider;

pub use r#loop::{DebateLoopParams, FAILURE_MARKER, fallback_reply, run_debate_loop};
pub use openai::{OpenAiClient, SseDecoder};
pub use provider::*;
