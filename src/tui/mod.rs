// ABOUTME: TUI module — ratatui full-screen chat interface for debatemate.
// ABOUTME: Chat display, input handling, status bar, and the terminal event loop.

pub mod input;
pub mod runner;
pub mod state;
pub mod ui;
pub mod widgets;

pub use state::*;
