// ABOUTME: Library root for debatemate — re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod agent;
pub mod app;
pub mod config;
pub mod error;
pub mod prompt;
pub mod session;
pub mod telemetry;
pub mod topic;
pub mod tui;
