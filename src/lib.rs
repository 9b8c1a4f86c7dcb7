// ABOUTME: Library root for rollout - exposes the lifecycle engine, stores, and event sinks.
// ABOUTME: The main binary is in main.rs.

pub mod clock;
pub mod config;
pub mod deploy;
pub mod error;
pub mod events;
pub mod hooks;
pub mod output;
pub mod store;
pub mod types;
