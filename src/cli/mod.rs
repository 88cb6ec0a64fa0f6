//! CLI module
//!
//! Command-line interface for the bridge.
//!
//! # Commands
//!
//! - `tables` - List table ids
//! - `validate` - Validate the connector definition
//! - `schema` - Show static or sampled table schemas
//! - `fetch` - Fetch one table as flattened JSON lines
//! - `serve` - Start the cache HTTP server

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve, ServerConfig};
