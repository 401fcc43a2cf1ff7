//! HTTP API module.
//!
//! HTTP server, response types and the progress log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use types::*;
