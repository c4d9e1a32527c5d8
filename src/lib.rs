pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod mcp;
pub mod search;
pub mod session;
pub mod spirit;
pub mod state;
pub mod storage;

pub use config::ScrollsConfig;
pub use error::{Result, ScrollError};
pub use mcp::ScrollsServer;
pub use session::Session;
