//! Command-line front end for Tool Studio jobs.

pub mod cli;
pub mod config;
pub mod downloads;
pub mod effects;
pub mod logging;
pub mod persistence;
pub mod render;
pub mod session;

pub use config::StudioConfig;
pub use render::{format_view, Renderer, TerminalRenderer};
pub use session::Session;
