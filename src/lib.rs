//! Booklist application library
//!
//! Application modules, the service bootstrap, and shared utilities.

pub mod app;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
