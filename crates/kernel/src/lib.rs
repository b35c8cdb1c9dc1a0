//! Core traits, layered settings, and the module registry shared by every
//! booklist crate.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
