//! Core traits, settings, schema validation, and the module registry.

pub mod module;
pub mod registry;
pub mod schema;
pub mod settings;

pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
