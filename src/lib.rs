//! Shelf application library
//!
//! Wires the book module into the kernel and exposes the process entry
//! points used by the `shelf-app` binary and the `shelf` CLI.

pub mod app;
pub mod modules;
