//! Library crate for userdeck.
//!
//! This crate exposes the building blocks of the TUI:
//! - Remote user service port and HTTP adapter (`api`)
//! - Application state, settings, keymap and update loop (`app`)
//! - Command line arguments (`cli`)
//! - List-and-search controller driving background requests (`controller`)
//! - Error and result types (`error`)
//! - In-memory search helpers (`search`)
//! - Normalized record cache (`store`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `userdeck` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod cli;
pub mod controller;
pub mod error;
pub mod search;
pub mod store;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
