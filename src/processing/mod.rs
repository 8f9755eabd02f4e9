//! Processing module for input discovery and per-file work.
//!
//! This module provides:
//! - Target discovery with per-directory ignore files
//! - Path normalization for report entries
//! - The per-file load, extract and render pipeline

pub mod file_processor;
pub mod filter;

pub use file_processor::{normalize_path, render_signature, FileProcessor};
pub use filter::{Discovered, FileDiscovery, IgnoreList};
