//! glot - static extraction and reconciliation of i18next translation keys
//!
//! glot scans a TS/JSX source tree for i18next translation call sites,
//! resolves the keys those call sites address (including non-trivial cases:
//! ternaries, template literals, typed selector APIs, typed hook parameters),
//! expands plural/context variants per CLDR, and reconciles the result into
//! per-locale translation resource files on disk — preserving user-authored
//! content under a precise set of invariants.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (user-facing commands)
//! - `config`: Configuration file loading and parsing
//! - `engine`: the Extraction & Reconciliation Engine (the core subject)

pub mod cli;
pub mod config;
pub mod engine;
