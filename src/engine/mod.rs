//! The extraction and reconciliation engine: parses TS/JSX-family source,
//! statically resolves translation-function call sites to candidate keys,
//! and reconciles the result against each locale's on-disk translation tree.

pub mod collector;
pub mod comment_scanner;
pub mod driver;
pub mod error;
pub mod file_scanner;
pub mod namespace;
pub mod parser;
pub mod plugin;
pub mod plural;
pub mod reconciler;
pub mod scope;
pub mod tree;
pub mod value_source;
pub mod walker;

pub use error::EngineError;
