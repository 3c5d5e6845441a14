//! Name search over a directory tree or a finished index.

mod engine;

// Re-export main types
pub use engine::SearchEngine;
