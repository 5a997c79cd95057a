//! Inline Query Blocks
//!
//! Finding query blocks in document text and splicing rendered output back
//! in after each of them.

pub mod rewriter;
pub mod scanner;

pub use rewriter::{render_section, rewrite};
pub use scanner::{scan, QueryBlock, CLOSE_FENCE, OPEN_FENCE, OUTPUT_END, OUTPUT_START};
