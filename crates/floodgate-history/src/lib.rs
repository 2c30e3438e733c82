//! floodgate-history — the append-only sample log.
//!
//! # Format
//!
//! ```text
//! 1700000000 4210
//! 1700000300 4211
//! ```
//!
//! One `timestamp value` record per line, newline terminated, no header.
//! Every operation opens and releases the file; nothing is held between
//! calls, so the log can be inspected or edited by hand between runs.
//!
//! A missing file reads as an empty history. Compaction rewrites the log
//! through a sibling temp file and an atomic rename.

pub mod store;

pub use store::HistoryLog;
