//! Processor module for the search sync pipeline.
//!
//! Turns authoritative entries into index documents: user transform,
//! redaction, publication and locale filtering, user filter, key resolution.

mod entry_processor;

pub use entry_processor::{EntryProcessor, REDACTED_FIELDS};

pub(crate) use entry_processor::log_abort;
