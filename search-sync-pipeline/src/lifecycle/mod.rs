//! Lifecycle module for the search sync pipeline.
//!
//! Subscribes to the primary store's notifications and turns them into index
//! mutations.

mod capture;
mod subscriber;

pub use capture::{CapturedEntries, DeleteCaptureStore, DEFAULT_CAPTURE_TTL};
pub use subscriber::LifecycleSubscriber;
