//! Generation streams and vanity search.
//!
//! This module provides:
//! - The cooperative vanity searcher
//! - One self-rescheduling stream per category
//! - Per-stream statistics and shutdown signalling

mod scheduler;
mod search;
mod stop;

pub use scheduler::{GenerationScheduler, Pacing, StreamSpec};
pub use search::{StreamState, StreamStats, VanitySearcher, DEFAULT_YIELD_EVERY};
pub use stop::{stop_channel, StopHandle, StopSignal};
