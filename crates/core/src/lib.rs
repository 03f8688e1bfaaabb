//! Core utilities shared by the engine crates.
//!
//! Provides the foundational pieces used everywhere else:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing

mod error;
mod logging;
mod timer;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::Timer;
