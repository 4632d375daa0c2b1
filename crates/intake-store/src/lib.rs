//! Flight Intake Store - history persistence
//!
//! Two [`FlightHistory`](intake_core::FlightHistory) backends:
//! - [`JsonFileHistory`]: one JSON array on disk, rewritten atomically
//! - [`InMemoryHistory`]: process-local, for tests and dry runs

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod json_file;
mod memory;

pub use json_file::{JsonFileHistory, HISTORY_FILE_NAME};
pub use memory::InMemoryHistory;
