//! In-memory stand-ins for the OS boundary.
//!
//! `MockRunner` answers vendor commands with canned text and `MockSystem`
//! serves a synthetic CPU/memory/process table, so collectors and the sample
//! loop can be tested without GPUs or particular processes.

mod runner;
mod system;

pub use runner::{MockResponse, MockRunner};
pub use system::MockSystem;
