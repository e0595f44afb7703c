// src/rollout/mod.rs
#![forbid(unsafe_code)]

pub mod runner;
pub mod sinks;
pub mod stats;

pub use runner::{Algo, Runner, RunnerConfig};
pub use sinks::TableSink;
