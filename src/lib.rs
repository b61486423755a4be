//! Parallel prime counting over large files of little-endian u64 records.
//!
//! The input is split into segments, scanned by a fixed pool of worker
//! threads using chunked positioned reads, and the per-segment counts are
//! reduced into a single total.

pub mod cli;
pub mod config;
pub mod constants;
pub mod generate;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod prime;
pub mod segment;
pub mod util;
