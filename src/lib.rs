//! Command line tracker for task performance. Each record compares how long a task
//! actually took against its target duration, and summaries aggregate the resulting
//! percentages over day/week/month windows.
//!

pub mod cli;
pub mod engine;
pub mod storage;
pub mod utils;
