//! Storage access for leads, stages and stats
//!
//! Query functions take `&SqlitePool` and return `leadboard_common::Result`.

pub mod leads;
pub mod stages;
pub mod stats;
