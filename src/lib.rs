//! Idle/activity tracker. A daemon samples evidence of user activity from
//! the input bus or an external ping and records, for every aligned
//! five-minute wall-clock window, whether the user was active during it.
//! The `report` command sums the per-day logs into hours active today and
//! this week.

pub mod cli;
pub mod daemon;
pub mod utils;
