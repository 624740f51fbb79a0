//! Process-wide logging setup for schtick nodes.

mod logger;
pub use logger::*;
