//! Process exit codes. Part of the CLI contract.

use rigor_core::ReportStatus;

pub const SUCCESS: i32 = 0; // Complete or served from cache
pub const DEGRADED: i32 = 1; // Scored with failed adapters, or no score (unusable input)
pub const CONFIG_ERROR: i32 = 2; // Bad config, unreadable input, cache IO

pub fn for_status(status: &ReportStatus) -> i32 {
    match status {
        ReportStatus::Complete | ReportStatus::Cached => SUCCESS,
        ReportStatus::Degraded | ReportStatus::Partial { .. } => DEGRADED,
    }
}
