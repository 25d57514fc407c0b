//! Usage accounting domain
//!
//! Per-request usage records written by the gate and the statistics derived
//! from them.

mod record;
mod repository;
mod stats;

pub use record::{UsageRecord, UsageRecordId, UNKNOWN};
#[cfg(test)]
pub use repository::MockUsageRepository;
pub use repository::{UsageQuery, UsageRepository};
pub use stats::UsageStats;
