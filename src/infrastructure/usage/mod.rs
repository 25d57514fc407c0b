//! Usage ledger infrastructure

mod in_memory;
mod postgres_repository;
mod service;

pub use in_memory::InMemoryUsageRepository;
pub use postgres_repository::PostgresUsageRepository;
pub use service::{
    window_start, UsageLedger, UsageLedgerTrait, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
