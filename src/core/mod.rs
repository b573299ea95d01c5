//! Core business logic abstractions

pub mod allocation;
pub mod cache;
pub mod config;
pub mod error;
pub mod fund;
pub mod log;
pub mod series;
pub mod source;

// Re-export main types for cleaner imports
pub use allocation::{AllocationRow, AllocationSlice, AssetClass};
pub use cache::FundStore;
pub use error::FundError;
pub use fund::{DateRange, Fund, FundKind, InfoRow, Observation};
pub use series::{HistoricalPoint, SeriesKind};
pub use source::{FundDataSource, SessionToken};
