//! Application layer - Use cases and application services
//!
//! This module contains the row processor and the sync use case that
//! coordinate domain logic over the fetch and data store collaborators.

pub mod dto;
pub mod row_processor;
pub mod sync_use_case;

// Re-export commonly used items
pub use dto::{RunReport, RunStats};
pub use row_processor::{RowError, RowOutcome, RowPolicy, RowProcessor, SkipReason, ValueSource};
pub use sync_use_case::TurnoverSync;
