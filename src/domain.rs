//! Domain module - Core business logic and entities
//!
//! This module contains the sheet schema, company identities, the fetch
//! cache and the collaborator interfaces the sync pipeline depends on.

pub mod errors;
pub mod identity;
pub mod repositories;
pub mod sheet;
pub mod slug;
pub mod value_objects;

// Re-export commonly used items for convenience
pub use errors::{FetchError, PersistError, SchemaError, SyncError};
pub use identity::{Identity, IdentityCache};
pub use repositories::{DataStore, FetchClient, Grid};
pub use sheet::{ColumnLayout, ColumnNames, CompanyRow, SheetSchema, cell_position};
pub use slug::derive_slug;
pub use value_objects::{CellPosition, FetchedValue, NOT_FOUND_SENTINEL};
