//! Notification preference domain: model, mapping table, diff engine,
//! snapshot store, and the sync orchestrator.

mod diff;
mod mapping;
mod model;
mod snapshot_store;
mod sync_service;

pub use diff::*;
pub use mapping::*;
pub use model::*;
pub use snapshot_store::*;
pub use sync_service::*;
