//! Service layer for the explorer.
//!
//! This module contains the remote collaborators:
//! - Shared HTTP plumbing (`ApiClient`)
//! - Place catalog loading (`CatalogSource`, `HttpCatalog`)
//! - Visit ledger reads and writes (`VisitLedger`, `HttpLedger`)
//! - Login, reviews and leaderboard (`CommunityClient`)
//! - In-memory stand-ins for offline use (`MemoryCatalog`, `MemoryLedger`)

mod api;
mod catalog;
mod community;
mod ledger;
mod memory;

pub use api::ApiClient;
pub use catalog::{CatalogSource, HttpCatalog, normalize_rows};
pub use community::CommunityClient;
pub use ledger::{HttpLedger, VisitLedger};
pub use memory::{MemoryCatalog, MemoryLedger};
