//! Store Sync Common Library
//!
//! Shared pieces for every `store-sync` workspace member.
//!
//! - **Error Handling**: [`SyncError`] and the [`Result`] alias
//! - **Store Environment**: credential files for the source and target stores
//! - **Logging**: one place to install the tracing subscriber
//!
//! # Example
//!
//! ```no_run
//! use store_sync_common::{Result, StoreEnv};
//!
//! fn describe(path: &str) -> Result<()> {
//!     let env = StoreEnv::load(path)?;
//!     println!("Admin API: {}", env.admin_base_url());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod env;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use env::StoreEnv;
pub use error::{Result, SyncError};
