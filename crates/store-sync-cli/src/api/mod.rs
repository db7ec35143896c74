//! Admin API access
//!
//! HTTP client, endpoint builders, wire types and the paginated reader shared
//! by every subcommand.

pub mod client;
pub mod endpoints;
pub mod paginate;
pub mod retry;
pub mod types;

pub use client::{AdminApi, AdminClient};
pub use paginate::paginate;
pub use retry::RetryPolicy;
pub use types::*;
