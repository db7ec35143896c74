//! Count comparison between the source and target stores
//!
//! Each target is counted on both sides with `GET /<target>/count.json`. A
//! failed count is reported as `-1` for that side and the comparison goes on.

use crate::api::endpoints;
use crate::api::AdminApi;
use reqwest::Method;
use std::fmt;
use tracing::{debug, warn};

/// REST resources compared by `verify`, in report order.
pub const COUNT_TARGETS: [&str; 7] = [
    "products",
    "custom_collections",
    "smart_collections",
    "pages",
    "blogs",
    "articles",
    "files",
];

/// Count reported when the request fails.
pub const UNKNOWN_COUNT: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStatus {
    Ok,
    Low,
}

impl fmt::Display for CountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountStatus::Ok => f.write_str("OK"),
            CountStatus::Low => f.write_str("LOW"),
        }
    }
}

/// One line of the comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRow {
    pub target: String,
    pub source: i64,
    pub dest: i64,
}

impl CountRow {
    /// The target must hold at least as many records as the source.
    pub fn status(&self) -> CountStatus {
        if self.dest >= self.source {
            CountStatus::Ok
        } else {
            CountStatus::Low
        }
    }
}

impl fmt::Display for CountRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: prod={} dev={} {}",
            self.target,
            self.source,
            self.dest,
            self.status()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub rows: Vec<CountRow>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.rows.iter().all(|row| row.status() == CountStatus::Ok)
    }

    pub fn low(&self) -> impl Iterator<Item = &CountRow> {
        self.rows
            .iter()
            .filter(|row| row.status() == CountStatus::Low)
    }
}

/// Record count of `target`, or [`UNKNOWN_COUNT`] if it cannot be read.
pub async fn count(api: &dyn AdminApi, target: &str) -> i64 {
    let path = endpoints::count_path(target);
    match api.rest(Method::GET, &path, None).await {
        Ok(body) => match body.get("count").and_then(|c| c.as_i64()) {
            Some(n) => n,
            None => {
                warn!(resource = target, body = %body, "Count response without a count");
                UNKNOWN_COUNT
            }
        },
        Err(err) => {
            warn!(resource = target, error = %err, "Count request failed");
            UNKNOWN_COUNT
        }
    }
}

/// Compare every count target between `source` and `dest`.
pub async fn compare(source: &dyn AdminApi, dest: &dyn AdminApi) -> VerifyReport {
    let mut rows = Vec::with_capacity(COUNT_TARGETS.len());
    for target in COUNT_TARGETS {
        let row = CountRow {
            target: target.to_string(),
            source: count(source, target).await,
            dest: count(dest, target).await,
        };
        debug!(resource = target, source = row.source, dest = row.dest, "Compared");
        rows.push(row);
    }
    VerifyReport { rows }
}
