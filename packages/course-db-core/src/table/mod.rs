//! Ordered in-memory tables keyed by store-assigned ids.

mod query;
#[allow(clippy::module_inception)]
mod table;

pub use query::QueryParams;
pub use table::{Table, TableSnapshot};
