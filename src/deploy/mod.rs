//! Deploy Module - the deployment tree the views render
//!
//! Key types:
//! - `DeployItem`: one resource, child blueprint or link
//! - `DeployTree`: changeset + event projection, keyed by item path
//! - `DeploySummary`: per-kind outcome counts

mod item;
mod summary;
mod tree;

pub use item::{format_duration_ms, join_path, DeployItem, ItemDurations, ItemKind, ItemStatus};
pub use summary::{DeploySummary, KindCounts};
pub use tree::{DeployTree, FinishInfo, ItemId, TreeChange, DEFAULT_PENDING_LIMIT};
