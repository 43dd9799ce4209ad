pub use crate::ds::{AvlTree, SortField};
pub use crate::error::InvariantError;
pub use crate::rank::{RankEntry, RankIndex, Timestamp};
pub use crate::rate::RateMonitor;

#[cfg(feature = "metrics")]
pub use crate::metrics::RankMetricsSnapshot;
