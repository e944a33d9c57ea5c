//! Capacity accounting for the store

use serde::{Deserialize, Serialize};

/// 5 MiB
pub const DEFAULT_CAPACITY_BYTES: u64 = 5 * 1024 * 1024;

/// How a write is measured against the capacity ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
    /// Current total plus the incoming document, ignoring the document it
    /// replaces. Replacing a large document with a slightly larger one can be
    /// refused even though the net growth would fit.
    #[default]
    Cumulative,
    /// Current total minus the replaced document plus the incoming one
    Net,
}

impl QuotaPolicy {
    /// Total the store would hold if the write went through
    pub fn prospective_total(&self, used: u64, replaced: u64, incoming: u64) -> u64 {
        match self {
            QuotaPolicy::Cumulative => used.saturating_add(incoming),
            QuotaPolicy::Net => used.saturating_sub(replaced).saturating_add(incoming),
        }
    }

    pub fn admits(&self, capacity: u64, used: u64, replaced: u64, incoming: u64) -> bool {
        self.prospective_total(used, replaced, incoming) <= capacity
    }
}
