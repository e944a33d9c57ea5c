use blobbox_core::{DEFAULT_CAPACITY_BYTES, QuotaPolicy};
use serde::Serialize;

/// Capacity settings a store is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub capacity_bytes: u64,
    pub policy: QuotaPolicy,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            policy: QuotaPolicy::default(),
        }
    }
}

/// A stored name and the byte length of its serialized document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub documents: u64,
    pub used_bytes: u64,
    pub capacity_bytes: u64,
}

impl StoreStats {
    pub fn remaining_bytes(&self) -> u64 {
        self.capacity_bytes.saturating_sub(self.used_bytes)
    }
}
