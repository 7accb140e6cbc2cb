//! Terminal result of a sync request.

use serde::Serialize;
use std::collections::BTreeMap;

/// Well-known keys present in every result map.
pub mod keys {
    pub const JOB_ID: &str = "job_id";
    pub const STATUS: &str = "status";
    pub const PROJECT_ID: &str = "project_id";
    pub const JOB_URL: &str = "job_url";
    pub const ELAPSED: &str = "elapsed";
    pub const FINISHED: &str = "finished";
}

/// Outcome of a sync request, produced exactly once and immutable after
/// creation.
///
/// `properties` always contains [`keys::JOB_ID`] and [`keys::STATUS`];
/// remaining entries are passthrough of remote update metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    /// True when the observed terminal state was `Succeeded`.
    pub success: bool,

    /// Job metadata for the caller (job id, final state, elapsed time, ...).
    pub properties: BTreeMap<String, String>,
}

impl SyncResult {
    /// Build a result from the success flag and metadata entries.
    pub fn new(success: bool, properties: BTreeMap<String, String>) -> Self {
        Self {
            success,
            properties,
        }
    }

    /// Convenience accessor for a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_access() {
        let mut props = BTreeMap::new();
        props.insert(keys::JOB_ID.to_string(), "17".to_string());
        props.insert(keys::STATUS.to_string(), "successful".to_string());
        let result = SyncResult::new(true, props);

        assert!(result.success);
        assert_eq!(result.get(keys::JOB_ID), Some("17"));
        assert_eq!(result.get("missing"), None);
    }

    #[test]
    fn test_serializes_to_flat_map() {
        let mut props = BTreeMap::new();
        props.insert(keys::STATUS.to_string(), "failed".to_string());
        let result = SyncResult::new(false, props);

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"status\":\"failed\""));
    }
}
