//! Metadata attached to stored vectors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata carried alongside a stored vector.
///
/// `created_at` is stamped by the facade at insert time and is preserved
/// across `Save`/`Load` round trips rather than recomputed on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, Value>>,
}

impl VectorMetadata {
    /// Creates metadata stamped with the current time and no tags.
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            tags: None,
        }
    }

    /// Creates metadata stamped with the current time and the given tags.
    pub fn with_tags(tags: HashMap<String, Value>) -> Self {
        Self {
            created_at: Utc::now(),
            tags: Some(tags),
        }
    }
}

impl Default for VectorMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_tags() {
        let m = VectorMetadata::new();
        assert!(m.tags.is_none());
    }

    #[test]
    fn with_tags_round_trips_through_json() {
        let mut tags = HashMap::new();
        tags.insert("source".to_string(), Value::String("catalog".to_string()));
        let m = VectorMetadata::with_tags(tags);
        let json = serde_json::to_string(&m).unwrap();
        let back: VectorMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
