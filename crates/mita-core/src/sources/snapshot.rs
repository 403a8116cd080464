//! Data source backed by a fixed JSON snapshot

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::allocation::CategoryAllocation;
use crate::error::Result;
use crate::models::{BehaviorProfile, PeerData, SpendingHistory, UserProfile};

use super::BudgetDataSource;

/// Everything a collaborator can provide, each part optional
///
/// ```json
/// {
///   "profile": {"location": "Boston, MA", "goals": ["travel"]},
///   "history": {"food": 420.0, "housing": 1500.0},
///   "behavior": {"spending_personality": "conservative", "key_traits": []},
///   "peers": {"food": {"peer_average": 380.0}}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub history: Option<SpendingHistory>,
    #[serde(default)]
    pub behavior: Option<BehaviorProfile>,
    #[serde(default)]
    pub peers: Option<PeerData>,
    #[serde(default)]
    pub backend_allocation: Option<CategoryAllocation>,
}

/// Serves a `DataSnapshot` loaded once from memory or disk
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    data: DataSnapshot,
    origin: String,
}

impl SnapshotSource {
    pub fn new(data: DataSnapshot) -> Self {
        Self {
            data,
            origin: "snapshot://memory".to_string(),
        }
    }

    /// Read a snapshot from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let data: DataSnapshot = serde_json::from_str(&content)?;
        Ok(Self {
            data,
            origin: format!("file://{}", path.display()),
        })
    }

    pub fn data(&self) -> &DataSnapshot {
        &self.data
    }
}

#[async_trait]
impl BudgetDataSource for SnapshotSource {
    async fn fetch_user_profile(&self) -> Result<Option<UserProfile>> {
        Ok(self.data.profile.clone())
    }

    async fn fetch_spending_history(&self) -> Result<Option<SpendingHistory>> {
        Ok(self.data.history.clone())
    }

    async fn fetch_behavioral_analysis(&self) -> Result<Option<BehaviorProfile>> {
        Ok(self.data.behavior.clone())
    }

    async fn fetch_peer_comparison(&self) -> Result<Option<PeerData>> {
        Ok(self.data.peers.clone())
    }

    async fn fetch_backend_allocation(&self, _income: f64) -> Result<Option<CategoryAllocation>> {
        Ok(self.data.backend_allocation.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn host(&self) -> &str {
        &self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{Goal, SpendingPersonality};
    use std::io::Write;

    #[tokio::test]
    async fn test_load_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "profile": {{"location": "Boston, MA", "goals": ["travel"]}},
                "behavior": {{"spending_personality": "conservative"}},
                "peers": {{"food": {{"peer_average": 380.0}}}}
            }}"#
        )
        .unwrap();

        let source = SnapshotSource::from_file(file.path()).unwrap();
        assert!(source.host().starts_with("file://"));

        let profile = source.fetch_user_profile().await.unwrap().unwrap();
        assert_eq!(profile.goals, vec![Goal::Travel]);

        let behavior = source.fetch_behavioral_analysis().await.unwrap().unwrap();
        assert_eq!(
            behavior.spending_personality,
            SpendingPersonality::Conservative
        );
        assert!(behavior.key_traits.is_empty());

        assert!(source.fetch_spending_history().await.unwrap().is_none());
        let peers = source.fetch_peer_comparison().await.unwrap().unwrap();
        assert_eq!(peers["food"].peer_average, 380.0);
    }

    #[test]
    fn test_missing_file() {
        let err = SnapshotSource::from_file("/nonexistent/snapshot.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = SnapshotSource::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
