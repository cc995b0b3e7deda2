//! Report store trait

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Key/value store addressed by slash-separated paths
#[async_trait]
pub trait ReportStore: Send + Sync + std::fmt::Debug {
    /// Write `value` at `path`, replacing whatever was there
    async fn set(&self, path: &str, value: serde_json::Value) -> crate::Result<()>;

    /// Read the value at `path`; `Value::Null` when nothing is stored
    async fn get(&self, path: &str) -> crate::Result<serde_json::Value>;
}

/// In-process store with the same path semantics as the remote database:
/// reading a parent path returns an object of its children.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn set(&self, path: &str, value: serde_json::Value) -> crate::Result<()> {
        self.entries.write().await.insert(normalize(path), value);
        Ok(())
    }

    async fn get(&self, path: &str) -> crate::Result<serde_json::Value> {
        let path = normalize(path);
        let entries = self.entries.read().await;
        if let Some(value) = entries.get(&path) {
            return Ok(value.clone());
        }

        let prefix = format!("{}/", path);
        let children: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .filter_map(|(key, value)| {
                let child = key.strip_prefix(&prefix)?;
                (!child.contains('/')).then(|| (child.to_string(), value.clone()))
            })
            .collect();

        if children.is_empty() {
            Ok(serde_json::Value::Null)
        } else {
            Ok(serde_json::Value::Object(children))
        }
    }
}
