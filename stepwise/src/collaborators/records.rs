//! Partition/sort keyed record store interface.

use super::CollaboratorError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Two-part record identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// The partition key.
    pub partition: String,
    /// The sort key.
    pub sort: String,
}

impl RecordKey {
    /// Creates a record key.
    #[must_use]
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition, self.sort)
    }
}

/// A query over one partition, optionally narrowed by sort-key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyExpression {
    /// The partition to read.
    pub partition: String,
    /// Only sort keys starting with this prefix match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_prefix: Option<String>,
}

impl KeyExpression {
    /// Matches every record in a partition.
    #[must_use]
    pub fn partition(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort_prefix: None,
        }
    }

    /// Narrows to sort keys beginning with `prefix`.
    #[must_use]
    pub fn sort_begins_with(mut self, prefix: impl Into<String>) -> Self {
        self.sort_prefix = Some(prefix.into());
        self
    }

    /// Returns true if `key` satisfies the expression.
    #[must_use]
    pub fn matches(&self, key: &RecordKey) -> bool {
        key.partition == self.partition
            && self
                .sort_prefix
                .as_deref()
                .map_or(true, |prefix| key.sort.starts_with(prefix))
    }
}

/// A stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The record key.
    pub key: RecordKey,
    /// Non-key attributes.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Creates a record with no attributes.
    #[must_use]
    pub fn new(key: RecordKey) -> Self {
        Self {
            key,
            attributes: Map::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Reads an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// The record store operations steps may wrap.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every record matching the expression, in sort-key order.
    async fn query(&self, expression: &KeyExpression) -> Result<Vec<Record>, CollaboratorError>;

    /// Writes a record, replacing any record with the same key.
    async fn put(&self, record: Record) -> Result<Record, CollaboratorError>;

    /// Merges `patch` into an existing record's attributes.
    async fn update(
        &self,
        key: &RecordKey,
        patch: Map<String, Value>,
    ) -> Result<Record, CollaboratorError>;

    /// Deletes a record. Deleting a missing record succeeds.
    async fn delete(&self, key: &RecordKey) -> Result<(), CollaboratorError>;
}

/// A record store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<RecordKey, Record>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a record directly.
    #[must_use]
    pub fn get(&self, key: &RecordKey) -> Option<Record> {
        self.records.read().get(key).cloned()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn query(&self, expression: &KeyExpression) -> Result<Vec<Record>, CollaboratorError> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|record| expression.matches(&record.key))
            .cloned()
            .collect())
    }

    async fn put(&self, record: Record) -> Result<Record, CollaboratorError> {
        self.records.write().insert(record.key.clone(), record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        key: &RecordKey,
        patch: Map<String, Value>,
    ) -> Result<Record, CollaboratorError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(key)
            .ok_or_else(|| CollaboratorError::NotFound(key.to_string()))?;
        record.attributes.extend(patch);
        Ok(record.clone())
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), CollaboratorError> {
        self.records.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(partition: &str, sort: &str) -> Record {
        Record::new(RecordKey::new(partition, sort)).with_attribute("name", json!("Acme"))
    }

    #[tokio::test]
    async fn test_put_and_query() {
        let store = InMemoryRecordStore::new();
        store.put(client("client#1", "profile")).await.unwrap();
        store.put(client("client#1", "report#2024")).await.unwrap();
        store.put(client("client#1", "report#2025")).await.unwrap();
        store.put(client("client#2", "profile")).await.unwrap();

        let all = store
            .query(&KeyExpression::partition("client#1"))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let reports = store
            .query(&KeyExpression::partition("client#1").sort_begins_with("report#"))
            .await
            .unwrap();
        let sorts: Vec<_> = reports.iter().map(|r| r.key.sort.as_str()).collect();
        assert_eq!(sorts, vec!["report#2024", "report#2025"]);
    }

    #[tokio::test]
    async fn test_update_merges_attributes() {
        let store = InMemoryRecordStore::new();
        let key = RecordKey::new("client#1", "profile");
        store.put(client("client#1", "profile")).await.unwrap();

        let mut patch = Map::new();
        patch.insert("tier".to_string(), json!("gold"));
        let updated = store.update(&key, patch).await.unwrap();

        assert_eq!(updated.get("name"), Some(&json!("Acme")));
        assert_eq!(updated.get("tier"), Some(&json!("gold")));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = InMemoryRecordStore::new();
        let err = store
            .update(&RecordKey::new("client#9", "profile"), Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::NotFound(ref key) if key == "client#9/profile"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryRecordStore::new();
        let key = RecordKey::new("client#1", "profile");
        store.put(client("client#1", "profile")).await.unwrap();

        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(store.is_empty());
    }
}
