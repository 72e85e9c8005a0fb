//! Thread-safe data and output bags.

use crate::errors::DataConflictError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A thread-safe bag for values shared between steps.
///
/// Writing to an existing key raises a `DataConflictError`; use
/// [`set_force`](Self::set_force) when overwriting is intended.
#[derive(Debug, Default)]
pub struct DataBag {
    data: RwLock<HashMap<String, serde_json::Value>>,
}

impl DataBag {
    /// Creates a new empty data bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a data bag from existing data.
    #[must_use]
    pub fn from_data(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Gets a value from the bag.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.data.read().get(key).cloned()
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Sets a value in the bag.
    ///
    /// # Errors
    ///
    /// Returns `DataConflictError` if the key already exists.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), DataConflictError> {
        let key = key.into();
        let mut data = self.data.write();

        if data.contains_key(&key) {
            return Err(DataConflictError::new(&key));
        }

        data.insert(key, value);
        Ok(())
    }

    /// Sets a value, allowing overwrites. Returns the previous value.
    pub fn set_force(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.data.write().insert(key.into(), value)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }
}

/// A thread-safe bag of per-step success values.
///
/// The executor writes into it; steps and callers read from it.
#[derive(Debug, Default)]
pub struct OutputBag {
    outputs: RwLock<HashMap<String, serde_json::Value>>,
}

impl OutputBag {
    /// Creates a new empty output bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the success value recorded for a step.
    #[must_use]
    pub fn get(&self, step: &str) -> Option<serde_json::Value> {
        self.outputs.read().get(step).cloned()
    }

    /// Checks if a value was recorded for a step.
    #[must_use]
    pub fn contains(&self, step: &str) -> bool {
        self.outputs.read().contains_key(step)
    }

    /// Records a step's value, returning any value it replaced.
    pub(crate) fn record(
        &self,
        step: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.outputs.write().insert(step.into(), value)
    }

    /// Returns the number of steps with outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.read().len()
    }

    /// Returns true if no outputs have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.read().is_empty()
    }

    /// Returns all step names with outputs.
    #[must_use]
    pub fn steps(&self) -> Vec<String> {
        self.outputs.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_bag_set_and_get() {
        let bag = DataBag::new();
        bag.set("key", json!("value")).unwrap();

        assert_eq!(bag.get("key"), Some(json!("value")));
        assert!(bag.contains_key("key"));
        assert!(!bag.contains_key("other"));
    }

    #[test]
    fn test_data_bag_conflict() {
        let bag = DataBag::new();
        bag.set("key", json!(1)).unwrap();

        let err = bag.set("key", json!(2)).unwrap_err();
        assert_eq!(err.key, "key");
        assert_eq!(bag.get("key"), Some(json!(1)));
    }

    #[test]
    fn test_data_bag_force_overwrites() {
        let bag = DataBag::new();
        bag.set("key", json!(1)).unwrap();

        assert_eq!(bag.set_force("key", json!(2)), Some(json!(1)));
        assert_eq!(bag.get("key"), Some(json!(2)));
        assert_eq!(bag.len(), 1);

        assert_eq!(bag.set_force("fresh", json!(3)), None);
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_data_bag_from_data() {
        let mut seed = HashMap::new();
        seed.insert("a".to_string(), json!(1));
        seed.insert("b".to_string(), json!(2));

        let bag = DataBag::from_data(seed);
        assert_eq!(bag.len(), 2);

        let mut keys = bag.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_output_bag_record_replaces() {
        let bag = OutputBag::new();
        assert!(bag.record("generate_id", json!("c-1")).is_none());
        assert_eq!(bag.record("generate_id", json!("c-2")), Some(json!("c-1")));

        assert_eq!(bag.get("generate_id"), Some(json!("c-2")));
        assert!(bag.contains("generate_id"));
        assert_eq!(bag.steps(), vec!["generate_id".to_string()]);
    }
}
