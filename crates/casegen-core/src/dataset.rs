use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named field values produced by one generation pass.
///
/// A value of `None` records that the field was generated as null. Fixed
/// values are supplied by the caller and turned into fixed-value overrides
/// by the generator.
pub trait DataSet {
    fn value(&self, key: &str) -> Option<&str>;
    fn contains(&self, key: &str) -> bool;
    fn put(&mut self, key: &str, value: Option<String>);
    fn keys(&self) -> Vec<String>;

    fn fixed_value(&self, key: &str) -> Option<&str>;
    fn set_fixed_value(&mut self, key: &str, value: String);
    fn reset_fixed_value(&mut self, key: &str);
    fn fixed_keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryDataSet {
    values: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fixed: BTreeMap<String, String>,
}

impl InMemoryDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &BTreeMap<String, Option<String>> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl DataSet for InMemoryDataSet {
    fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|value| value.as_deref())
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn put(&mut self, key: &str, value: Option<String>) {
        self.values.insert(key.to_string(), value);
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn fixed_value(&self, key: &str) -> Option<&str> {
        self.fixed.get(key).map(|value| value.as_str())
    }

    fn set_fixed_value(&mut self, key: &str, value: String) {
        self.fixed.insert(key.to_string(), value);
    }

    fn reset_fixed_value(&mut self, key: &str) {
        self.fixed.remove(key);
    }

    fn fixed_keys(&self) -> Vec<String> {
        self.fixed.keys().cloned().collect()
    }
}
