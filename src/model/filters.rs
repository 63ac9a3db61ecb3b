//! Column equality filters for reads, deletes and updates.

use std::collections::BTreeMap;

use super::value::Value;

/// A set of `column = value` constraints, kept sorted by column name.
///
/// Sorting makes the filter order irrelevant both to the generated SQL and
/// to the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filters(BTreeMap<String, Value>);

impl Filters {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert.
  pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
    self.insert(column, value);
    self
  }

  pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
    self.0.insert(column.into(), value.into());
  }

  pub fn get(&self, column: &str) -> Option<&Value> {
    self.0.get(column)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filters {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut filters = Filters::new();
    for (k, v) in iter {
      filters.insert(k, v);
    }
    filters
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_order_independent() {
    let a = Filters::new().with("id", 1).with("name", "x");
    let b = Filters::new().with("name", "x").with("id", 1);
    assert_eq!(a, b);
    assert_eq!(a.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["id", "name"]);
  }

  #[test]
  fn test_values_compared_structurally() {
    let a = Filters::new().with("id", 1);
    let b = Filters::new().with("id", "1");
    assert_ne!(a, b);
  }

  #[test]
  fn test_later_insert_wins() {
    let f: Filters = vec![("id", 1), ("id", 2)].into_iter().collect();
    assert_eq!(f.len(), 1);
    assert_eq!(f.get("id"), Some(&Value::Int(2)));
  }
}
