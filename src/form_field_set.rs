use std::collections::BTreeMap;

use serde::Serialize;
use url::form_urlencoded;

/// Decoded form values keyed by field name.
///
/// Keys are kept sorted; the values under one key stay in the order they
/// were read so repeated fields (checkbox groups and the like) are never
/// reordered.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormFieldSet(BTreeMap<String, Vec<String>>);

impl FormFieldSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.0.entry(key.into()).or_default().push(value.into());
  }

  pub fn get(&self, key: &str) -> Option<&[String]> {
    self.0.get(key).map(Vec::as_slice)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .0
      .iter()
      .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
  }

  /// `application/x-www-form-urlencoded` wire format.
  pub fn encode(&self) -> String {
    form_urlencoded::Serializer::new(String::new())
      .extend_pairs(self.iter())
      .finish()
  }
}
