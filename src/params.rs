//! Raw request parameters: names, single or multi values, and adapters
//! from the urlencoded wire forms.
//!
//! A [`ParameterMap`] is the flat, string-keyed input of a binding call.
//! Keys are unique; a key sent several times collapses into one
//! [`ParameterValue::Multi`] entry. Iteration is in key order so that
//! logging and failure registration stay deterministic across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// The raw value of one parameter: a single string or a multi-value group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParameterValue {
    /// First raw element, if any. A `Multi` with no elements has none.
    pub fn first(&self) -> Option<&str> {
        match self {
            ParameterValue::Single(s) => Some(s),
            ParameterValue::Multi(v) => v.first().map(String::as_str),
        }
    }

    /// All raw elements in order; a `Single` yields one element.
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            ParameterValue::Single(s) => vec![s.as_str()],
            ParameterValue::Multi(v) => v.iter().map(String::as_str).collect(),
        }
    }

    /// Number of raw elements.
    pub fn len(&self) -> usize {
        match self {
            ParameterValue::Single(_) => 1,
            ParameterValue::Multi(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostic rendering used in error messages and failure records.
    pub fn render(&self) -> String {
        match self {
            ParameterValue::Single(s) => s.clone(),
            ParameterValue::Multi(v) => v.join(", "),
        }
    }

    /// Appends another raw element, promoting `Single` to `Multi`.
    fn push(&mut self, value: String) {
        match self {
            ParameterValue::Single(first) => {
                let first = std::mem::take(first);
                *self = ParameterValue::Multi(vec![first, value]);
            }
            ParameterValue::Multi(v) => v.push(value),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Single(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Single(value)
    }
}

impl From<Vec<String>> for ParameterValue {
    fn from(values: Vec<String>) -> Self {
        ParameterValue::Multi(values)
    }
}

impl From<Vec<&str>> for ParameterValue {
    fn from(values: Vec<&str>) -> Self {
        ParameterValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Flat parameter set for one binding call, iterated in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    entries: BTreeMap<String, ParameterValue>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Appends a raw element under `name`, accumulating repeated keys into
    /// a multi-value group the way urlencoded payloads repeat keys.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.get_mut(&name) {
            Some(existing) => existing.push(value),
            None => {
                self.entries.insert(name, ParameterValue::Single(value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a parameter map from a raw query string (`a=1&b=2&b=3`).
    pub fn from_query_string(query: &str) -> Self {
        Self::from_urlencoded(query)
    }

    /// Builds a parameter map from an `application/x-www-form-urlencoded`
    /// request body.
    pub fn from_urlencoded_body(body: &str) -> Self {
        Self::from_urlencoded(body)
    }

    fn from_urlencoded(input: &str) -> Self {
        let mut map = Self::new();
        for (name, value) in form_urlencoded::parse(input.as_bytes()).into_owned() {
            map.append(name, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}
