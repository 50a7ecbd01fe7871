//! Query-string construction for API calls.
//!
//! List values are sent the way the REST API expects multiple values under one
//! field: the key is repeated with a literal `[]` suffix, one pair per element
//! (`names[]=Apdex&names[]=EndUser%2FApdex`).

use std::fmt::Display;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Scalar(String),
    Bool(bool),
    List(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Scalar(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Scalar(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::Scalar(v.to_string())
    }
}

impl From<u64> for QueryValue {
    fn from(v: u64) -> Self {
        QueryValue::Scalar(v.to_string())
    }
}

impl<T: Display> From<Vec<T>> for QueryValue {
    fn from(v: Vec<T>) -> Self {
        QueryValue::List(v.iter().map(ToString::to_string).collect())
    }
}

/// Ordered query parameters, built fresh for every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Set `key` only when a value is present.
    pub fn set_opt<T>(&mut self, key: impl Into<String>, value: Option<T>) -> &mut Self
    where
        T: Into<QueryValue>,
    {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Copy every pair of `other` over this set.
    pub fn extend(&mut self, other: &QueryParams) -> &mut Self {
        for (k, v) in &other.pairs {
            self.set(k.clone(), v.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as a URL query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        for (key, value) in &self.pairs {
            let key_enc = urlencoding::encode(key);
            match value {
                QueryValue::Scalar(s) => {
                    parts.push(format!("{}={}", key_enc, urlencoding::encode(s)));
                }
                QueryValue::Bool(b) => parts.push(format!("{}={}", key_enc, b)),
                QueryValue::List(items) => {
                    for item in items {
                        parts.push(format!("{}[]={}", key_enc, urlencoding::encode(item)));
                    }
                }
            }
        }
        parts.join("&")
    }
}
