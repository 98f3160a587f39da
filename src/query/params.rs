//! Request parameter resolution.
//!
//! Sources are applied lowest precedence first: path segments, then JSON
//! body fields, then URL query values.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::query::error::{QueryError, QueryResult};

/// Merged request parameters keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap(HashMap<String, Value>);

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Build the parameter map for one request.
///
/// `body` may be empty. A non-empty body must be a JSON object; nested
/// values are carried through untouched. Only the first occurrence of a
/// repeated query key is used.
pub fn resolve_params(
    path_params: &HashMap<String, String>,
    body: &[u8],
    query: Option<&str>,
) -> QueryResult<ParamMap> {
    let mut params = ParamMap::new();

    for (key, value) in path_params {
        params.insert(key.clone(), Value::String(value.clone()));
    }

    for (key, value) in parse_body(body)? {
        params.insert(key, value);
    }

    // Query values are always strings.
    if let Some(query) = query {
        let mut seen = HashSet::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if seen.insert(key.clone()) {
                params.insert(key.into_owned(), Value::String(value.into_owned()));
            }
        }
    }

    Ok(params)
}

fn parse_body(body: &[u8]) -> QueryResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    serde_json::from_slice::<Map<String, Value>>(body)
        .map_err(|e| QueryError::RequestBodyParse(e.to_string()))
}
