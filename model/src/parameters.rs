use crate::constants::{PARAM_MANAGEMENT_CERTIFICATE, REDACTED, SECURE_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

/// The free-form string parameters of a cloud profile as they are handed to us by the fleet
/// manager.
///
/// Keys starting with [`SECURE_PREFIX`] and the management certificate are secrets. The `Debug`
/// implementation masks their values, so it is safe to log a `ClientParameters`.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientParameters(BTreeMap<String, String>);

impl ClientParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or `None` if it is absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the value for `key` with surrounding whitespace removed, treating an empty value
    /// the same as an absent one.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the value stored under `key` must be treated as a secret.
    pub fn is_secret_key(key: &str) -> bool {
        key.starts_with(SECURE_PREFIX) || key == PARAM_MANAGEMENT_CERTIFICATE
    }
}

impl From<BTreeMap<String, String>> for ClientParameters {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for ClientParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Debug for ClientParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| {
                if Self::is_secret_key(k) {
                    (k.as_str(), REDACTED)
                } else {
                    (k.as_str(), v.as_str())
                }
            }))
            .finish()
    }
}
