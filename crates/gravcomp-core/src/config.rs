use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// ParamValue
// ---------------------------------------------------------------------------

/// A single value held by the parameter store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric payload; integers are widened.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// A list whose every element is a string.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect(),
            _ => None,
        }
    }

    /// A list whose every element is numeric.
    pub fn as_f64_list(&self) -> Option<Vec<f64>> {
        match self {
            Self::List(items) => items.iter().map(Self::as_f64).collect(),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Key resolution
// ---------------------------------------------------------------------------

/// Resolve `key` against `namespace`.
///
/// Keys starting with `/` are absolute; anything else is joined onto the
/// namespace. The result is always absolute.
pub fn resolve_key(namespace: &str, key: &str) -> String {
    if key.starts_with('/') {
        return key.to_owned();
    }
    let ns = namespace.trim_end_matches('/');
    if ns.is_empty() {
        format!("/{key}")
    } else if ns.starts_with('/') {
        format!("{ns}/{key}")
    } else {
        format!("/{ns}/{key}")
    }
}

// ---------------------------------------------------------------------------
// ParamSource
// ---------------------------------------------------------------------------

/// Read access to hierarchical parameters from a fixed namespace.
///
/// Controllers receive a `&dyn ParamSource` scoped to their own namespace;
/// relative keys resolve inside it, absolute keys (leading `/`) do not.
pub trait ParamSource {
    /// Namespace relative keys are resolved against.
    fn namespace(&self) -> &str;

    /// Look up a value by relative or absolute key.
    fn get(&self, key: &str) -> Option<&ParamValue>;

    /// Look up a string value.
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    /// Look up a string value, falling back to `default` when absent.
    fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    /// Look up a list of strings. `None` if absent or any element is not a
    /// string.
    fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).and_then(ParamValue::as_string_list)
    }

    /// Look up a numeric value.
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_f64)
    }

    /// Whether a key exists.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

// ---------------------------------------------------------------------------
// ParamStore
// ---------------------------------------------------------------------------

/// In-process parameter server.
///
/// Holds absolute keys (`/ns/name`). Can be populated programmatically or
/// loaded from TOML, where nested tables become nested namespaces:
///
/// ```toml
/// robot_description = "<robot name='arm'>...</robot>"
///
/// [gravity_compensation]
/// type = "gravcomp_controllers/GravityCompensationController"
/// joints = ["shoulder", "elbow"]
/// ```
///
/// yields `/robot_description`, `/gravity_compensation/type` and
/// `/gravity_compensation/joints`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamStore {
    values: BTreeMap<String, ParamValue>,
}

impl ParamStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Relative keys are made absolute.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.values.insert(resolve_key("/", key), value.into());
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove a value, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(&resolve_key("/", key))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All absolute keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// View the store from inside `namespace`.
    pub fn scope<'a>(&'a self, namespace: &str) -> ScopedParams<'a> {
        ScopedParams {
            store: self,
            namespace: resolve_key("/", namespace.trim_start_matches('/')),
        }
    }

    /// Merge every value of `other` into this store, overwriting duplicates.
    pub fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut store = Self::new();
        flatten_table(&mut store, "", table)?;
        Ok(store)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl ParamSource for ParamStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn namespace(&self) -> &str {
        "/"
    }

    fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(&resolve_key("/", key))
    }
}

fn flatten_table(store: &mut ParamStore, prefix: &str, table: toml::Table) -> Result<(), ConfigError> {
    for (name, value) in table {
        let key = format!("{prefix}/{name}");
        match value {
            toml::Value::Table(inner) => flatten_table(store, &key, inner)?,
            other => {
                let value = convert_toml_value(&key, other)?;
                store.values.insert(key, value);
            }
        }
    }
    Ok(())
}

fn convert_toml_value(key: &str, value: toml::Value) -> Result<ParamValue, ConfigError> {
    value.try_into().map_err(|e: toml::de::Error| ConfigError::InvalidValue {
        field: key.to_owned(),
        message: format!("only scalars and arrays of scalars are supported ({e})"),
    })
}

// ---------------------------------------------------------------------------
// ScopedParams
// ---------------------------------------------------------------------------

/// A [`ParamStore`] viewed from a namespace.
#[derive(Debug, Clone)]
pub struct ScopedParams<'a> {
    store: &'a ParamStore,
    namespace: String,
}

impl ScopedParams<'_> {
    /// Descend into a child namespace.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self {
            store: self.store,
            namespace: resolve_key(&self.namespace, name),
        }
    }

    /// Values directly inside this namespace, as a TOML table. Nested
    /// namespaces are left out.
    pub fn to_table(&self) -> Result<toml::Table, ConfigError> {
        let prefix = format!("{}/", self.namespace.trim_end_matches('/'));
        let mut table = toml::Table::new();
        for (key, value) in self.store.values.range(prefix.clone()..) {
            let Some(name) = key.strip_prefix(&prefix) else {
                break;
            };
            if name.contains('/') {
                continue;
            }
            let value = toml::Value::try_from(value).map_err(|e| ConfigError::InvalidValue {
                field: key.clone(),
                message: e.to_string(),
            })?;
            table.insert(name.to_owned(), value);
        }
        Ok(table)
    }

    /// Deserialize the values of this namespace into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        toml::Value::Table(self.to_table()?)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::InvalidValue {
                field: self.namespace.clone(),
                message: e.message().to_owned(),
            })
    }
}

impl ParamSource for ScopedParams<'_> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Option<&ParamValue> {
        self.store.values.get(&resolve_key(&self.namespace, key))
    }
}

// ---------------------------------------------------------------------------
// LoopConfig
// ---------------------------------------------------------------------------

const fn default_rate_hz() -> f64 {
    1000.0
}
const fn default_ticks() -> u64 {
    1000
}

/// Control loop settings for a host driving controllers at a fixed rate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoopConfig {
    /// Update rate in Hz (default: 1000).
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,

    /// Number of updates to run before stopping (default: 1000).
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Sleep between ticks to hold wall-clock rate. Disabled runs as fast as
    /// possible.
    #[serde(default)]
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            ticks: default_ticks(),
            realtime: false,
        }
    }
}

impl LoopConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate_hz.is_finite() || self.rate_hz <= 0.0 {
            return Err(ConfigError::InvalidRate(self.rate_hz));
        }
        Ok(())
    }

    /// Update period in seconds.
    pub fn period_secs(&self) -> f64 {
        1.0 / self.rate_hz
    }

    /// Read from a parameter namespace, keeping defaults for absent keys.
    pub fn from_params(params: &ScopedParams<'_>) -> Result<Self, ConfigError> {
        let config: Self = params.deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
