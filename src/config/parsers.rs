//! Parsers for extension settings given on the command line or in a config file.

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// A single extension setting built from a key and its value.
pub trait SettingEntry: Sized {
    fn from_pair(key: String, value: String) -> Result<Self, String>;

    /// Parse `KEY=VALUE`, splitting on the first `=`.
    fn from_assignment(s: &str) -> Result<Self, String> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
        Self::from_pair(key.to_string(), value.to_string())
    }
}

fn setting_key(key: String) -> Result<String, String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(format!("empty setting key in '{}'", key));
    }
    Ok(trimmed.to_string())
}

// Settings are strings on the wire. Scalars in a config file are stringified.
#[derive(Deserialize)]
#[serde(untagged)]
enum SettingValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Float(f64),
}

impl From<SettingValue> for String {
    fn from(value: SettingValue) -> Self {
        match value {
            SettingValue::Text(s) => s,
            SettingValue::Flag(b) => b.to_string(),
            SettingValue::Integer(i) => i.to_string(),
            SettingValue::Float(f) => f.to_string(),
        }
    }
}

/// Deserializes extension settings written as a list of `"KEY=VALUE"`
/// strings, a list of `{ key, value }` tables, or a single `key = value`
/// table.
///
/// Entries keep the order they appear in the document.
pub fn settings_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: SettingEntry,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Assignment(String),
        Pair { key: String, value: SettingValue },
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Settings {
        List(Vec<Entry>),
        Table(IndexMap<String, SettingValue>),
    }

    let entries = match Settings::deserialize(deserializer)? {
        Settings::List(entries) => entries
            .into_iter()
            .map(|entry| match entry {
                Entry::Assignment(s) => T::from_assignment(&s),
                Entry::Pair { key, value } => T::from_pair(key, value.into()),
            })
            .collect::<Result<Vec<T>, String>>(),
        Settings::Table(table) => table
            .into_iter()
            .map(|(key, value)| T::from_pair(key, value.into()))
            .collect::<Result<Vec<T>, String>>(),
    };
    entries.map_err(serde::de::Error::custom)
}

/// Appends items from `top` to `base`, regardless of duplicates.
pub fn vec_extend<T>(mut base: Vec<T>, top: Vec<T>) -> Vec<T> {
    base.extend(top);
    base
}

/// A `KEY=VALUE` configuration setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl SettingEntry for Setting {
    fn from_pair(key: String, value: String) -> Result<Self, String> {
        Ok(Self {
            key: setting_key(key)?,
            value,
        })
    }
}

impl FromStr for Setting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_assignment(s)
    }
}

/// A `KEY=VALUE` protected setting. The value never shows up in `Debug`.
#[derive(Debug, Clone)]
pub struct ProtectedSetting {
    pub key: String,
    pub value: SecretString,
}

impl SettingEntry for ProtectedSetting {
    fn from_pair(key: String, value: String) -> Result<Self, String> {
        Ok(Self {
            key: setting_key(key)?,
            value: SecretString::from(value),
        })
    }
}

impl FromStr for ProtectedSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_assignment(s)
    }
}
