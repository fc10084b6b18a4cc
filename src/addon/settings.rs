//! Extension configuration settings.
//!
//! Settings arrive as free-form `key=value` pairs. The keys this crate makes
//! decisions on are lifted into named fields; everything else is carried
//! through untouched in `extra`, in the order it was given.

use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub const CLUSTER_TYPE_KEY: &str = "global.clusterType";
pub const HA_ENABLED_KEY: &str = "global.ha.enabled";
pub const SKIP_EXISTING_CHECK_KEY: &str = "skipExistingDaprCheck";
pub const EXISTING_RELEASE_NAME_KEY: &str = "existingDaprReleaseName";
pub const EXISTING_RELEASE_NAMESPACE_KEY: &str = "existingDaprReleaseNamespace";
pub const APPLY_CRDS_HOOK_KEY: &str = "hooks.applyCrds";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("configuration setting '{key}' must be 'true' or 'false', got '{value}'")]
    InvalidBool { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSettings {
    /// `global.clusterType`
    pub cluster_type: Option<String>,
    /// `global.ha.enabled`
    pub ha_enabled: Option<bool>,
    /// `skipExistingDaprCheck`
    pub skip_existing_check: Option<bool>,
    /// `existingDaprReleaseName`
    pub existing_release_name: Option<String>,
    /// `existingDaprReleaseNamespace`
    pub existing_release_namespace: Option<String>,
    /// `hooks.applyCrds`
    pub apply_crds_hook: Option<bool>,
    /// Settings this crate does not interpret.
    pub extra: IndexMap<String, String>,
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, SettingsError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(SettingsError::InvalidBool { key, value })
    }
}

impl ConfigurationSettings {
    pub fn is_empty(&self) -> bool {
        self.cluster_type.is_none()
            && self.ha_enabled.is_none()
            && self.skip_existing_check.is_none()
            && self.existing_release_name.is_none()
            && self.existing_release_namespace.is_none()
            && self.apply_crds_hook.is_none()
            && self.extra.is_empty()
    }

    /// Flatten back into the wire representation.
    pub fn to_map(&self) -> IndexMap<String, String> {
        let strings = [
            (CLUSTER_TYPE_KEY, self.cluster_type.clone()),
            (EXISTING_RELEASE_NAME_KEY, self.existing_release_name.clone()),
            (
                EXISTING_RELEASE_NAMESPACE_KEY,
                self.existing_release_namespace.clone(),
            ),
        ];
        let flags = [
            (HA_ENABLED_KEY, self.ha_enabled),
            (SKIP_EXISTING_CHECK_KEY, self.skip_existing_check),
            (APPLY_CRDS_HOOK_KEY, self.apply_crds_hook),
        ];

        let mut map: IndexMap<String, String> = strings
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .chain(
                flags
                    .into_iter()
                    .filter_map(|(k, v)| v.map(|v| (k.to_string(), v.to_string()))),
            )
            .collect();
        map.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        map
    }
}

impl TryFrom<IndexMap<String, String>> for ConfigurationSettings {
    type Error = SettingsError;

    fn try_from(map: IndexMap<String, String>) -> Result<Self, Self::Error> {
        let mut settings = Self::default();
        for (key, value) in map {
            match key.as_str() {
                CLUSTER_TYPE_KEY => settings.cluster_type = Some(value),
                HA_ENABLED_KEY => settings.ha_enabled = Some(parse_bool(HA_ENABLED_KEY, value)?),
                SKIP_EXISTING_CHECK_KEY => {
                    settings.skip_existing_check =
                        Some(parse_bool(SKIP_EXISTING_CHECK_KEY, value)?)
                }
                EXISTING_RELEASE_NAME_KEY => settings.existing_release_name = Some(value),
                EXISTING_RELEASE_NAMESPACE_KEY => {
                    settings.existing_release_namespace = Some(value)
                }
                APPLY_CRDS_HOOK_KEY => {
                    settings.apply_crds_hook = Some(parse_bool(APPLY_CRDS_HOOK_KEY, value)?)
                }
                _ => {
                    settings.extra.insert(key, value);
                }
            }
        }
        Ok(settings)
    }
}

impl Serialize for ConfigurationSettings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConfigurationSettings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = IndexMap::<String, String>::deserialize(deserializer)?;
        Self::try_from(map).map_err(serde::de::Error::custom)
    }
}

/// Protected settings. Values are redacted from `Debug` output and are only
/// exposed when serialized into the payload handed to the extension manager.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ProtectedSettings(IndexMap<String, SecretString>);

impl FromIterator<(String, SecretString)> for ProtectedSettings {
    fn from_iter<I: IntoIterator<Item = (String, SecretString)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ProtectedSettings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v.expose_secret())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn recognized_keys_are_lifted() {
        let settings = ConfigurationSettings::try_from(map(&[
            ("global.ha.enabled", "True"),
            ("skipExistingDaprCheck", "false"),
            ("existingDaprReleaseName", "my-dapr"),
            ("dapr_operator.replicaCount", "2"),
        ]))
        .unwrap();

        assert_eq!(settings.ha_enabled, Some(true));
        assert_eq!(settings.skip_existing_check, Some(false));
        assert_eq!(settings.existing_release_name.as_deref(), Some("my-dapr"));
        assert_eq!(
            settings.extra.get("dapr_operator.replicaCount").map(String::as_str),
            Some("2")
        );
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let err = ConfigurationSettings::try_from(map(&[("global.ha.enabled", "yes")]))
            .unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidBool {
                key: HA_ENABLED_KEY,
                value: "yes".into()
            }
        );
    }

    #[test]
    fn to_map_round_trips_values() {
        let input = map(&[
            ("global.clusterType", "managedclusters"),
            ("hooks.applyCrds", "false"),
            ("custom.key", "v"),
        ]);
        let settings = ConfigurationSettings::try_from(input.clone()).unwrap();
        let output = settings.to_map();
        assert_eq!(output.len(), 3);
        for (k, v) in &input {
            assert_eq!(output.get(k), Some(v));
        }
    }

    #[test]
    fn protected_settings_are_redacted_in_debug() {
        let protected: ProtectedSettings =
            [("password".to_string(), SecretString::new("hunter2".into()))]
                .into_iter()
                .collect();
        assert!(!format!("{:?}", protected).contains("hunter2"));
        assert_eq!(
            serde_json::to_value(&protected).unwrap(),
            serde_json::json!({ "password": "hunter2" })
        );
    }
}
