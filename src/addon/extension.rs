//! Cluster extension descriptors handed to the extension manager.

use super::settings::ProtectedSettings;
use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Requested installation scope.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    #[default]
    Cluster,
    Namespace,
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cluster => f.write_str("cluster"),
            Self::Namespace => f.write_str("namespace"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeCluster {
    pub release_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeNamespace {
    pub target_namespace: Option<String>,
}

/// Exactly one of `cluster` or `namespace` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub cluster: Option<ScopeCluster>,
    pub namespace: Option<ScopeNamespace>,
}

impl Scope {
    pub fn cluster(release_namespace: Option<String>) -> Self {
        Self {
            cluster: Some(ScopeCluster { release_namespace }),
            namespace: None,
        }
    }
}

/// Managed identity block. The Dapr extension never requests one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Extension resource as submitted on create, or as read back from the
/// extension manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Extension {
    pub extension_type: String,
    pub auto_upgrade_minor_version: Option<bool>,
    pub release_train: Option<String>,
    /// `None` means latest.
    pub version: Option<String>,
    pub scope: Scope,
    #[serde(deserialize_with = "null_as_empty")]
    pub configuration_settings: IndexMap<String, String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub configuration_protected_settings: ProtectedSettings,
    pub identity: Option<Identity>,
}

// The extension manager reports unset maps as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Patch for an installed extension. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchExtension {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade_minor_version: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_train: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_settings: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_protected_settings: Option<ProtectedSettings>,
}

/// Result of `build_create_request`: the extension to submit and the Helm
/// release name to register it under.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedExtension {
    pub release_name: String,
    pub extension: Extension,
}
