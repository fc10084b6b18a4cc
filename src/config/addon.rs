use super::parsers::{ProtectedSetting, Setting, settings_list, vec_extend};
use super::{ConfigError, Overlay};
use crate::addon::{
    AddonInstallationRequest, AddonUpdateRequest, ConfigurationSettings, DEFAULT_EXTENSION_TYPE,
    ProtectedSettings, ScopeKind,
};
use crate::logging::{Logger, LoggerArgs};
use clap::Args;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

/// Settings shared by `addon create` and `addon update`.
#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionSettingsArgs {
    /// Automatically upgrade minor versions of the extension
    #[arg(long, value_name = "BOOL")]
    pub auto_upgrade_minor_version: Option<bool>,

    /// Release train for the extension, e.g. `stable`
    #[arg(long)]
    pub release_train: Option<String>,

    /// Exact extension version; latest when unset
    #[arg(long)]
    pub version: Option<String>,

    /// Configuration setting as KEY=VALUE. Can be repeated.
    ///
    /// Settings from the command line are applied after those in the
    /// configuration file; a repeated key keeps the last value.
    #[arg(long = "configuration-settings", value_name = "KEY=VALUE")]
    #[serde(default, deserialize_with = "settings_list")]
    pub configuration_settings: Vec<Setting>,

    /// Protected configuration setting as KEY=VALUE. Can be repeated.
    #[arg(long = "configuration-protected-settings", value_name = "KEY=VALUE")]
    #[serde(default, deserialize_with = "settings_list")]
    pub configuration_protected_settings: Vec<ProtectedSetting>,
}

impl Overlay for ExtensionSettingsArgs {
    fn overlay(self, over: Self) -> Self {
        Self {
            auto_upgrade_minor_version: self
                .auto_upgrade_minor_version
                .overlay(over.auto_upgrade_minor_version),
            release_train: self.release_train.overlay(over.release_train),
            version: self.version.overlay(over.version),
            configuration_settings: vec_extend(
                self.configuration_settings,
                over.configuration_settings,
            ),
            configuration_protected_settings: vec_extend(
                self.configuration_protected_settings,
                over.configuration_protected_settings,
            ),
        }
    }
}

impl ExtensionSettingsArgs {
    /// `None` when no setting was given at all.
    fn settings(&self) -> Result<Option<ConfigurationSettings>, ConfigError> {
        if self.configuration_settings.is_empty() {
            return Ok(None);
        }
        let map: IndexMap<String, String> = self
            .configuration_settings
            .iter()
            .map(|s| (s.key.clone(), s.value.clone()))
            .collect();
        Ok(Some(ConfigurationSettings::try_from(map)?))
    }

    fn protected(&self) -> Option<ProtectedSettings> {
        if self.configuration_protected_settings.is_empty() {
            return None;
        }
        Some(
            self.configuration_protected_settings
                .iter()
                .map(|s| (s.key.clone(), s.value.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AddonCreateConfig {
    pub request: AddonInstallationRequest,
    pub logger: Logger,
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddonCreateArgs {
    /// Extension name, also used as the Helm release name
    #[arg(long)]
    pub name: Option<String>,

    /// Namespace for the Helm release
    #[arg(long)]
    pub release_namespace: Option<String>,

    /// Cluster type, e.g. `managedClusters` or `connectedClusters`
    #[arg(long)]
    pub cluster_type: Option<String>,

    /// Installation scope. Only `cluster` is supported.
    #[arg(long, value_enum)]
    pub scope: Option<ScopeKind>,

    /// Extension type
    #[arg(long)]
    pub extension_type: Option<String>,

    #[command(flatten)]
    #[serde(flatten)]
    pub settings: ExtensionSettingsArgs,

    #[command(flatten)]
    #[serde(flatten)]
    pub logger: LoggerArgs,
}

impl Overlay for AddonCreateArgs {
    fn overlay(self, over: Self) -> Self {
        Self {
            name: self.name.overlay(over.name),
            release_namespace: self.release_namespace.overlay(over.release_namespace),
            cluster_type: self.cluster_type.overlay(over.cluster_type),
            scope: self.scope.overlay(over.scope),
            extension_type: self.extension_type.overlay(over.extension_type),
            settings: self.settings.overlay(over.settings),
            logger: self.logger.overlay(over.logger),
        }
    }
}

impl TryFrom<AddonCreateArgs> for AddonCreateConfig {
    type Error = ConfigError;

    fn try_from(args: AddonCreateArgs) -> Result<Self, Self::Error> {
        let configuration_settings = args.settings.settings()?.unwrap_or_default();
        let configuration_protected_settings = args.settings.protected().unwrap_or_default();
        let name = args.name.ok_or_else(|| ConfigError::missing("name"))?;

        let request = AddonInstallationRequest {
            extension_type: args
                .extension_type
                .unwrap_or_else(|| DEFAULT_EXTENSION_TYPE.to_string()),
            release_name: name,
            release_namespace: args.release_namespace,
            cluster_type: args.cluster_type.unwrap_or_default(),
            scope: args.scope.unwrap_or_default(),
            auto_upgrade_minor_version: args.settings.auto_upgrade_minor_version,
            release_train: args.settings.release_train,
            version: args.settings.version,
            configuration_settings,
            configuration_protected_settings,
        };

        Ok(Self {
            request,
            logger: args.logger.try_into()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AddonUpdateConfig {
    /// JSON document of the installed extension
    pub original: PathBuf,
    pub request: AddonUpdateRequest,
    pub logger: Logger,
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddonUpdateArgs {
    /// Path to the installed extension as JSON, e.g. from `az k8s-extension show`
    #[arg(long, value_name = "PATH")]
    pub original: Option<PathBuf>,

    #[command(flatten)]
    #[serde(flatten)]
    pub settings: ExtensionSettingsArgs,

    #[command(flatten)]
    #[serde(flatten)]
    pub logger: LoggerArgs,
}

impl Overlay for AddonUpdateArgs {
    fn overlay(self, over: Self) -> Self {
        Self {
            original: self.original.overlay(over.original),
            settings: self.settings.overlay(over.settings),
            logger: self.logger.overlay(over.logger),
        }
    }
}

impl TryFrom<AddonUpdateArgs> for AddonUpdateConfig {
    type Error = ConfigError;

    fn try_from(args: AddonUpdateArgs) -> Result<Self, Self::Error> {
        let configuration_settings = args.settings.settings()?;
        let configuration_protected_settings = args.settings.protected();
        let original = args.original.ok_or_else(|| ConfigError::missing("original"))?;

        Ok(Self {
            original,
            request: AddonUpdateRequest {
                auto_upgrade_minor_version: args.settings.auto_upgrade_minor_version,
                release_train: args.settings.release_train,
                version: args.settings.version,
                configuration_settings,
                configuration_protected_settings,
            },
            logger: args.logger.try_into()?,
        })
    }
}
