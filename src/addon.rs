//! Dapr cluster extension installation policy.
//!
//! Installing Dapr through the cluster extension manager on a cluster where
//! Dapr was already installed with Helm must reuse the existing release name
//! and namespace, otherwise the extension would install a second copy next to
//! it. `AddonPolicy` works out which release to target (asking the operator
//! when the configuration settings don't say), forces the settings that are
//! unsafe to change on an existing install, and assembles the extension or
//! patch descriptor the caller submits.
use tracing::{debug, info, warn};

pub mod extension;
pub mod prompt;
pub mod settings;
pub mod version;

pub use extension::{CreatedExtension, Extension, PatchExtension, Scope, ScopeKind};
pub use prompt::{Prompt, PromptError, TerminalPrompt};
pub use settings::{ConfigurationSettings, ProtectedSettings, SettingsError};

pub const DEFAULT_EXTENSION_TYPE: &str = "Microsoft.Dapr";
pub const DEFAULT_RELEASE_NAME: &str = "dapr";
pub const DEFAULT_RELEASE_NAMESPACE: &str = "dapr-system";
pub const STABLE_RELEASE_TRAIN: &str = "stable";
pub const MANAGED_CLUSTERS: &str = "managedclusters";

#[derive(Debug, thiserror::Error)]
pub enum AddonError {
    #[error(
        "invalid scope '{0}': the Dapr extension can't be installed at namespace scope, \
         see https://docs.microsoft.com/en-us/azure/aks/dapr"
    )]
    UnsupportedScope(ScopeKind),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Everything needed to create the Dapr extension.
#[derive(Debug, Clone)]
pub struct AddonInstallationRequest {
    pub extension_type: String,
    /// Extension name, also the requested Helm release name.
    pub release_name: String,
    pub release_namespace: Option<String>,
    pub cluster_type: String,
    pub scope: ScopeKind,
    pub auto_upgrade_minor_version: Option<bool>,
    pub release_train: Option<String>,
    pub version: Option<String>,
    pub configuration_settings: ConfigurationSettings,
    pub configuration_protected_settings: ProtectedSettings,
}

impl AddonInstallationRequest {
    pub fn new(release_name: impl Into<String>) -> Self {
        Self {
            extension_type: DEFAULT_EXTENSION_TYPE.to_string(),
            release_name: release_name.into(),
            release_namespace: None,
            cluster_type: String::new(),
            scope: ScopeKind::Cluster,
            auto_upgrade_minor_version: None,
            release_train: None,
            version: None,
            configuration_settings: ConfigurationSettings::default(),
            configuration_protected_settings: ProtectedSettings::default(),
        }
    }
}

/// Requested changes to an installed extension.
#[derive(Debug, Clone, Default)]
pub struct AddonUpdateRequest {
    pub auto_upgrade_minor_version: Option<bool>,
    pub release_train: Option<String>,
    pub version: Option<String>,
    pub configuration_settings: Option<ConfigurationSettings>,
    pub configuration_protected_settings: Option<ProtectedSettings>,
}

/// The Helm release the extension will manage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub name: String,
    pub namespace: Option<String>,
    pub already_installed: bool,
}

pub struct AddonPolicy<P> {
    prompt: P,
}

impl<P: Prompt> AddonPolicy<P> {
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    /// Decide which Helm release the extension manages.
    ///
    /// The control keys `skipExistingDaprCheck`, `existingDaprReleaseName` and
    /// `existingDaprReleaseNamespace` are consumed from `settings` when they
    /// decide the outcome.
    pub fn resolve_release_info(
        &self,
        requested_name: &str,
        requested_namespace: Option<&str>,
        settings: &mut ConfigurationSettings,
    ) -> Result<ReleaseInfo, AddonError> {
        if settings.skip_existing_check.take().unwrap_or(false) {
            debug!("skipping existing dapr installation check");
            return Ok(ReleaseInfo {
                name: requested_name.to_string(),
                namespace: requested_namespace.map(str::to_string),
                already_installed: false,
            });
        }

        let release = if settings.existing_release_name.is_some()
            && settings.existing_release_namespace.is_some()
        {
            ReleaseInfo {
                name: settings.existing_release_name.take().unwrap_or_default(),
                namespace: settings.existing_release_namespace.take(),
                already_installed: true,
            }
        } else {
            self.ask_release_info(requested_name, requested_namespace)?
        };

        if release.name != requested_name {
            warn!(
                "the Helm release name for Dapr is '{}', which differs from the requested name '{}'",
                release.name, requested_name
            );
        }
        if namespace_diverges(requested_namespace, release.namespace.as_deref()) {
            warn!(
                "the Helm release namespace for Dapr is '{}', which differs from the requested namespace '{}'",
                release.namespace.as_deref().unwrap_or_default(),
                requested_namespace.unwrap_or_default()
            );
        }
        Ok(release)
    }

    fn ask_release_info(
        &self,
        requested_name: &str,
        requested_namespace: Option<&str>,
    ) -> Result<ReleaseInfo, AddonError> {
        let name = non_empty(requested_name).unwrap_or(DEFAULT_RELEASE_NAME);
        let namespace = requested_namespace
            .and_then(non_empty)
            .unwrap_or(DEFAULT_RELEASE_NAMESPACE);

        if !self
            .prompt
            .confirm("Is Dapr already installed in the cluster?", false)?
        {
            return Ok(ReleaseInfo {
                name: name.to_string(),
                namespace: Some(namespace.to_string()),
                already_installed: false,
            });
        }

        let name = self.prompt.text(
            &format!(
                "Enter the Helm release name for Dapr, or press Enter to use the default name [{}]",
                DEFAULT_RELEASE_NAME
            ),
            Some("use `helm list -A` to find the existing release"),
        )?;
        let namespace = self.prompt.text(
            &format!(
                "Enter the namespace where Dapr is installed, or press Enter to use the default namespace [{}]",
                DEFAULT_RELEASE_NAMESPACE
            ),
            None,
        )?;

        Ok(ReleaseInfo {
            name: non_empty(&name).unwrap_or(DEFAULT_RELEASE_NAME).to_string(),
            namespace: Some(
                non_empty(&namespace)
                    .unwrap_or(DEFAULT_RELEASE_NAMESPACE)
                    .to_string(),
            ),
            already_installed: true,
        })
    }

    /// Build the extension to submit for a new installation.
    pub fn build_create_request(
        &self,
        request: AddonInstallationRequest,
    ) -> Result<CreatedExtension, AddonError> {
        if request.scope == ScopeKind::Namespace {
            return Err(AddonError::UnsupportedScope(request.scope));
        }

        let mut settings = request.configuration_settings;
        let release = self.resolve_release_info(
            &request.release_name,
            request.release_namespace.as_deref(),
            &mut settings,
        )?;

        if release.already_installed {
            // HA mode adds a leader-election subsystem that can't be patched onto an existing install.
            if settings.ha_enabled == Some(true) {
                warn!(
                    "Dapr is already installed, so HA mode will be disabled ({} = false) for this extension",
                    settings::HA_ENABLED_KEY
                );
            }
            settings.ha_enabled = Some(false);
        }

        let cluster_type = request.cluster_type.to_lowercase();
        if cluster_type.is_empty() || cluster_type == MANAGED_CLUSTERS {
            settings.cluster_type = Some(MANAGED_CLUSTERS.to_string());
        }

        let release_train = request
            .release_train
            .unwrap_or_else(|| STABLE_RELEASE_TRAIN.to_string());

        info!(
            release = %release.name,
            namespace = release.namespace.as_deref().unwrap_or_default(),
            already_installed = release.already_installed,
            "prepared Dapr extension"
        );

        Ok(CreatedExtension {
            release_name: release.name,
            extension: Extension {
                extension_type: request.extension_type,
                auto_upgrade_minor_version: request.auto_upgrade_minor_version,
                release_train: Some(release_train),
                version: request.version,
                scope: Scope::cluster(release.namespace),
                configuration_settings: settings.to_map(),
                configuration_protected_settings: request.configuration_protected_settings,
                identity: None,
            },
        })
    }
}

/// Build the patch for an installed extension.
///
/// The CRD-apply hook is turned off when downgrading and back on otherwise,
/// since a previous downgrade may have left it off.
pub fn build_update_request(request: AddonUpdateRequest, original: &Extension) -> PatchExtension {
    let input = request.configuration_settings.clone();
    let mut settings = request.configuration_settings.unwrap_or_default();

    match (request.version.as_deref(), original.version.as_deref()) {
        (Some(requested), Some(installed)) if version::is_downgrade(requested, installed) => {
            debug!(
                "downgrade detected from {} to {}, setting {} to false",
                installed,
                requested,
                settings::APPLY_CRDS_HOOK_KEY
            );
            settings.apply_crds_hook = Some(false);
        }
        _ => settings.apply_crds_hook = Some(true),
    }

    // An empty patch map would wipe the installed settings; submit the input as-is instead.
    let configuration_settings = if settings.is_empty() {
        input.map(|s| s.to_map())
    } else {
        Some(settings.to_map())
    };

    PatchExtension {
        auto_upgrade_minor_version: request.auto_upgrade_minor_version,
        release_train: request.release_train,
        version: request.version,
        configuration_settings,
        configuration_protected_settings: request.configuration_protected_settings,
    }
}

// An unset namespace takes whatever the release resolved to.
fn namespace_diverges(requested: Option<&str>, resolved: Option<&str>) -> bool {
    match requested {
        Some(requested) => resolved != Some(requested),
        None => false,
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        confirms: RefCell<VecDeque<bool>>,
        texts: RefCell<VecDeque<String>>,
        asked: RefCell<usize>,
    }

    impl Scripted {
        fn new(confirms: &[bool], texts: &[&str]) -> Self {
            Self {
                confirms: RefCell::new(confirms.iter().copied().collect()),
                texts: RefCell::new(texts.iter().map(|s| s.to_string()).collect()),
                asked: RefCell::new(0),
            }
        }
    }

    impl Prompt for Scripted {
        fn confirm(&self, _message: &str, default: bool) -> Result<bool, PromptError> {
            *self.asked.borrow_mut() += 1;
            Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
        }
        fn text(&self, _message: &str, _help: Option<&str>) -> Result<String, PromptError> {
            *self.asked.borrow_mut() += 1;
            Ok(self.texts.borrow_mut().pop_front().unwrap_or_default())
        }
    }

    #[test]
    fn skip_check_consumes_flag_and_keeps_request() {
        let prompt = Scripted::default();
        let policy = AddonPolicy::new(&prompt);
        let mut settings = ConfigurationSettings {
            skip_existing_check: Some(true),
            ..Default::default()
        };

        let release = policy
            .resolve_release_info("my-ext", None, &mut settings)
            .unwrap();

        assert_eq!(
            release,
            ReleaseInfo {
                name: "my-ext".into(),
                namespace: None,
                already_installed: false
            }
        );
        assert_eq!(settings.skip_existing_check, None);
        assert_eq!(*prompt.asked.borrow(), 0);
    }

    #[test]
    fn existing_keys_are_trusted_without_prompting() {
        let prompt = Scripted::default();
        let policy = AddonPolicy::new(&prompt);
        let mut settings = ConfigurationSettings {
            existing_release_name: Some("dapr-old".into()),
            existing_release_namespace: Some("infra".into()),
            ..Default::default()
        };

        let release = policy
            .resolve_release_info("dapr", Some("dapr-system"), &mut settings)
            .unwrap();

        assert!(release.already_installed);
        assert_eq!(release.name, "dapr-old");
        assert_eq!(release.namespace.as_deref(), Some("infra"));
        assert!(settings.is_empty());
        assert_eq!(*prompt.asked.borrow(), 0);
    }

    #[test]
    fn only_one_existing_key_falls_back_to_prompt() {
        let prompt = Scripted::new(&[false], &[]);
        let policy = AddonPolicy::new(&prompt);
        let mut settings = ConfigurationSettings {
            existing_release_name: Some("dapr-old".into()),
            ..Default::default()
        };

        let release = policy
            .resolve_release_info("", None, &mut settings)
            .unwrap();

        assert!(!release.already_installed);
        assert_eq!(release.name, DEFAULT_RELEASE_NAME);
        assert_eq!(release.namespace.as_deref(), Some(DEFAULT_RELEASE_NAMESPACE));
        assert_eq!(settings.existing_release_name.as_deref(), Some("dapr-old"));
        assert_eq!(*prompt.asked.borrow(), 1);
    }

    #[test]
    fn empty_answers_fall_back_to_defaults() {
        let prompt = Scripted::new(&[true], &["", "  "]);
        let policy = AddonPolicy::new(&prompt);

        let release = policy
            .resolve_release_info("ext", None, &mut ConfigurationSettings::default())
            .unwrap();

        assert_eq!(
            release,
            ReleaseInfo {
                name: DEFAULT_RELEASE_NAME.into(),
                namespace: Some(DEFAULT_RELEASE_NAMESPACE.into()),
                already_installed: true
            }
        );
        assert_eq!(*prompt.asked.borrow(), 3);
    }

    #[test]
    fn unset_namespace_never_diverges() {
        assert!(!namespace_diverges(None, Some(DEFAULT_RELEASE_NAMESPACE)));
        assert!(!namespace_diverges(None, None));
        assert!(!namespace_diverges(Some("infra"), Some("infra")));
        assert!(namespace_diverges(Some("dapr-system"), Some("infra")));
        assert!(namespace_diverges(Some("dapr-system"), None));
    }

    #[test]
    fn unsupported_scope_message_links_docs() {
        let err = AddonError::UnsupportedScope(ScopeKind::Namespace);
        let message = err.to_string();
        assert!(message.starts_with("invalid scope 'namespace'"), "{message}");
        assert!(message.ends_with("see https://docs.microsoft.com/en-us/azure/aks/dapr"));
    }

    #[test]
    fn update_without_settings_sets_hook() {
        let original = Extension {
            version: Some("1.12.0".into()),
            ..Default::default()
        };
        let patch = build_update_request(AddonUpdateRequest::default(), &original);
        let settings = patch.configuration_settings.unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings.get("hooks.applyCrds").map(String::as_str), Some("true"));
    }
}
