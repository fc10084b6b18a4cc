use daprctl::addon::{
    AddonError, AddonInstallationRequest, AddonPolicy, AddonUpdateRequest, ConfigurationSettings,
    Extension, Prompt, PromptError, ProtectedSettings, ScopeKind, build_update_request,
};
use indexmap::IndexMap;
use secrecy::SecretString;
use std::cell::RefCell;
use std::collections::VecDeque;

// Answers questions from a script and remembers what was asked.
#[derive(Default)]
struct ScriptedPrompt {
    confirms: RefCell<VecDeque<bool>>,
    texts: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    fn new(confirms: &[bool], texts: &[&str]) -> Self {
        Self {
            confirms: RefCell::new(confirms.iter().copied().collect()),
            texts: RefCell::new(texts.iter().map(|s| s.to_string()).collect()),
            asked: RefCell::default(),
        }
    }

    fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        self.asked.borrow_mut().push(message.to_string());
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }

    fn text(&self, message: &str, _help: Option<&str>) -> Result<String, PromptError> {
        self.asked.borrow_mut().push(message.to_string());
        Ok(self.texts.borrow_mut().pop_front().unwrap_or_default())
    }
}

// Stands in for a session without a terminal.
struct NoTerminal;

impl Prompt for NoTerminal {
    fn confirm(&self, _message: &str, _default: bool) -> Result<bool, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn text(&self, _message: &str, _help: Option<&str>) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }
}

fn settings(pairs: &[(&str, &str)]) -> ConfigurationSettings {
    let map: IndexMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigurationSettings::try_from(map).unwrap()
}

fn request(pairs: &[(&str, &str)]) -> AddonInstallationRequest {
    let mut request = AddonInstallationRequest::new("dapr");
    request.release_namespace = Some("dapr-system".into());
    request.configuration_settings = settings(pairs);
    request
}

#[test]
fn namespace_scope_is_rejected_without_prompting() {
    let prompt = ScriptedPrompt::default();
    let policy = AddonPolicy::new(&prompt);
    let mut req = request(&[]);
    req.scope = ScopeKind::Namespace;

    let err = policy.build_create_request(req).unwrap_err();

    assert!(matches!(err, AddonError::UnsupportedScope(ScopeKind::Namespace)));
    assert!(err.to_string().contains("azure/aks/dapr"));
    assert!(prompt.asked().is_empty());
}

#[test]
fn skip_check_returns_requested_values() {
    let prompt = ScriptedPrompt::default();
    let policy = AddonPolicy::new(&prompt);
    let mut settings = settings(&[("skipExistingDaprCheck", "true")]);

    let release = policy
        .resolve_release_info("my-dapr", Some("my-ns"), &mut settings)
        .unwrap();

    assert_eq!(release.name, "my-dapr");
    assert_eq!(release.namespace.as_deref(), Some("my-ns"));
    assert!(!release.already_installed);
    assert!(prompt.asked().is_empty());
}

#[test]
fn skip_check_works_without_a_terminal() {
    let policy = AddonPolicy::new(NoTerminal);
    let created = policy
        .build_create_request(request(&[("skipExistingDaprCheck", "true")]))
        .unwrap();

    assert_eq!(created.release_name, "dapr");
    assert!(
        !created
            .extension
            .configuration_settings
            .contains_key("skipExistingDaprCheck")
    );
}

#[test]
fn missing_terminal_is_reported() {
    let policy = AddonPolicy::new(NoTerminal);
    let err = policy.build_create_request(request(&[])).unwrap_err();
    assert!(matches!(err, AddonError::Prompt(PromptError::NotInteractive)));
}

#[test]
fn existing_release_keys_mark_installed() {
    let prompt = ScriptedPrompt::default();
    let policy = AddonPolicy::new(&prompt);

    let created = policy
        .build_create_request(request(&[
            ("existingDaprReleaseName", "dapr-helm"),
            ("existingDaprReleaseNamespace", "infra"),
            ("global.ha.enabled", "true"),
        ]))
        .unwrap();

    assert!(prompt.asked().is_empty());
    assert_eq!(created.release_name, "dapr-helm");
    let scope = created.extension.scope.cluster.as_ref().unwrap();
    assert_eq!(scope.release_namespace.as_deref(), Some("infra"));
    assert!(created.extension.scope.namespace.is_none());

    let config = &created.extension.configuration_settings;
    assert_eq!(config.get("global.ha.enabled").map(String::as_str), Some("false"));
    assert!(!config.contains_key("existingDaprReleaseName"));
    assert!(!config.contains_key("existingDaprReleaseNamespace"));
}

#[test]
fn answering_no_keeps_defaults_and_ha() {
    let prompt = ScriptedPrompt::new(&[false], &[]);
    let policy = AddonPolicy::new(&prompt);

    let created = policy
        .build_create_request(request(&[("global.ha.enabled", "true")]))
        .unwrap();

    assert_eq!(prompt.asked(), vec!["Is Dapr already installed in the cluster?"]);
    assert_eq!(created.release_name, "dapr");
    assert_eq!(
        created
            .extension
            .configuration_settings
            .get("global.ha.enabled")
            .map(String::as_str),
        Some("true")
    );
}

#[test]
fn answering_yes_uses_given_release() {
    let prompt = ScriptedPrompt::new(&[true], &["dapr-old", "dapr-old-ns"]);
    let policy = AddonPolicy::new(&prompt);

    let created = policy.build_create_request(request(&[])).unwrap();

    assert_eq!(prompt.asked().len(), 3);
    assert_eq!(created.release_name, "dapr-old");
    assert_eq!(
        created
            .extension
            .scope
            .cluster
            .as_ref()
            .and_then(|c| c.release_namespace.as_deref()),
        Some("dapr-old-ns")
    );
    assert_eq!(
        created
            .extension
            .configuration_settings
            .get("global.ha.enabled")
            .map(String::as_str),
        Some("false")
    );
}

#[test]
fn unset_namespace_defaults_before_prompting() {
    let prompt = ScriptedPrompt::new(&[false], &[]);
    let policy = AddonPolicy::new(&prompt);
    let mut req = AddonInstallationRequest::new("dapr");
    req.release_namespace = None;

    let created = policy.build_create_request(req).unwrap();

    assert_eq!(
        created
            .extension
            .scope
            .cluster
            .as_ref()
            .and_then(|c| c.release_namespace.as_deref()),
        Some("dapr-system")
    );
}

#[test]
fn cluster_type_and_release_train_defaults() {
    let policy = AddonPolicy::new(ScriptedPrompt::new(&[false], &[]));
    let mut req = request(&[]);
    req.cluster_type = "managedClusters".into();

    let created = policy.build_create_request(req).unwrap();

    assert_eq!(created.extension.release_train.as_deref(), Some("stable"));
    assert_eq!(created.extension.extension_type, "Microsoft.Dapr");
    assert!(created.extension.identity.is_none());
    assert_eq!(
        created
            .extension
            .configuration_settings
            .get("global.clusterType")
            .map(String::as_str),
        Some("managedclusters")
    );
}

#[test]
fn connected_cluster_type_is_left_alone() {
    let policy = AddonPolicy::new(ScriptedPrompt::new(&[false], &[]));
    let mut req = request(&[]);
    req.cluster_type = "connectedClusters".into();
    req.release_train = Some("dev".into());

    let created = policy.build_create_request(req).unwrap();

    assert_eq!(created.extension.release_train.as_deref(), Some("dev"));
    assert!(
        !created
            .extension
            .configuration_settings
            .contains_key("global.clusterType")
    );
}

#[test]
fn unrecognized_settings_and_protected_settings_pass_through() {
    let policy = AddonPolicy::new(ScriptedPrompt::new(&[false], &[]));
    let mut req = request(&[("dapr_operator.replicaCount", "3")]);
    req.configuration_protected_settings =
        [("key".to_string(), SecretString::from("value".to_string()))]
            .into_iter()
            .collect::<ProtectedSettings>();

    let created = policy.build_create_request(req).unwrap();
    let json = serde_json::to_value(&created).unwrap();

    assert_eq!(
        json["extension"]["configurationSettings"]["dapr_operator.replicaCount"],
        "3"
    );
    assert_eq!(
        json["extension"]["configurationProtectedSettings"]["key"],
        "value"
    );
    assert_eq!(json["releaseName"], "dapr");
    assert!(json["extension"]["identity"].is_null());
}

fn installed(version: &str) -> Extension {
    Extension {
        version: Some(version.into()),
        ..Default::default()
    }
}

fn patch_hook(version: &str, original: &str) -> Option<String> {
    let patch = build_update_request(
        AddonUpdateRequest {
            version: Some(version.into()),
            ..Default::default()
        },
        &installed(original),
    );
    patch
        .configuration_settings
        .and_then(|s| s.get("hooks.applyCrds").cloned())
}

#[test]
fn downgrade_disables_crd_hook() {
    assert_eq!(patch_hook("1.11.0", "1.12.0").as_deref(), Some("false"));
}

#[test]
fn upgrade_enables_crd_hook() {
    assert_eq!(patch_hook("1.12.0", "1.11.0").as_deref(), Some("true"));
    assert_eq!(patch_hook("1.10.0", "1.9.5").as_deref(), Some("true"));
}

#[test]
fn short_version_downgrade_disables_crd_hook() {
    assert_eq!(patch_hook("1.9", "1.10").as_deref(), Some("false"));
    assert_eq!(patch_hook("1.10", "1.9").as_deref(), Some("true"));
}

#[test]
fn update_reads_installed_extension_with_null_settings() {
    let original: Extension = serde_json::from_str(
        r#"{
            "extensionType": "microsoft.dapr",
            "version": "1.12.0",
            "configurationSettings": null,
            "configurationProtectedSettings": null
        }"#,
    )
    .unwrap();
    let patch = build_update_request(
        AddonUpdateRequest {
            version: Some("1.11.0".into()),
            ..Default::default()
        },
        &original,
    );
    let settings = patch.configuration_settings.unwrap();
    assert_eq!(settings.get("hooks.applyCrds").map(String::as_str), Some("false"));
}

#[test]
fn update_without_version_enables_crd_hook() {
    let patch = build_update_request(
        AddonUpdateRequest {
            configuration_settings: Some(settings(&[("hooks.applyCrds", "false")])),
            ..Default::default()
        },
        &installed("1.12.0"),
    );
    let settings = patch.configuration_settings.unwrap();
    assert_eq!(settings.get("hooks.applyCrds").map(String::as_str), Some("true"));
}

#[test]
fn update_keeps_other_settings_and_fields() {
    let patch = build_update_request(
        AddonUpdateRequest {
            auto_upgrade_minor_version: Some(false),
            release_train: Some("stable".into()),
            version: Some("1.11.0".into()),
            configuration_settings: Some(settings(&[("global.logAsJson", "true")])),
            configuration_protected_settings: None,
        },
        &installed("1.12.0"),
    );

    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "autoUpgradeMinorVersion": false,
            "releaseTrain": "stable",
            "version": "1.11.0",
            "configurationSettings": {
                "hooks.applyCrds": "false",
                "global.logAsJson": "true"
            }
        })
    );
}

#[test]
fn update_with_empty_settings_still_carries_the_hook() {
    // The hook key is always injected, so the empty-map restore never applies.
    let patch = build_update_request(
        AddonUpdateRequest {
            configuration_settings: Some(ConfigurationSettings::default()),
            ..Default::default()
        },
        &Extension::default(),
    );
    let settings = patch.configuration_settings.unwrap();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings.get("hooks.applyCrds").map(String::as_str), Some("true"));
}
