use crate::{
    addon::{AddonPolicy, Extension, TerminalPrompt, build_update_request},
    config::addon::{AddonCreateConfig, AddonUpdateConfig},
    error::DaprctlError,
};
use tracing::debug;

pub fn create(config: AddonCreateConfig) -> Result<(), DaprctlError> {
    config.logger.init()?;
    debug!("effective config: {:#?}", config);

    let policy = AddonPolicy::new(TerminalPrompt);
    let created = policy.build_create_request(config.request)?;

    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

pub fn update(config: AddonUpdateConfig) -> Result<(), DaprctlError> {
    config.logger.init()?;
    debug!("effective config: {:#?}", config);

    let content =
        std::fs::read_to_string(&config.original).map_err(|source| DaprctlError::Io {
            path: config.original.clone(),
            source,
        })?;
    let original: Extension = serde_json::from_str(&content)?;

    let patch = build_update_request(config.request, &original);

    println!("{}", serde_json::to_string_pretty(&patch)?);
    Ok(())
}
