use crate::{
    binding::{Provisioner, arm::ArmClient},
    config::binding::BindingConfig,
    error::DaprctlError,
};
use std::sync::Arc;
use tracing::{debug, info};

pub async fn provision(config: BindingConfig) -> Result<(), DaprctlError> {
    config.logger.init()?;
    debug!("effective config: {:#?}", config);

    let client = ArmClient::new(config.arm).await?;
    let provisioner = Provisioner::new(Arc::new(client)).with_location(config.location);

    let provisioned = provisioner
        .provision(
            config.component_type,
            config.service_type,
            &config.resource_group,
            &config.environment,
        )
        .await?;

    info!(
        service = %provisioned.service_id,
        component = %provisioned.component_id,
        "binding ready"
    );
    println!("{}", serde_json::to_string_pretty(&provisioned)?);
    Ok(())
}
