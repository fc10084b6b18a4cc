//! Idempotent provisioning of Dapr-bound managed services.
//!
//! A `Provisioner` makes sure a managed backing service (redis, postgres,
//! kafka) exists in a Container Apps environment, then makes sure a Dapr
//! component bound to that service exists. Both steps look the resource up by
//! its deterministic name first and only create it when the control plane
//! reports it as absent, so re-running a partially failed provisioning simply
//! picks up where the last run stopped.
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(feature = "arm")]
pub mod arm;
pub mod client;
pub mod types;

pub use client::{ClientError, Lookup, ResourceClient};
pub use types::{
    ComponentDescriptor, ComponentPayload, ComponentType, Provisioned, Resource, ServiceBinding,
    ServiceDescriptor, ServicePayload, ServiceType,
};

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("service type '{0}' is not supported")]
    UnsupportedServiceType(String),

    #[error("component type '{component_type}' cannot be backed by service type '{service_type}'")]
    UnsupportedComponentBinding {
        component_type: ComponentType,
        service_type: ServiceType,
    },

    #[error("failed to look up {kind} '{name}': {source}")]
    Lookup {
        kind: &'static str,
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to create service '{name}' of type '{service_type}': {source}")]
    ServiceCreationFailed {
        name: String,
        service_type: ServiceType,
        #[source]
        source: CreationFailure,
    },

    #[error("failed to create dapr component '{name}' of type '{component_type}': {source}")]
    ComponentCreationFailed {
        name: String,
        component_type: String,
        #[source]
        source: CreationFailure,
    },

    #[error("service '{0}' has no resource id")]
    MissingServiceId(String),

    #[error("dapr component '{0}' has no resource id")]
    MissingComponentId(String),
}

/// Why a create call did not yield a resource.
#[derive(Debug, thiserror::Error)]
pub enum CreationFailure {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("control plane returned an empty resource")]
    EmptyResult,
}

pub struct Provisioner {
    client: Arc<dyn ResourceClient>,
    location: Option<String>,
}

impl Provisioner {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self {
            client,
            location: None,
        }
    }

    /// Location for newly created services. When unset the client decides,
    /// typically by using the environment's location.
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    /// Ensure the managed service and its bound Dapr component both exist.
    ///
    /// Returns the resource ids of the service and the component.
    pub async fn provision(
        &self,
        component_type: ComponentType,
        service_type: ServiceType,
        resource_group: &str,
        environment: &str,
    ) -> Result<Provisioned, BindingError> {
        if !component_type.supports(service_type) {
            return Err(BindingError::UnsupportedComponentBinding {
                component_type,
                service_type,
            });
        }

        let service = self
            .ensure_service_exists(service_type, resource_group, environment)
            .await?;
        let service_id = service
            .id
            .ok_or_else(|| BindingError::MissingServiceId(service.name.clone()))?;

        let component = self
            .ensure_component_exists(
                component_type,
                service_type,
                &service.name,
                &service_id,
                resource_group,
                environment,
            )
            .await?;
        let component_id = component
            .id
            .ok_or_else(|| BindingError::MissingComponentId(component.name.clone()))?;

        Ok(Provisioned {
            service_id,
            component_id,
        })
    }

    pub(crate) async fn ensure_service_exists(
        &self,
        service_type: ServiceType,
        resource_group: &str,
        environment: &str,
    ) -> Result<ServiceDescriptor, BindingError> {
        let name = service_type.service_name();

        debug!(service = %name, %service_type, "looking up service");
        let existing = self
            .client
            .show_service(resource_group, &name)
            .await
            .map_err(|source| BindingError::Lookup {
                kind: "service",
                name: name.clone(),
                source,
            })?;

        if let Lookup::Found(resource) = existing {
            warn!(
                "service {} of type {} already exists, skipping creation",
                name, service_type
            );
            return Ok(ServiceDescriptor::from_resource(
                service_type,
                name,
                &resource,
                resource_group,
                environment,
            ));
        }

        debug!(service = %name, %service_type, "creating service");
        let payload = ServicePayload::new(
            service_type,
            self.client.environment_id(resource_group, environment),
            self.location.clone(),
        );
        let failed = |source: CreationFailure| BindingError::ServiceCreationFailed {
            name: name.clone(),
            service_type,
            source,
        };
        let created = self
            .client
            .create_service(resource_group, environment, &name, &payload)
            .await
            .map_err(|e| failed(e.into()))?
            .ok_or_else(|| failed(CreationFailure::EmptyResult))?;

        debug!(service = %name, %service_type, "created service");
        Ok(ServiceDescriptor::from_resource(
            service_type,
            name,
            &created,
            resource_group,
            environment,
        ))
    }

    pub(crate) async fn ensure_component_exists(
        &self,
        component_type: ComponentType,
        service_type: ServiceType,
        service_name: &str,
        service_id: &str,
        resource_group: &str,
        environment: &str,
    ) -> Result<ComponentDescriptor, BindingError> {
        if !component_type.supports(service_type) {
            return Err(BindingError::UnsupportedComponentBinding {
                component_type,
                service_type,
            });
        }

        let name = component_type.component_name(service_type);
        let binding = ServiceBinding {
            name: service_name.to_owned(),
            service_id: service_id.to_owned(),
        };
        let describe = |resource: &Resource| ComponentDescriptor {
            component_type,
            service_type,
            name: name.clone(),
            binding: binding.clone(),
            id: resource.id().map(str::to_owned),
        };

        debug!(component = %name, "looking up dapr component");
        let existing = self
            .client
            .show_component(resource_group, environment, &name)
            .await
            .map_err(|source| BindingError::Lookup {
                kind: "dapr component",
                name: name.clone(),
                source,
            })?;

        if let Lookup::Found(resource) = existing {
            warn!(
                "dapr component {} of type {} already exists, skipping creation",
                name,
                component_type.dapr_type(service_type)
            );
            return Ok(describe(&resource));
        }

        let payload = ComponentPayload::new(component_type, service_type, binding.clone());
        let failed = |source: CreationFailure| BindingError::ComponentCreationFailed {
            name: name.clone(),
            component_type: component_type.dapr_type(service_type),
            source,
        };

        debug!(component = %name, service = %service_name, "creating dapr component");
        let created = self
            .client
            .create_or_update_component(resource_group, environment, &name, &payload)
            .await
            .map_err(|e| failed(e.into()))?
            .ok_or_else(|| failed(CreationFailure::EmptyResult))?;

        Ok(describe(&created))
    }
}
