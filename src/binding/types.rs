//! Shared types for bound services and the Dapr components that bind to them.

use super::BindingError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Managed backing service kinds that Container Apps can host as a bound service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Redis,
    Postgres,
    Kafka,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [Self::Redis, Self::Postgres, Self::Kafka];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Postgres => "postgres",
            Self::Kafka => "kafka",
        }
    }

    /// Deterministic name of the bound service, e.g. `dapr-redis`.
    pub fn service_name(self) -> String {
        format!("dapr-{}", self.as_str())
    }

    /// The `configuration.service` block that turns a container app into a
    /// managed service of this kind.
    pub fn service_config(self) -> ServiceConfig {
        match self {
            Self::Redis => ServiceConfig::new("redis"),
            Self::Postgres => ServiceConfig::new("postgres"),
            Self::Kafka => ServiceConfig::new("kafka"),
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BindingError::UnsupportedServiceType(s.to_string()))
    }
}

/// Dapr building blocks that can be backed by a bound service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    State,
    Pubsub,
}

impl ComponentType {
    pub const ALL: [ComponentType; 2] = [Self::State, Self::Pubsub];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Pubsub => "pubsub",
        }
    }

    /// Compatibility table between building blocks and service kinds.
    pub fn supports(self, service: ServiceType) -> bool {
        match self {
            Self::State => matches!(service, ServiceType::Redis | ServiceType::Postgres),
            Self::Pubsub => matches!(service, ServiceType::Kafka | ServiceType::Redis),
        }
    }

    /// Deterministic component name, `statestore-<service>` for state stores
    /// and `<component>-<service>` otherwise.
    pub fn component_name(self, service: ServiceType) -> String {
        match self {
            Self::State => format!("statestore-{}", service),
            Self::Pubsub => format!("{}-{}", self.as_str(), service),
        }
    }

    /// Dapr component type string, e.g. `state.redis`.
    pub fn dapr_type(self, service: ServiceType) -> String {
        format!("{}.{}", self.as_str(), service)
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource as returned by the control plane.
///
/// Only `id` and `name` are interpreted; everything else is carried through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Resource {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// The resource id, treating an empty string as absent.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ServiceConfig {
    const fn new(kind: &'static str) -> Self {
        Self { kind }
    }
}

/// Container app envelope that creates a managed service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub properties: ServiceProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProperties {
    pub environment_id: String,
    pub configuration: ServiceConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceConfiguration {
    pub service: ServiceConfig,
}

impl ServicePayload {
    pub fn new(service: ServiceType, environment_id: String, location: Option<String>) -> Self {
        Self {
            location,
            properties: ServiceProperties {
                environment_id,
                configuration: ServiceConfiguration {
                    service: service.service_config(),
                },
            },
        }
    }
}

/// Back-reference from a component to the service it binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBinding {
    pub name: String,
    pub service_id: String,
}

/// Dapr component envelope bound to a managed service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentPayload {
    pub properties: ComponentProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProperties {
    pub component_type: String,
    pub version: &'static str,
    pub ignore_errors: bool,
    pub service_component_bind: ServiceBinding,
}

impl ComponentPayload {
    pub const SCHEMA_VERSION: &'static str = "v1";

    pub fn new(component: ComponentType, service: ServiceType, binding: ServiceBinding) -> Self {
        Self {
            properties: ComponentProperties {
                component_type: component.dapr_type(service),
                version: Self::SCHEMA_VERSION,
                ignore_errors: false,
                service_component_bind: binding,
            },
        }
    }
}

/// A managed service, found or freshly created.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescriptor {
    pub service_type: ServiceType,
    pub name: String,
    pub id: Option<String>,
    pub resource_group: String,
    pub environment: String,
}

impl ServiceDescriptor {
    pub(crate) fn from_resource(
        service_type: ServiceType,
        name: String,
        resource: &Resource,
        resource_group: &str,
        environment: &str,
    ) -> Self {
        Self {
            service_type,
            name,
            id: resource.id().map(str::to_owned),
            resource_group: resource_group.to_owned(),
            environment: environment.to_owned(),
        }
    }
}

/// A Dapr component bound to a managed service, found or freshly created.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescriptor {
    pub component_type: ComponentType,
    pub service_type: ServiceType,
    pub name: String,
    pub binding: ServiceBinding,
    pub id: Option<String>,
}

/// Identifiers produced by a successful `provision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provisioned {
    pub service_id: String,
    pub component_id: String,
}
