use super::{ConfigError, Overlay};
use crate::binding::{ComponentType, ServiceType};
use crate::logging::{Logger, LoggerArgs};
use crate::token::AuthToken;
use clap::Args;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com/";
pub const DEFAULT_API_VERSION: &str = "2023-11-02-preview";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("invalid request timeout: {0}")]
    Invalid(#[from] humantime::DurationError),

    #[error("request timeout must be greater than zero")]
    Zero,
}

/// Deadline for each resource manager request. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout(Duration);

impl RequestTimeout {
    pub fn new(duration: Duration) -> Result<Self, TimeoutError> {
        if duration.is_zero() {
            return Err(TimeoutError::Zero);
        }
        Ok(Self(duration))
    }
}

/// Unitless numbers are seconds, anything else goes through humantime.
impl FromStr for RequestTimeout {
    type Err = TimeoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let duration = match s.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => humantime::parse_duration(s)?,
        };
        Self::new(duration)
    }
}

impl<'de> Deserialize<'de> for RequestTimeout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(u64),
            Text(String),
        }

        let timeout = match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Self::new(Duration::from_secs(secs)),
            Raw::Text(s) => s.parse(),
        };
        timeout.map_err(serde::de::Error::custom)
    }
}

impl From<RequestTimeout> for Duration {
    fn from(val: RequestTimeout) -> Self {
        val.0
    }
}

impl Default for RequestTimeout {
    fn default() -> Self {
        RequestTimeout(DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Connection settings for Azure Resource Manager.
#[derive(Debug, Clone)]
pub struct ArmConfig {
    pub subscription_id: Uuid,
    pub arm_endpoint: Url,
    pub arm_token: AuthToken,
    pub api_version: String,
    pub request_timeout: RequestTimeout,
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArmArgs {
    /// Azure subscription id
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription_id: Option<Uuid>,

    /// Resource manager endpoint
    ///
    /// **Default:** `https://management.azure.com/`
    #[arg(long, env = "DAPRCTL_ARM_ENDPOINT")]
    pub arm_endpoint: Option<Url>,

    /// Bearer token for the resource manager.
    ///
    /// Either provide the token directly or via a file with `file:` prefix
    #[arg(long, env = "DAPRCTL_ARM_TOKEN", hide_env_values = true)]
    pub arm_token: Option<AuthToken>,

    /// Container Apps api-version
    #[arg(long, env = "DAPRCTL_API_VERSION")]
    pub api_version: Option<String>,

    /// Timeout for each resource manager request.
    ///
    /// Handles human-readable strings like "500ms", "1m".
    /// Unitless numbers are interpreted as seconds.
    #[arg(long, env = "DAPRCTL_REQUEST_TIMEOUT")]
    pub request_timeout: Option<RequestTimeout>,
}

impl Overlay for ArmArgs {
    fn overlay(self, over: Self) -> Self {
        Self {
            subscription_id: self.subscription_id.overlay(over.subscription_id),
            arm_endpoint: self.arm_endpoint.overlay(over.arm_endpoint),
            arm_token: self.arm_token.overlay(over.arm_token),
            api_version: self.api_version.overlay(over.api_version),
            request_timeout: self.request_timeout.overlay(over.request_timeout),
        }
    }
}

impl TryFrom<ArmArgs> for ArmConfig {
    type Error = ConfigError;

    fn try_from(args: ArmArgs) -> Result<Self, Self::Error> {
        let arm_endpoint = match args.arm_endpoint {
            Some(url) => url,
            None => Url::parse(DEFAULT_ARM_ENDPOINT)
                .map_err(|e| ConfigError::Validation(e.to_string()))?,
        };
        Ok(Self {
            subscription_id: args
                .subscription_id
                .ok_or_else(|| ConfigError::missing("subscription-id"))?,
            arm_endpoint,
            arm_token: args
                .arm_token
                .ok_or_else(|| ConfigError::missing("arm-token"))?,
            api_version: args
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            request_timeout: args.request_timeout.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BindingConfig {
    pub component_type: ComponentType,
    pub service_type: ServiceType,
    pub resource_group: String,
    pub environment: String,
    pub location: Option<String>,
    pub arm: ArmConfig,
    pub logger: Logger,
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingArgs {
    /// Dapr building block to bind
    #[arg(long, value_enum)]
    pub component_type: Option<ComponentType>,

    /// Managed service backing the component
    #[arg(long, value_enum)]
    pub service_type: Option<ServiceType>,

    /// Resource group of the Container Apps environment
    #[arg(long, short = 'g', env = "DAPRCTL_RESOURCE_GROUP")]
    pub resource_group: Option<String>,

    /// Container Apps managed environment name
    #[arg(long, env = "DAPRCTL_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Location for new services; defaults to the environment's location
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    #[command(flatten, next_help_heading = "Resource Manager")]
    #[serde(flatten)]
    pub arm: ArmArgs,

    #[command(flatten)]
    #[serde(flatten)]
    pub logger: LoggerArgs,
}

impl Overlay for BindingArgs {
    fn overlay(self, over: Self) -> Self {
        Self {
            component_type: self.component_type.overlay(over.component_type),
            service_type: self.service_type.overlay(over.service_type),
            resource_group: self.resource_group.overlay(over.resource_group),
            environment: self.environment.overlay(over.environment),
            location: self.location.overlay(over.location),
            arm: self.arm.overlay(over.arm),
            logger: self.logger.overlay(over.logger),
        }
    }
}

impl TryFrom<BindingArgs> for BindingConfig {
    type Error = ConfigError;

    fn try_from(args: BindingArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            component_type: args
                .component_type
                .ok_or_else(|| ConfigError::missing("component-type"))?,
            service_type: args
                .service_type
                .ok_or_else(|| ConfigError::missing("service-type"))?,
            resource_group: args
                .resource_group
                .ok_or_else(|| ConfigError::missing("resource-group"))?,
            environment: args
                .environment
                .ok_or_else(|| ConfigError::missing("environment"))?,
            location: args.location,
            arm: args.arm.try_into()?,
            logger: args.logger.try_into()?,
        })
    }
}
