//! Azure Resource Manager backed resource client.

use super::client::{ClientError, Lookup, ResourceClient};
use super::types::{ComponentPayload, Resource, ServicePayload};
use crate::config::binding::ArmConfig;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

const PROVIDER: &str = "Microsoft.App";

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnvironmentResponse {
    location: Option<String>,
}

pub struct ArmClient {
    client: Client,
    endpoint: Url,
    subscription_id: Uuid,
    api_version: String,
    token: SecretString,
}

impl ArmClient {
    pub async fn new(config: ArmConfig) -> Result<Self, ClientError> {
        let token = config.arm_token.resolve().await?;
        let client = Client::builder()
            .timeout(config.request_timeout.into())
            .build()
            .map_err(|e| ClientError::Network(Box::new(e)))?;

        if config.arm_endpoint.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "arm endpoint '{}' is not a base url",
                config.arm_endpoint
            )));
        }

        Ok(Self {
            client,
            endpoint: config.arm_endpoint,
            subscription_id: config.subscription_id,
            api_version: config.api_version,
            token,
        })
    }

    fn environment_segments(&self, resource_group: &str, environment: &str) -> Vec<String> {
        vec![
            "subscriptions".into(),
            self.subscription_id.to_string(),
            "resourceGroups".into(),
            resource_group.into(),
            "providers".into(),
            PROVIDER.into(),
            "managedEnvironments".into(),
            environment.into(),
        ]
    }

    fn container_app_url(&self, resource_group: &str, name: &str) -> Url {
        let subscription = self.subscription_id.to_string();
        let segments = [
            "subscriptions",
            subscription.as_str(),
            "resourceGroups",
            resource_group,
            "providers",
            PROVIDER,
            "containerApps",
            name,
        ];
        self.url(&segments)
    }

    fn environment_url(&self, resource_group: &str, environment: &str) -> Url {
        let segments = self.environment_segments(resource_group, environment);
        self.url(&segments)
    }

    fn component_url(&self, resource_group: &str, environment: &str, name: &str) -> Url {
        let mut segments = self.environment_segments(resource_group, environment);
        segments.push("daprComponents".into());
        segments.push(name.into());
        self.url(&segments)
    }

    fn url<S: AsRef<str>>(&self, segments: &[S]) -> Url {
        let mut url = self.endpoint.clone();
        // endpoint is checked to be a base url on construction
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(segments.iter().map(AsRef::as_ref));
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        url
    }

    async fn get(&self, url: Url) -> Result<Lookup<Resource>, ClientError> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| ClientError::Network(Box::new(e)))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }
        match Self::decode(resp).await? {
            Some(resource) => Ok(Lookup::Found(resource)),
            None => Err(ClientError::Decode("empty response body".into())),
        }
    }

    async fn put<T: Serialize + ?Sized>(
        &self,
        url: Url,
        payload: &T,
    ) -> Result<Option<Resource>, ClientError> {
        debug!(%url, "PUT");
        let resp = self
            .client
            .put(url)
            .bearer_auth(self.token.expose_secret())
            .json(payload)
            .send()
            .await
            .map_err(|e| ClientError::Network(Box::new(e)))?;

        Self::decode(resp).await
    }

    async fn decode(resp: Response) -> Result<Option<Resource>, ClientError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::Network(Box::new(e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| match (e.code, e.message) {
                    (Some(code), Some(message)) => format!("{}: {}", code, message),
                    (code, message) => message.or(code).unwrap_or_default(),
                })
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.to_string());

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ClientError::Unauthorized(message)
                }
                StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimit,
                s => ClientError::Api {
                    status: s.as_u16(),
                    message,
                },
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn environment_location(
        &self,
        resource_group: &str,
        environment: &str,
    ) -> Result<String, ClientError> {
        let url = self.environment_url(resource_group, environment);
        let resource = match self.get(url).await? {
            Lookup::Found(r) => r,
            Lookup::NotFound => {
                return Err(ClientError::InvalidConfig(format!(
                    "managed environment '{}' not found in resource group '{}'",
                    environment, resource_group
                )));
            }
        };
        let env: EnvironmentResponse =
            serde_json::from_value(serde_json::Value::Object(resource.properties))
                .map_err(|e| ClientError::Decode(e.to_string()))?;
        env.location.ok_or_else(|| {
            ClientError::Decode(format!("managed environment '{}' has no location", environment))
        })
    }
}

#[async_trait]
impl ResourceClient for ArmClient {
    fn environment_id(&self, resource_group: &str, environment: &str) -> String {
        format!("/{}", self.environment_segments(resource_group, environment).join("/"))
    }

    async fn show_service(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Lookup<Resource>, ClientError> {
        self.get(self.container_app_url(resource_group, name)).await
    }

    async fn create_service(
        &self,
        resource_group: &str,
        environment: &str,
        name: &str,
        payload: &ServicePayload,
    ) -> Result<Option<Resource>, ClientError> {
        let url = self.container_app_url(resource_group, name);
        if payload.location.is_some() {
            return self.put(url, payload).await;
        }

        let location = self.environment_location(resource_group, environment).await?;
        debug!(%location, "using managed environment location for new service");
        let payload = ServicePayload {
            location: Some(location),
            ..payload.clone()
        };
        self.put(url, &payload).await
    }

    async fn show_component(
        &self,
        resource_group: &str,
        environment: &str,
        name: &str,
    ) -> Result<Lookup<Resource>, ClientError> {
        self.get(self.component_url(resource_group, environment, name))
            .await
    }

    async fn create_or_update_component(
        &self,
        resource_group: &str,
        environment: &str,
        name: &str,
        payload: &ComponentPayload,
    ) -> Result<Option<Resource>, ClientError> {
        self.put(self.component_url(resource_group, environment, name), payload)
            .await
    }
}
