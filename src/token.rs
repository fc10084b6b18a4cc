//! Bearer token handling for the resource manager client.

use crate::binding::ClientError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::str::FromStr;

/// Where the bearer token comes from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    Literal(SecretString),
    File(PathBuf),
}

impl PartialEq for TokenSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(l), Self::Literal(r)) => l.expose_secret() == r.expose_secret(),
            (Self::File(l), Self::File(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for TokenSource {}

/// An access token for Azure Resource Manager, given either directly or as a
/// `file:` path whose contents are read when the client is built.
///
/// Acquiring the token is left to the caller, e.g.
/// `az account get-access-token --query accessToken -o tsv`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct AuthToken(TokenSource);

impl AuthToken {
    pub fn source(&self) -> &TokenSource {
        &self.0
    }

    /// Resolves the token source to the actual secret string.
    pub async fn resolve(&self) -> Result<SecretString, ClientError> {
        match &self.0 {
            TokenSource::Literal(s) => Ok(s.clone()),
            TokenSource::File(path) => {
                let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                    ClientError::InvalidConfig(format!(
                        "failed to read token file {:?}: {}",
                        path, e
                    ))
                })?;
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    return Err(ClientError::InvalidConfig(format!(
                        "token file {:?} is empty",
                        path
                    )));
                }
                Ok(SecretString::new(trimmed.to_owned().into()))
            }
        }
    }
}

impl Serialize for AuthToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Do not expose the actual token.
        serializer.serialize_str("[REDACTED]")
    }
}

impl TryFrom<String> for AuthToken {
    type Error = ClientError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for AuthToken {
    type Err = ClientError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ClientError::InvalidConfig("auth token is empty".to_string()));
        }
        if let Some(path) = s.strip_prefix("file:") {
            let cleaned = path.strip_prefix("//").unwrap_or(path);
            if cleaned.is_empty() {
                return Err(ClientError::InvalidConfig(
                    "auth token file path is empty".to_string(),
                ));
            }
            Ok(Self(TokenSource::File(PathBuf::from(cleaned))))
        } else {
            Ok(Self(TokenSource::Literal(SecretString::new(
                s.to_owned().into(),
            ))))
        }
    }
}
