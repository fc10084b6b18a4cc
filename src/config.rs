//! Layered configuration.
//!
//! Every command takes an `*Args` struct whose fields are all optional. The
//! same struct is deserialized from the TOML file given with `--config`, and
//! the command line is overlaid on top of it before the result is validated
//! into the command's `*Config`.
use crate::addon::SettingsError;
use clap::Args;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod addon;
#[cfg(feature = "arm")]
pub mod binding;
pub mod parsers;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ConfigError {
    pub(crate) fn missing(flag: &str) -> Self {
        Self::Validation(format!("missing required option '--{}'", flag))
    }
}

/// Trait for merging two partial structs.
pub trait Overlay {
    /// self is the base layer, over is the top layer.
    fn overlay(self, over: Self) -> Self;
}

// If top layer exists, use it. Otherwise keep base.
impl<T> Overlay for Option<T> {
    fn overlay(self, over: Self) -> Self {
        over.or(self)
    }
}

impl<T> Overlay for Vec<T> {
    fn overlay(self, over: Self) -> Self {
        if over.is_empty() { self } else { over }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LayeredArgs<T: Args> {
    /// Path to configuration file
    #[arg(long, env = "DAPRCTL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub inner: T,
}

impl<T> LayeredArgs<T>
where
    T: Args,
{
    pub fn load<C>(self) -> Result<C, ConfigError>
    where
        T: Layered<C>,
    {
        self.inner.resolve(self.config.as_deref())
    }
}

pub trait Layered<C>: Overlay + DeserializeOwned + Default + Sized {
    fn resolve(self, config_path: Option<&Path>) -> Result<C, ConfigError>;
}

impl<T, C> Layered<C> for T
where
    T: Overlay + DeserializeOwned + Default,
    T: TryInto<C>,
    <T as TryInto<C>>::Error: Into<ConfigError>,
{
    fn resolve(self, config_path: Option<&Path>) -> Result<C, ConfigError> {
        let base = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str::<Self>(&content)?
            }
            None => Self::default(),
        };

        let merged = base.overlay(self);

        merged.try_into().map_err(Into::into)
    }
}
