use crate::{
    addon::{AddonError, PromptError},
    binding::{BindingError, ClientError, CreationFailure},
    config::ConfigError,
    logging::LoggingError,
};
use sysexits::ExitCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaprctlError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Addon(#[from] AddonError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid extension document: {0}")]
    Json(#[from] serde_json::Error),
}

impl std::process::Termination for DaprctlError {
    fn report(self) -> std::process::ExitCode {
        let code = self.exit_code();
        if tracing::dispatcher::has_been_set() {
            tracing::error!(exit_code = code, "{}", self);
        } else {
            eprintln!("error: {}", self);
        }
        std::process::ExitCode::from(code)
    }
}

impl DaprctlError {
    pub fn exit_code(&self) -> u8 {
        match self {
            DaprctlError::Binding(e) => match e {
                BindingError::UnsupportedServiceType(_) => ExitCode::Usage.into(),
                BindingError::UnsupportedComponentBinding { .. } => ExitCode::Usage.into(),
                BindingError::Lookup { source, .. } => Self::client_exit_code(source),
                BindingError::ServiceCreationFailed { source, .. }
                | BindingError::ComponentCreationFailed { source, .. } => match source {
                    CreationFailure::Client(c) => Self::client_exit_code(c),
                    CreationFailure::EmptyResult => ExitCode::Protocol.into(),
                },
                BindingError::MissingServiceId(_) => ExitCode::Protocol.into(),
                BindingError::MissingComponentId(_) => ExitCode::Protocol.into(),
            },
            DaprctlError::Client(e) => Self::client_exit_code(e),
            DaprctlError::Addon(e) => match e {
                AddonError::UnsupportedScope(_) => ExitCode::Usage.into(),
                AddonError::Prompt(PromptError::NotInteractive) => ExitCode::Usage.into(),
                AddonError::Prompt(PromptError::Terminal(_)) => ExitCode::IoErr.into(),
            },
            DaprctlError::Config(e) => match e {
                ConfigError::Io { .. } => ExitCode::NoInput.into(),
                ConfigError::Parse(_) => ExitCode::Config.into(),
                ConfigError::Validation(_) => ExitCode::Usage.into(),
                ConfigError::Settings(_) => ExitCode::DataErr.into(),
            },
            DaprctlError::Logging(_) => ExitCode::Software.into(),
            DaprctlError::Io { .. } => ExitCode::NoInput.into(),
            DaprctlError::Json(_) => ExitCode::DataErr.into(),
        }
    }

    fn client_exit_code(e: &ClientError) -> u8 {
        match e {
            ClientError::Network(_) => ExitCode::Unavailable.into(),
            ClientError::Unauthorized(_) => ExitCode::NoPerm.into(),
            ClientError::RateLimit => ExitCode::TempFail.into(),
            ClientError::Api { .. } => ExitCode::Unavailable.into(),
            ClientError::Decode(_) => ExitCode::Protocol.into(),
            ClientError::InvalidConfig(_) => ExitCode::Config.into(),
        }
    }
}
