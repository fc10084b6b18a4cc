use crate::config::LayeredArgs;
use crate::config::addon::{AddonCreateArgs, AddonUpdateArgs};
#[cfg(feature = "arm")]
use crate::config::binding::BindingArgs;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "daprctl")]
#[command(version, about = "Provision Dapr bound services and configure the Dapr cluster extension", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Container Apps bound services and their Dapr components
    #[cfg(feature = "arm")]
    #[command(subcommand)]
    Binding(BindingCommand),

    /// Dapr cluster extension
    #[command(subcommand)]
    Addon(AddonCommand),
}

#[cfg(feature = "arm")]
#[derive(Subcommand, Debug)]
pub enum BindingCommand {
    /// Ensure a managed service and a Dapr component bound to it exist.
    ///
    /// Prints the service and component resource ids as JSON.
    Provision(Box<LayeredArgs<BindingArgs>>),
}

#[derive(Subcommand, Debug)]
pub enum AddonCommand {
    /// Build the extension to create, detecting an existing Dapr install.
    ///
    /// Prints the release name and extension descriptor as JSON.
    Create(Box<LayeredArgs<AddonCreateArgs>>),

    /// Build the patch for an installed extension.
    ///
    /// Prints the patch descriptor as JSON.
    Update(Box<LayeredArgs<AddonUpdateArgs>>),
}

pub mod addon;
#[cfg(feature = "arm")]
pub mod binding;

pub use addon::{create, update};
#[cfg(feature = "arm")]
pub use binding::provision;
