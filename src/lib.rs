//! # daprctl
//!
//! `daprctl` wires Dapr into two hosting platforms.
//!
//! * [`binding`] makes sure an Azure Container Apps bound service (redis,
//!   postgres or kafka) exists and that a Dapr component bound to it exists,
//!   creating each only when missing.
//! * [`addon`] decides how the Dapr cluster extension is installed or
//!   updated: which Helm release it takes over, and which settings must be
//!   forced when an existing install is migrated or downgraded.
//!
//! ## Feature Flags
//!
//! * `arm`: Enables the Azure Resource Manager client and the `binding provision` command.
pub mod addon;
pub mod binding;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logging;
#[cfg(feature = "arm")]
pub mod token;
