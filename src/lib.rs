//! Builds and runs the `docker run` invocation for a Unity test job on a
//! linux or windows CI host.

pub mod action;
pub mod config;
pub mod docker;
pub mod errors;
pub mod models;
pub mod platform;
pub mod runners;

pub use action::ActionMetadata;
pub use docker::{Docker, DockerCli, Executor, RunOutcome};
pub use errors::{Error, Result};
pub use models::{BuildConfiguration, Secret, TestMode};
pub use platform::{check_compatibility, Platform};
pub use runners::models::ContainerInvocation;
