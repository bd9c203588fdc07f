//! Shared types and collaborator clients for the Zero Downtime Tester.
//!
//! Everything the harness binary needs to talk to its collaborators lives
//! here: domain types, suite configuration, error taxonomy, the HTTP
//! platform client, the upgrade-command executor, and scripted mocks for
//! tests.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod mock;
pub mod types;

pub use api::{ApiClient, HttpCheck, PlatformApi};
pub use config::SuiteConfig;
pub use deploy::{CommandDeployer, Deployer};
pub use errors::{ApiError, SetupError, UpgradeError};
pub use types::{LaunchReceipt, TargetId, WorkflowDescriptor, WorkflowEvent};
