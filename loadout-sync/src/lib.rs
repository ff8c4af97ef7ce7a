//! # loadout-sync
//!
//! Change-set applier, deployment state and the install pipeline.
//!
//! Call [`install_at`] to deploy a checkout's `loadout.yaml`, or
//! [`remove_at`] to drop artifacts from both the manifest and the checkout.
//! [`state::check_at`] reports whether a checkout still matches its last
//! install.

pub mod error;
pub mod pipeline;
pub mod state;
pub mod writer;

pub use error::SyncError;
pub use pipeline::{
    aggregate_deployments, aggregate_removals, install_at, remove_at, render_at, InstallOptions,
    InstallReport,
};
pub use state::{DeploymentState, DeploymentStatus};
pub use writer::{apply_change_set, ApplyReport, WriteResult};
