//! Orchestration over the admin API and dataset seams.

pub mod provision;
pub mod reconcile;
pub mod removal;
pub mod services;

#[cfg(test)]
pub(crate) mod fakes;

pub use provision::{ProvisionRequest, ProvisionSummary, generate_secret_key};
pub use reconcile::reconcile;
pub use removal::{RemovalPath, remove_bucket};
pub use services::Services;
