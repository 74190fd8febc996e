//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use vgw_manager::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, VgwError};

// Accounts
pub use crate::accounts::{AccountRegistry, Role, User};

// Admin API
pub use crate::admin::{AdminApi, AdminClient, ApiBucket};

// Datasets
pub use crate::dataset::{Bucket, BucketSpec, CommandRunner, DatasetGateway, SystemRunner, ZfsGateway};

// Logging
pub use crate::logger::audit::{AuditEvent, AuditLog, AuditRecord};

// Operations
pub use crate::ops::{
    ProvisionRequest, ProvisionSummary, RemovalPath, Services, generate_secret_key, reconcile,
    remove_bucket,
};
