#![forbid(unsafe_code)]

//! VGW Manager: administration for an S3 gateway whose buckets are ZFS datasets.
//!
//! Two sources of truth are kept apart and merged on read:
//! 1. **Datasets**: quota, usage and mountpoint, via the `zfs` tool
//! 2. **Admin API**: ownership and access policy, via signed HTTP requests
//!
//! [`ops`] reconciles and orchestrates across both; [`tui`] drives an
//! interactive session on top of the same operations.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use vgw_manager::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use vgw_manager::core::config::Config;
//! use vgw_manager::ops::reconcile;
//! ```

pub mod prelude;

pub mod accounts;
pub mod admin;
pub mod core;
pub mod dataset;
pub mod logger;
pub mod ops;
pub mod tui;
