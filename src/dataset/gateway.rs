//! Bucket records and the dataset-management seam.

#![allow(missing_docs)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

/// Value shown for any dataset-sourced field that is unknown.
pub const UNKNOWN: &str = "-";

/// One bucket as presented to the operator.
///
/// Dataset columns come from the volume manager; `owner` is filled in by
/// reconciliation from the admin API and never from dataset metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub mountpoint: String,
    pub quota: String,
    pub used: String,
    pub available: String,
    pub owner: String,
}

impl Bucket {
    /// Record for a bucket the API knows about but no dataset backs.
    #[must_use]
    pub fn placeholder(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mountpoint: UNKNOWN.to_string(),
            quota: UNKNOWN.to_string(),
            used: UNKNOWN.to_string(),
            available: UNKNOWN.to_string(),
            owner: owner.into(),
        }
    }

    /// True when no dataset backs this record.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.mountpoint == UNKNOWN && self.used == UNKNOWN && self.available == UNKNOWN
    }
}

/// Parameters for creating a bucket dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSpec {
    pub name: String,
    /// Empty means "no quota option".
    pub quota: String,
    /// `None` derives `<mount_base>/<name>`.
    pub mountpoint: Option<String>,
}

impl BucketSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, quota: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quota: quota.into(),
            mountpoint: None,
        }
    }
}

/// List, create, and destroy the datasets that back buckets.
pub trait DatasetGateway: Send + Sync {
    /// Every bucket dataset under the pool base, sorted by name, owner `"-"`.
    fn list_buckets(&self) -> Result<Vec<Bucket>>;

    fn create_bucket(&self, spec: &BucketSpec) -> Result<()>;

    /// Recursive destroy. Busy or non-empty failures keep their tool output.
    fn destroy_bucket(&self, name: &str) -> Result<()>;
}

impl<T: DatasetGateway + ?Sized> DatasetGateway for Arc<T> {
    fn list_buckets(&self) -> Result<Vec<Bucket>> {
        (**self).list_buckets()
    }

    fn create_bucket(&self, spec: &BucketSpec) -> Result<()> {
        (**self).create_bucket(spec)
    }

    fn destroy_bucket(&self, name: &str) -> Result<()> {
        (**self).destroy_bucket(name)
    }
}
