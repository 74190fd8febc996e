//! The admin surface both front ends drive: seams, registry, and audit trail.
//!
//! Every mutating call appends one audit record whatever its outcome.

#![allow(missing_docs)]

use tracing::info;

use crate::accounts::{AccountRegistry, User};
use crate::admin::policy::public_read_policy_body;
use crate::admin::{AdminApi, AdminClient};
use crate::core::config::Config;
use crate::core::errors::Result;
use crate::dataset::{Bucket, BucketSpec, DatasetGateway, SystemRunner, ZfsGateway};
use crate::logger::audit::{AuditEvent, AuditLog, AuditRecord};
use crate::ops::provision::{self, ProvisionRequest, ProvisionSummary};
use crate::ops::reconcile::reconcile;
use crate::ops::removal::{self, RemovalPath};

pub struct Services {
    api: Box<dyn AdminApi>,
    datasets: Box<dyn DatasetGateway>,
    registry: AccountRegistry,
    audit: AuditLog,
}

impl Services {
    /// Wire the HTTP client, the `zfs` gateway and the audit file from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api = AdminClient::new(&config.gateway)?;
        let datasets = ZfsGateway::new(&config.storage, SystemRunner);
        Ok(Self::new(
            Box::new(api),
            Box::new(datasets),
            AccountRegistry::new(config.storage.users_json_path.clone()),
            AuditLog::open(&config.logging),
        ))
    }

    #[must_use]
    pub fn new(
        api: Box<dyn AdminApi>,
        datasets: Box<dyn DatasetGateway>,
        registry: AccountRegistry,
        audit: AuditLog,
    ) -> Self {
        Self {
            api,
            datasets,
            registry,
            audit,
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.registry.list()
    }

    /// Reconciled bucket view.
    pub fn list_buckets(&self) -> Result<Vec<Bucket>> {
        reconcile(self.datasets.as_ref(), self.api.as_ref())
    }

    pub fn create_user(&mut self, user: &User) -> Result<()> {
        let outcome = self.api.create_user(user);
        self.audit(
            AuditRecord::from_outcome(AuditEvent::UserCreate, &user.access, &outcome)
                .with_details(format!("role={}", user.role)),
        );
        outcome
    }

    pub fn update_user(&mut self, user: &User) -> Result<()> {
        let outcome = self.api.update_user(user);
        self.audit(
            AuditRecord::from_outcome(AuditEvent::UserUpdate, &user.access, &outcome)
                .with_details(format!("role={}", user.role)),
        );
        outcome
    }

    pub fn delete_user(&mut self, access: &str) -> Result<()> {
        let outcome = self.api.delete_user(access);
        self.audit(AuditRecord::from_outcome(
            AuditEvent::UserDelete,
            access,
            &outcome,
        ));
        outcome
    }

    /// Create the backing dataset. Ownership is a separate call.
    pub fn create_bucket(&mut self, spec: &BucketSpec) -> Result<()> {
        let outcome = self.datasets.create_bucket(spec);
        self.audit(
            AuditRecord::from_outcome(AuditEvent::BucketCreate, &spec.name, &outcome)
                .with_details(format!("quota={}", spec.quota)),
        );
        outcome
    }

    pub fn change_owner(&mut self, bucket: &str, owner: &str) -> Result<()> {
        let outcome = self.api.change_bucket_owner(bucket, owner);
        self.audit(
            AuditRecord::from_outcome(AuditEvent::OwnerChange, bucket, &outcome)
                .with_details(format!("owner={owner}")),
        );
        outcome
    }

    /// `Ok(false)` when the gateway reports no policy attached.
    pub fn policy_exists(&self, bucket: &str) -> Result<bool> {
        match self.api.get_bucket_policy(bucket) {
            Ok(_) => Ok(true),
            Err(err) if err.is_policy_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Attach the public-read policy with write rights for `owner`.
    pub fn make_public(&mut self, bucket: &str, owner: &str) -> Result<()> {
        let outcome = public_read_policy_body(bucket, owner)
            .and_then(|policy| self.api.set_bucket_policy(bucket, &policy));
        self.audit(
            AuditRecord::from_outcome(AuditEvent::PolicySet, bucket, &outcome)
                .with_details(format!("owner={owner}")),
        );
        outcome
    }

    pub fn make_private(&mut self, bucket: &str) -> Result<()> {
        let outcome = self.api.delete_bucket_policy(bucket);
        self.audit(AuditRecord::from_outcome(
            AuditEvent::PolicyRemove,
            bucket,
            &outcome,
        ));
        outcome
    }

    /// Owner named by the bucket ACL; empty when none.
    pub fn bucket_owner(&self, bucket: &str) -> Result<String> {
        self.api.get_bucket_owner(bucket)
    }

    pub fn remove_bucket(&mut self, name: &str) -> Result<RemovalPath> {
        let outcome = removal::remove_bucket(self.datasets.as_ref(), self.api.as_ref(), name);
        let mut record = AuditRecord::from_outcome(AuditEvent::BucketDelete, name, &outcome);
        if let Ok(path) = &outcome {
            record = record.with_details(match path {
                RemovalPath::Dataset => "via=dataset",
                RemovalPath::Api { .. } => "via=api",
            });
        }
        self.audit(record);
        outcome
    }

    pub fn provision(&mut self, req: &ProvisionRequest) -> Result<ProvisionSummary> {
        let outcome = provision::provision(self.api.as_ref(), self.datasets.as_ref(), req);
        let mut record = AuditRecord::from_outcome(AuditEvent::Provision, &req.access, &outcome)
            .with_details(format!("bucket={}", req.bucket));
        if let Err(err) = &outcome {
            let done = provision::completed_steps(err);
            if !done.is_empty() {
                record = record.with_details(format!(
                    "bucket={} completed={}",
                    req.bucket,
                    done.join(",")
                ));
            }
        }
        self.audit(record);
        if let Ok(summary) = &outcome {
            info!(access = %summary.access, bucket = %summary.bucket, "provisioned");
        }
        outcome
    }

    fn audit(&mut self, record: AuditRecord) {
        self.audit.record(&record);
    }
}
