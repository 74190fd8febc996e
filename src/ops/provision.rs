//! Create a user, a bucket, and assign ownership as one operation.
//!
//! Steps run in order and stop at the first failure. Committed steps are not
//! undone: an operator can see from the failing step what already exists.

#![allow(missing_docs)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use serde::Serialize;
use tracing::info;

use crate::accounts::{Role, User};
use crate::admin::AdminApi;
use crate::core::errors::{Result, VgwError};
use crate::dataset::{BucketSpec, DatasetGateway};

/// Random bytes behind a generated secret key.
pub const SECRET_BYTES: usize = 48;

/// Step names, in execution order, as they appear in failure messages.
pub static STEPS: [&str; 3] = ["create user", "create bucket", "set bucket owner"];

/// Operator input. Empty `secret`/`owner` take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub access: String,
    pub secret: String,
    pub role: String,
    pub user_id: i64,
    pub group_id: i64,
    pub project_id: i64,
    pub bucket: String,
    pub quota: String,
    pub owner: String,
}

/// What was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    pub access: String,
    pub secret: String,
    pub role: String,
    #[serde(rename = "userID")]
    pub user_id: i64,
    #[serde(rename = "groupID")]
    pub group_id: i64,
    #[serde(rename = "projectID")]
    pub project_id: i64,
    pub bucket: String,
    pub quota: String,
    pub owner: String,
    #[serde(rename = "secretGenerated")]
    pub secret_generated: bool,
}

/// 48 random bytes, standard base64 (64 characters).
#[must_use]
pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Check input before anything is mutated.
pub fn validate(req: &ProvisionRequest) -> Result<Role> {
    if req.access.is_empty() {
        return Err(VgwError::validation("access key is required (use --access)"));
    }
    let role: Role = req
        .role
        .parse()
        .map_err(|_| VgwError::validation("role must be admin, user, or userplus"))?;
    if req.bucket.is_empty() {
        return Err(VgwError::validation("bucket name is required (use --bucket)"));
    }
    if req.quota.is_empty() {
        return Err(VgwError::validation("quota is required (use --quota, e.g. 2T)"));
    }
    Ok(role)
}

/// Run `create user -> create bucket -> set bucket owner`.
///
/// A step failure is returned as [`VgwError::Step`] naming that step.
pub fn provision(
    api: &dyn AdminApi,
    datasets: &dyn DatasetGateway,
    req: &ProvisionRequest,
) -> Result<ProvisionSummary> {
    let role = validate(req)?;
    let owner = if req.owner.is_empty() {
        req.access.clone()
    } else {
        req.owner.clone()
    };
    let secret_generated = req.secret.is_empty();
    let secret = if secret_generated {
        generate_secret_key()
    } else {
        req.secret.clone()
    };

    let user = User {
        access: req.access.clone(),
        secret: secret.clone(),
        role: role.as_str().to_string(),
        user_id: req.user_id,
        group_id: req.group_id,
        project_id: req.project_id,
    };
    api.create_user(&user).map_err(|err| err.at_step(STEPS[0]))?;
    info!(access = %user.access, role = %user.role, "provision: user created");

    datasets
        .create_bucket(&BucketSpec::new(req.bucket.clone(), req.quota.clone()))
        .map_err(|err| err.at_step(STEPS[1]))?;
    info!(bucket = %req.bucket, quota = %req.quota, "provision: bucket created");

    api.change_bucket_owner(&req.bucket, &owner)
        .map_err(|err| err.at_step(STEPS[2]))?;
    info!(bucket = %req.bucket, owner = %owner, "provision: owner assigned");

    Ok(ProvisionSummary {
        access: user.access,
        secret,
        role: user.role,
        user_id: req.user_id,
        group_id: req.group_id,
        project_id: req.project_id,
        bucket: req.bucket.clone(),
        quota: req.quota.clone(),
        owner,
        secret_generated,
    })
}

/// Steps that had already committed when `err` stopped the workflow.
#[must_use]
pub fn completed_steps(err: &VgwError) -> &'static [&'static str] {
    match err {
        VgwError::Step { step, .. } => match STEPS.iter().position(|s| s == step) {
            Some(idx) => &STEPS[..idx],
            None => &[],
        },
        _ => &[],
    }
}
