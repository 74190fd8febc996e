//! In-memory stand-ins for the admin API and dataset gateway.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::accounts::User;
use crate::admin::{AdminApi, ApiBucket};
use crate::core::errors::{Result, VgwError};
use crate::dataset::{Bucket, BucketSpec, DatasetGateway};

/// Admin API fake. Every call is logged as `"<op> <args>"`.
#[derive(Default)]
pub struct FakeAdmin {
    pub buckets: Mutex<Vec<ApiBucket>>,
    pub acl_owners: Mutex<HashMap<String, String>>,
    pub policies: Mutex<HashMap<String, String>>,
    /// Operation name -> (status, body) returned as an API error.
    pub failures: Mutex<HashMap<&'static str, (u16, String)>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeAdmin {
    pub fn with_buckets(entries: &[(&str, &str)]) -> Self {
        let fake = Self::default();
        *fake.buckets.lock().unwrap() = entries
            .iter()
            .map(|(name, owner)| ApiBucket {
                name: (*name).to_string(),
                creation_date: String::new(),
                owner: (*owner).to_string(),
            })
            .collect();
        fake
    }

    pub fn fail(&self, op: &'static str, status: u16, body: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, (status, body.to_string()));
    }

    pub fn set_acl_owner(&self, bucket: &str, owner: &str) {
        self.acl_owners
            .lock()
            .unwrap()
            .insert(bucket.to_string(), owner.to_string());
    }

    pub fn set_policy(&self, bucket: &str, policy: &str) {
        self.policies
            .lock()
            .unwrap()
            .insert(bucket.to_string(), policy.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, op: &'static str, args: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{op} {args}").trim().to_string());
        match self.failures.lock().unwrap().get(op) {
            Some((status, body)) => Err(VgwError::Api {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl AdminApi for FakeAdmin {
    fn create_user(&self, user: &User) -> Result<()> {
        self.enter("create_user", &user.access)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        self.enter("update_user", &user.access)
    }

    fn delete_user(&self, access: &str) -> Result<()> {
        self.enter("delete_user", access)
    }

    fn change_bucket_owner(&self, bucket: &str, owner: &str) -> Result<()> {
        self.enter("change_bucket_owner", &format!("{bucket} {owner}"))?;
        self.set_acl_owner(bucket, owner);
        Ok(())
    }

    fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.enter("set_bucket_policy", bucket)?;
        self.set_policy(bucket, policy);
        Ok(())
    }

    fn delete_bucket_policy(&self, bucket: &str) -> Result<()> {
        self.enter("delete_bucket_policy", bucket)?;
        self.policies.lock().unwrap().remove(bucket);
        Ok(())
    }

    fn get_bucket_policy(&self, bucket: &str) -> Result<String> {
        self.enter("get_bucket_policy", bucket)?;
        self.policies
            .lock()
            .unwrap()
            .get(bucket)
            .cloned()
            .ok_or_else(|| VgwError::Api {
                status: 404,
                body: "<Error><Code>NoSuchBucketPolicy</Code></Error>".to_string(),
            })
    }

    fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.enter("delete_bucket", bucket)?;
        self.buckets.lock().unwrap().retain(|b| b.name != bucket);
        Ok(())
    }

    fn list_buckets(&self) -> Result<Vec<ApiBucket>> {
        self.enter("list_buckets", "")?;
        Ok(self.buckets.lock().unwrap().clone())
    }

    fn get_bucket_owner(&self, bucket: &str) -> Result<String> {
        self.enter("get_bucket_owner", bucket)?;
        Ok(self
            .acl_owners
            .lock()
            .unwrap()
            .get(bucket)
            .cloned()
            .unwrap_or_default())
    }
}

/// Dataset gateway fake backed by a vector.
#[derive(Default)]
pub struct FakeDatasets {
    pub buckets: Mutex<Vec<Bucket>>,
    /// Operation name -> combined tool output of the failure.
    pub failures: Mutex<HashMap<&'static str, String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDatasets {
    pub fn with_buckets(entries: &[(&str, &str)]) -> Self {
        let fake = Self::default();
        *fake.buckets.lock().unwrap() = entries
            .iter()
            .map(|(name, quota)| Bucket {
                name: (*name).to_string(),
                mountpoint: format!("/tank/{name}"),
                quota: (*quota).to_string(),
                used: "96K".to_string(),
                available: (*quota).to_string(),
                owner: "-".to_string(),
            })
            .collect();
        fake
    }

    pub fn fail(&self, op: &'static str, output: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, output.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, op: &'static str, args: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{op} {args}").trim().to_string());
        match self.failures.lock().unwrap().get(op) {
            Some(output) => Err(VgwError::Subprocess {
                command: format!("zfs {op}"),
                status: "1".to_string(),
                output: output.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DatasetGateway for FakeDatasets {
    fn list_buckets(&self) -> Result<Vec<Bucket>> {
        self.enter("list", "")?;
        let mut buckets = self.buckets.lock().unwrap().clone();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    fn create_bucket(&self, spec: &BucketSpec) -> Result<()> {
        self.enter("create", &spec.name)?;
        self.buckets.lock().unwrap().push(Bucket {
            name: spec.name.clone(),
            mountpoint: format!("/tank/{}", spec.name),
            quota: spec.quota.clone(),
            used: "96K".to_string(),
            available: spec.quota.clone(),
            owner: "-".to_string(),
        });
        Ok(())
    }

    fn destroy_bucket(&self, name: &str) -> Result<()> {
        self.enter("destroy", name)?;
        self.buckets.lock().unwrap().retain(|b| b.name != name);
        Ok(())
    }
}
