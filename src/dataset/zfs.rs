//! ZFS-backed [`DatasetGateway`].

#![allow(missing_docs)]

use tracing::{debug, warn};

use crate::core::config::StorageConfig;
use crate::core::errors::Result;
use crate::dataset::gateway::{Bucket, BucketSpec, DatasetGateway, UNKNOWN};
use crate::dataset::runner::CommandRunner;

const LIST_COLUMNS: &str = "name,mountpoint,quota,used,avail";

/// Dataset gateway that shells out to `zfs`.
pub struct ZfsGateway<R: CommandRunner> {
    runner: R,
    binary: String,
    pool_base: String,
    mount_base: String,
}

impl<R: CommandRunner> ZfsGateway<R> {
    #[must_use]
    pub fn new(storage: &StorageConfig, runner: R) -> Self {
        Self {
            runner,
            binary: storage.zfs_binary.clone(),
            pool_base: storage.pool_base.clone(),
            mount_base: storage.mount_base.clone(),
        }
    }

    /// `<pool_base>/<name>`
    #[must_use]
    pub fn dataset_path(&self, name: &str) -> String {
        format!("{}/{name}", self.pool_base)
    }

    fn list_args(&self) -> Vec<String> {
        [
            "list",
            "-H",
            "-o",
            LIST_COLUMNS,
            "-t",
            "filesystem",
            "-r",
            &self.pool_base,
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    fn create_args(&self, spec: &BucketSpec) -> Vec<String> {
        let mountpoint = spec
            .mountpoint
            .clone()
            .filter(|mp| !mp.is_empty())
            .unwrap_or_else(|| format!("{}/{}", self.mount_base, spec.name));
        let mut args = vec![
            "create".to_string(),
            "-o".to_string(),
            format!("mountpoint={mountpoint}"),
        ];
        if !spec.quota.is_empty() {
            args.push("-o".to_string());
            args.push(format!("quota={}", spec.quota));
        }
        args.push(self.dataset_path(&spec.name));
        args
    }

    fn destroy_args(&self, name: &str) -> Vec<String> {
        vec!["destroy".to_string(), "-r".to_string(), self.dataset_path(name)]
    }

    fn exec(&self, args: &[String]) -> Result<String> {
        let output = self.runner.run(&self.binary, args)?;
        Ok(output.into_result(&self.binary, args)?.stdout)
    }
}

impl<R: CommandRunner> DatasetGateway for ZfsGateway<R> {
    fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let stdout = self.exec(&self.list_args())?;
        let buckets = parse_list(&stdout, &self.pool_base);
        debug!(pool = %self.pool_base, count = buckets.len(), "listed bucket datasets");
        Ok(buckets)
    }

    fn create_bucket(&self, spec: &BucketSpec) -> Result<()> {
        self.exec(&self.create_args(spec))?;
        debug!(bucket = %spec.name, quota = %spec.quota, "created bucket dataset");
        Ok(())
    }

    fn destroy_bucket(&self, name: &str) -> Result<()> {
        if let Err(error) = self.exec(&self.destroy_args(name)) {
            warn!(bucket = name, %error, "dataset destroy failed");
            return Err(error);
        }
        Ok(())
    }
}

/// Parse `zfs list -H` rows into buckets under `pool_base`.
///
/// Short rows, the base itself, and anything outside `<pool_base>/` are skipped.
#[must_use]
pub fn parse_list(output: &str, pool_base: &str) -> Vec<Bucket> {
    let prefix = format!("{pool_base}/");
    let mut buckets: Vec<Bucket> = output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 || fields[0] == pool_base {
                return None;
            }
            let name = fields[0].strip_prefix(&prefix)?;
            Some(Bucket {
                name: name.to_string(),
                mountpoint: fields[1].to_string(),
                quota: fields[2].to_string(),
                used: fields[3].to_string(),
                available: fields[4].to_string(),
                owner: UNKNOWN.to_string(),
            })
        })
        .collect();
    buckets.sort_by(|a, b| a.name.cmp(&b.name));
    buckets
}
