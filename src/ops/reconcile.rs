//! Merge dataset truth (quota, usage, mountpoint) with API truth (ownership).
//!
//! Either source may fail on its own and the merge degrades to the other.
//! Only when both fail is the merge an error. A failed per-bucket ACL lookup
//! keeps whatever owner the bucket already had and is logged at `warn`.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::admin::{AdminApi, ApiBucket};
use crate::core::errors::{Result, VgwError};
use crate::dataset::{Bucket, DatasetGateway};

/// One bucket view, sorted by name with no duplicates.
pub fn reconcile(datasets: &dyn DatasetGateway, api: &dyn AdminApi) -> Result<Vec<Bucket>> {
    let dataset_list = datasets.list_buckets();
    let api_list = api.list_buckets();

    let (mut buckets, api_buckets) = match (dataset_list, api_list) {
        (Err(dataset_err), Err(api_err)) => {
            return Err(VgwError::ListFailed {
                dataset: dataset_err.message(),
                api: api_err.message(),
            });
        }
        (Ok(buckets), Err(api_err)) => {
            warn!(error = %api_err, "admin API bucket listing failed; owners unavailable");
            let mut buckets = dedupe(buckets);
            buckets.sort_by(|a, b| a.name.cmp(&b.name));
            return Ok(buckets);
        }
        (Err(dataset_err), Ok(api_buckets)) => {
            warn!(error = %dataset_err, "dataset listing failed; showing API buckets only");
            (Vec::new(), api_buckets)
        }
        (Ok(buckets), Ok(api_buckets)) => (dedupe(buckets), api_buckets),
    };

    let api_index: BTreeMap<&str, &ApiBucket> =
        api_buckets.iter().map(|b| (b.name.as_str(), b)).collect();

    for bucket in &mut buckets {
        if let Some(info) = api_index.get(bucket.name.as_str())
            && !info.owner.is_empty()
        {
            bucket.owner.clone_from(&info.owner);
        }
        apply_acl_owner(api, bucket);
    }

    let known: HashSet<String> = buckets.iter().map(|b| b.name.clone()).collect();
    for (name, info) in api_index {
        if known.contains(name) {
            continue;
        }
        let mut placeholder = Bucket::placeholder(name, info.owner.clone());
        apply_acl_owner(api, &mut placeholder);
        buckets.push(placeholder);
    }

    buckets.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = buckets.len(), "reconciled bucket view");
    Ok(buckets)
}

/// ACL owner wins when the lookup succeeds with a non-empty value.
fn apply_acl_owner(api: &dyn AdminApi, bucket: &mut Bucket) {
    match api.get_bucket_owner(&bucket.name) {
        Ok(owner) if !owner.is_empty() => bucket.owner = owner,
        Ok(_) => {}
        Err(error) => {
            warn!(bucket = %bucket.name, %error, "ACL owner lookup failed; keeping listed owner");
        }
    }
}

fn dedupe(buckets: Vec<Bucket>) -> Vec<Bucket> {
    let mut seen = HashSet::new();
    buckets
        .into_iter()
        .filter(|b| seen.insert(b.name.clone()))
        .collect()
}
