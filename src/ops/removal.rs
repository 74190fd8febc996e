//! Bucket removal: destroy the dataset, fall back to the API delete.

use tracing::warn;

use crate::admin::AdminApi;
use crate::core::errors::Result;
use crate::dataset::DatasetGateway;

/// Which system finally removed the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalPath {
    Dataset,
    /// The dataset destroy failed with `dataset_error`; the API delete succeeded.
    Api { dataset_error: String },
}

/// Destroy the dataset first. A busy or non-empty dataset is an error with
/// no fallback; any other destroy failure (usually "does not exist" for an
/// API-only bucket) falls back to `DELETE /<bucket>`.
pub fn remove_bucket(
    datasets: &dyn DatasetGateway,
    api: &dyn AdminApi,
    name: &str,
) -> Result<RemovalPath> {
    match datasets.destroy_bucket(name) {
        Ok(()) => Ok(RemovalPath::Dataset),
        Err(err) if err.is_busy_or_not_empty() => Err(err),
        Err(err) => {
            warn!(bucket = name, error = %err, "dataset destroy failed, attempting API delete");
            api.delete_bucket(name)?;
            Ok(RemovalPath::Api {
                dataset_error: err.message(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::VgwError;
    use crate::ops::fakes::{FakeAdmin, FakeDatasets};

    #[test]
    fn dataset_destroy_wins_when_it_succeeds() {
        let datasets = FakeDatasets::with_buckets(&[("b", "1T")]);
        let api = FakeAdmin::default();
        assert_eq!(remove_bucket(&datasets, &api, "b").unwrap(), RemovalPath::Dataset);
        assert!(api.calls().is_empty());
    }

    #[test]
    fn busy_dataset_is_not_deleted_through_the_api() {
        let datasets = FakeDatasets::default();
        datasets.fail("destroy", "cannot destroy 'tank/b': dataset is busy");
        let api = FakeAdmin::default();
        let err = remove_bucket(&datasets, &api, "b").unwrap_err();
        assert!(err.is_busy_or_not_empty());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn missing_dataset_falls_back_to_api() {
        let datasets = FakeDatasets::default();
        datasets.fail("destroy", "cannot open 'tank/b': dataset does not exist");
        let api = FakeAdmin::with_buckets(&[("b", "bob")]);
        let path = remove_bucket(&datasets, &api, "b").unwrap();
        match path {
            RemovalPath::Api { dataset_error } => {
                assert!(dataset_error.contains("does not exist"));
            }
            RemovalPath::Dataset => panic!("expected API fallback"),
        }
        assert_eq!(api.calls(), ["delete_bucket b"]);
    }

    #[test]
    fn api_fallback_failure_is_reported() {
        let datasets = FakeDatasets::default();
        datasets.fail("destroy", "cannot open 'tank/b': dataset does not exist");
        let api = FakeAdmin::default();
        api.fail("delete_bucket", 409, "BucketNotEmpty");
        let err = remove_bucket(&datasets, &api, "b").unwrap_err();
        assert!(matches!(err, VgwError::Api { status: 409, .. }), "{err:?}");
    }
}
