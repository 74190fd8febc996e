//! Bucket-backing datasets: the gateway seam, subprocess runner, and ZFS implementation.

pub mod gateway;
pub mod runner;
pub mod zfs;

pub use gateway::{Bucket, BucketSpec, DatasetGateway};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use zfs::ZfsGateway;
