//! Gateway admin API: request signing, payload codecs, policy documents, and the client.

pub mod client;
pub mod policy;
pub mod sigv4;
pub mod xml;

pub use client::{AdminApi, AdminClient};
pub use xml::ApiBucket;
