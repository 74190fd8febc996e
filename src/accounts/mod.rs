//! Gateway user accounts: the persisted registry and the user record.

pub mod registry;

pub use registry::{AccountRegistry, Role, User};
