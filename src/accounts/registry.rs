//! Read-only view of the gateway's account file (`users.json`).
//!
//! The gateway owns this file; the manager only lists and looks up accounts.
//! Mutations go through the admin API.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VgwError};

/// Gateway account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    #[serde(rename = "userplus")]
    UserPlus,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::UserPlus => "userplus",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = VgwError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "userplus" => Ok(Self::UserPlus),
            _ => Err(VgwError::validation("Role must be admin, user, or userplus")),
        }
    }
}

/// One gateway account as stored in the registry.
///
/// `role` stays a plain string: the registry is written by the gateway and may
/// carry roles this tool does not manage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub access: String,
    pub secret: String,
    pub role: String,
    #[serde(rename = "userID", default)]
    pub user_id: i64,
    #[serde(rename = "groupID", default)]
    pub group_id: i64,
    /// Zero means "no project".
    #[serde(rename = "projectID", default, skip_serializing_if = "is_zero")]
    pub project_id: i64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(rename = "accessAccounts", default)]
    access_accounts: BTreeMap<String, User>,
}

/// Loader for the account file at a fixed path.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    path: PathBuf,
}

impl AccountRegistry {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All accounts sorted ascending by access key.
    pub fn list(&self) -> Result<Vec<User>> {
        let file = self.read()?;
        let mut users: Vec<User> = file.access_accounts.into_values().collect();
        users.sort_by(|a, b| a.access.cmp(&b.access));
        Ok(users)
    }

    /// Look up one account by its registry key.
    pub fn get(&self, access: &str) -> Result<User> {
        self.read()?
            .access_accounts
            .remove(access)
            .ok_or_else(|| VgwError::NotFound {
                kind: "user",
                name: access.to_string(),
            })
    }

    fn read(&self) -> Result<RegistryFile> {
        let raw = fs::read_to_string(&self.path).map_err(|source| VgwError::io(&self.path, source))?;
        serde_json::from_str(&raw).map_err(|error| VgwError::Parse {
            context: "users.json",
            details: error.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "accessAccounts": {
            "zed": {"access": "zed", "secret": "z-secret", "role": "user", "userID": 1001, "groupID": 1001},
            "alice": {"access": "alice", "secret": "a-secret", "role": "admin", "userID": 0, "groupID": 0, "projectID": 7},
            "mallory": {"access": "mallory", "secret": "m-secret", "role": "userplus", "userID": 5, "groupID": 6}
        }
    }"#;

    fn registry_with(contents: &str) -> (tempfile::TempDir, AccountRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, contents).unwrap();
        (dir, AccountRegistry::new(path))
    }

    #[test]
    fn list_is_sorted_by_access() {
        let (_dir, registry) = registry_with(SAMPLE);
        let users = registry.list().unwrap();
        let keys: Vec<&str> = users.iter().map(|u| u.access.as_str()).collect();
        assert_eq!(keys, ["alice", "mallory", "zed"]);
        assert_eq!(users[0].project_id, 7);
        assert_eq!(users[2].user_id, 1001);
    }

    #[test]
    fn get_misses_are_not_found() {
        let (_dir, registry) = registry_with(SAMPLE);
        assert_eq!(registry.get("zed").unwrap().secret, "z-secret");
        let err = registry.get("nobody").unwrap_err();
        assert!(matches!(err, VgwError::NotFound { kind: "user", .. }));
    }

    #[test]
    fn empty_registry_lists_nothing() {
        let (_dir, registry) = registry_with("{}");
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let (_dir, registry) = registry_with("{\"accessAccounts\": [");
        let err = registry.list().unwrap_err();
        assert!(matches!(err, VgwError::Parse { context: "users.json", .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let registry = AccountRegistry::new("/nonexistent_vgw_test_dir/users.json");
        assert!(matches!(registry.list().unwrap_err(), VgwError::Io { .. }));
    }

    #[test]
    fn project_id_is_omitted_when_zero() {
        let user = User {
            access: "a".into(),
            secret: "s".into(),
            role: "user".into(),
            ..User::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("projectID").is_none());
        assert_eq!(json["userID"], 0);
    }

    #[test]
    fn role_parsing() {
        assert_eq!("userplus".parse::<Role>().unwrap(), Role::UserPlus);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        let err = "root".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("admin, user, or userplus"));
    }
}
