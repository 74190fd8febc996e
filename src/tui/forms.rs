//! Input forms: fields, focus cycling, and validation into admin requests.
//!
//! A form with `n` fields has `n + 2` focus positions: the fields, then the
//! submit button, then the cancel button. Focus wraps in both directions.

#![allow(missing_docs)]

use crate::accounts::{Role, User};
use crate::dataset::BucketSpec;
use crate::ops::ProvisionRequest;

use super::model::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    CreateUser,
    UpdateUser,
    CreateBucket,
    ChangeOwner,
    MakePublic,
    Provision,
}

impl FormKind {
    #[must_use]
    pub const fn view(self) -> View {
        match self {
            Self::CreateUser => View::CreateUser,
            Self::UpdateUser => View::UpdateUser,
            Self::CreateBucket => View::CreateBucket,
            Self::ChangeOwner => View::ChangeOwner,
            Self::MakePublic => View::MakeBucketPublic,
            Self::Provision => View::Provision,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CreateUser => "Create New User",
            Self::UpdateUser => "Update User",
            Self::CreateBucket => "Create New Bucket",
            Self::ChangeOwner => "Change Bucket Owner",
            Self::MakePublic => "Make Bucket Public",
            Self::Provision => "Provision: User + Bucket",
        }
    }

    #[must_use]
    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::CreateUser => "[ Create User ]",
            Self::UpdateUser => "[ Update User ]",
            Self::CreateBucket => "[ Create Bucket ]",
            Self::ChangeOwner => "[ Change Owner ]",
            Self::MakePublic => "[ Make Public ]",
            Self::Provision => "[ Provision ]",
        }
    }
}

pub const CANCEL_LABEL: &str = "[ Cancel ]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub placeholder: &'static str,
    pub value: String,
    /// Maximum characters accepted.
    pub limit: usize,
    pub read_only: bool,
}

impl Field {
    fn new(label: &'static str, placeholder: &'static str, limit: usize) -> Self {
        Self {
            label,
            placeholder,
            value: String::new(),
            limit,
            read_only: false,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn locked(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Validated form contents, ready to become a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    CreateUser(User),
    UpdateUser(User),
    CreateBucket { spec: BucketSpec, owner: String },
    ChangeOwner { bucket: String, owner: String },
    MakePublic { bucket: String, owner: String },
    Provision(ProvisionRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<Field>,
    pub focus: usize,
    /// Account being edited; its numeric IDs survive an update.
    origin: Option<User>,
}

impl Form {
    fn build(kind: FormKind, fields: Vec<Field>) -> Self {
        Self {
            kind,
            fields,
            focus: 0,
            origin: None,
        }
    }

    #[must_use]
    pub fn create_user(secret: String) -> Self {
        Self::build(
            FormKind::CreateUser,
            vec![
                Field::new("Access Key:", "Access Key (username)", 64),
                Field::new("Secret Key:", "Secret Key (auto-generated)", 128).with_value(secret),
                Field::new("Role:", "Role (admin/user/userplus)", 20).with_value("user"),
            ],
        )
    }

    /// Access key is shown but locked; focus starts on the secret.
    #[must_use]
    pub fn update_user(user: &User) -> Self {
        let mut form = Self::build(
            FormKind::UpdateUser,
            vec![
                Field::new("Access Key:", "Access Key (username)", 64)
                    .with_value(user.access.as_str())
                    .locked(),
                Field::new("Secret Key:", "Secret Key", 128).with_value(user.secret.as_str()),
                Field::new("Role:", "Role (admin/user/userplus)", 20).with_value(user.role.as_str()),
            ],
        );
        form.focus = 1;
        form.origin = Some(user.clone());
        form
    }

    #[must_use]
    pub fn create_bucket() -> Self {
        Self::build(
            FormKind::CreateBucket,
            vec![
                Field::new("Bucket Name:", "Bucket Name", 63),
                Field::new("Quota:", "Quota (e.g., 2T, 500G, 100M)", 20).with_value("1T"),
                Field::new("Owner:", "Owner Access Key", 64),
            ],
        )
    }

    #[must_use]
    pub fn change_owner() -> Self {
        Self::build(
            FormKind::ChangeOwner,
            vec![
                Field::new("Bucket Name:", "Bucket Name", 63),
                Field::new("New Owner Access Key:", "New Owner Access Key", 64),
            ],
        )
    }

    #[must_use]
    pub fn make_public(bucket: &str, owner: &str) -> Self {
        Self::build(
            FormKind::MakePublic,
            vec![
                Field::new("Bucket Name:", "Bucket Name", 64).with_value(bucket),
                Field::new("Owner Access Key:", "Owner Access Key", 64).with_value(owner),
            ],
        )
    }

    #[must_use]
    pub fn provision(secret: String) -> Self {
        Self::build(
            FormKind::Provision,
            vec![
                Field::new("Access Key:", "Access Key (username)", 64),
                Field::new("Secret Key:", "Secret Key (auto-generated if empty)", 128)
                    .with_value(secret),
                Field::new("Role:", "Role (admin/user/userplus)", 20).with_value("user"),
                Field::new("User ID:", "User ID (default 0)", 10).with_value("0"),
                Field::new("Group ID:", "Group ID (default 0)", 10).with_value("0"),
                Field::new("Project ID:", "Project ID (optional)", 10).with_value("0"),
                Field::new("Bucket Name:", "Bucket Name", 63),
                Field::new("Quota:", "Quota (e.g., 2T, 500G)", 20).with_value("1T"),
                Field::new("Owner:", "Owner Access Key (default = access)", 64),
            ],
        )
    }

    /// Fields plus the two buttons.
    #[must_use]
    pub fn positions(&self) -> usize {
        self.fields.len() + 2
    }

    #[must_use]
    pub fn on_submit(&self) -> bool {
        self.focus == self.fields.len()
    }

    #[must_use]
    pub fn on_cancel(&self) -> bool {
        self.focus == self.fields.len() + 1
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.positions();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.positions() - 1) % self.positions();
    }

    /// Type into the focused field. Buttons and locked fields ignore input.
    pub fn insert(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.focus)
            && !field.read_only
            && field.value.chars().count() < field.limit
        {
            field.value.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus)
            && !field.read_only
        {
            field.value.pop();
        }
    }

    /// Trimmed value of field `idx`.
    #[must_use]
    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map_or("", |f| f.value.trim())
    }

    pub fn set_focus(&mut self, idx: usize) {
        self.focus = idx.min(self.positions() - 1);
    }

    /// Validate in field order; the first problem is the message shown.
    pub fn submission(&self) -> Result<Submission, String> {
        match self.kind {
            FormKind::CreateUser | FormKind::UpdateUser => self.user_submission(),
            FormKind::CreateBucket => {
                let (name, quota) = (self.value(0), self.value(1));
                require(name, "Bucket name is required")?;
                require(quota, "Quota is required")?;
                Ok(Submission::CreateBucket {
                    spec: BucketSpec::new(name, quota),
                    owner: self.value(2).to_string(),
                })
            }
            FormKind::ChangeOwner => {
                let (bucket, owner) = (self.value(0), self.value(1));
                require(bucket, "Bucket name is required")?;
                require(owner, "New owner is required")?;
                Ok(Submission::ChangeOwner {
                    bucket: bucket.to_string(),
                    owner: owner.to_string(),
                })
            }
            FormKind::MakePublic => {
                let (bucket, owner) = (self.value(0), self.value(1));
                require(bucket, "Bucket name is required")?;
                require(owner, "Owner access key is required")?;
                Ok(Submission::MakePublic {
                    bucket: bucket.to_string(),
                    owner: owner.to_string(),
                })
            }
            FormKind::Provision => self.provision_submission(),
        }
    }

    fn user_submission(&self) -> Result<Submission, String> {
        let (access, secret, role) = (self.value(0), self.value(1), self.value(2));
        require(access, "Access key is required")?;
        require(secret, "Secret key is required")?;
        let role: Role = role
            .parse()
            .map_err(|_| "Role must be admin, user, or userplus".to_string())?;
        let base = self.origin.clone().unwrap_or_default();
        let user = User {
            access: access.to_string(),
            secret: secret.to_string(),
            role: role.as_str().to_string(),
            ..base
        };
        Ok(match self.kind {
            FormKind::UpdateUser => Submission::UpdateUser(user),
            _ => Submission::CreateUser(user),
        })
    }

    fn provision_submission(&self) -> Result<Submission, String> {
        let access = self.value(0);
        require(access, "Access key is required")?;
        let role: Role = self
            .value(2)
            .parse()
            .map_err(|_| "Role must be admin, user, or userplus".to_string())?;
        let bucket = self.value(6);
        require(bucket, "Bucket name is required")?;
        let quota = self.value(7);
        require(quota, "Quota is required")?;
        Ok(Submission::Provision(ProvisionRequest {
            access: access.to_string(),
            secret: self.value(1).to_string(),
            role: role.as_str().to_string(),
            user_id: parse_id(self.value(3), "User ID must be a number")?,
            group_id: parse_id(self.value(4), "Group ID must be a number")?,
            project_id: parse_id(self.value(5), "Project ID must be a number")?,
            bucket: bucket.to_string(),
            quota: quota.to_string(),
            owner: self.value(8).to_string(),
        }))
    }
}

fn require(value: &str, message: &str) -> Result<(), String> {
    if value.is_empty() {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

/// Empty means zero.
fn parse_id(raw: &str, message: &str) -> Result<i64, String> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| message.to_string())
}
