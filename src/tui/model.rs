//! Elm-style state for the interactive session.
//!
//! All session state lives in [`SessionModel`]. Keystrokes and completed admin
//! calls arrive as [`SessionMsg`] values; admin calls to perform are described
//! by [`SessionCmd`] values returned from the update function. Nothing here
//! touches the network, the dataset tool, or the terminal.

#![allow(missing_docs)]

use crate::accounts::User;
use crate::core::errors::{Result, VgwError};
use crate::dataset::{Bucket, BucketSpec};
use crate::ops::{ProvisionRequest, ProvisionSummary, RemovalPath};

use super::forms::Form;
use super::input::Key;

/// Rows assumed until the terminal reports its size.
pub const DEFAULT_HEIGHT: u16 = 24;

// ──────────────────── views ────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    MainMenu,
    UsersList,
    BucketsList,
    Operations,
    CreateUser,
    CreateBucket,
    ChangeOwner,
    UserDetail,
    BucketDetail,
    Provision,
    UpdateUser,
    MakeBucketPublic,
    Confirm,
}

impl View {
    /// Views whose keystrokes go to a form.
    #[must_use]
    pub const fn is_form(self) -> bool {
        matches!(
            self,
            Self::CreateUser
                | Self::CreateBucket
                | Self::ChangeOwner
                | Self::Provision
                | Self::UpdateUser
                | Self::MakeBucketPublic
        )
    }

    /// Paginated views.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::UsersList | Self::BucketsList)
    }
}

/// Entries of the main menu, in display order.
pub const MAIN_MENU: [&str; 4] = ["List Users", "List Buckets", "Operations", "Quit"];

/// Entries of the operations menu, in display order.
pub const OPERATIONS_MENU: [&str; 5] = [
    "Create User",
    "Create Bucket",
    "Change Bucket Owner",
    "Make Bucket Public",
    "Provision (User + Bucket)",
];

// ──────────────────── confirmation ────────────────────

/// Destructive actions that wait in [`View::Confirm`] for an explicit `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    DeleteUser,
    DeleteBucket,
    MakePublic,
    MakePrivate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub action: PendingAction,
    /// Access key or bucket name.
    pub target: String,
}

// ──────────────────── model ────────────────────

#[derive(Debug, Clone)]
pub struct SessionModel {
    pub view: View,
    /// Where a form, confirmation, or cancel lands afterwards.
    pub return_view: View,
    /// Row within the current page (or menu entry).
    pub cursor: usize,
    pub page: usize,
    pub page_size: usize,
    pub users: Vec<User>,
    pub buckets: Vec<Bucket>,
    pub selected_user: usize,
    pub selected_bucket: usize,
    pub pending: Option<Pending>,
    pub form: Option<Form>,
    pub error: Option<String>,
    pub success: Option<String>,
    /// First visible line of the provision form.
    pub provision_scroll: usize,
    /// Terminal rows.
    pub height: u16,
}

impl SessionModel {
    #[must_use]
    pub fn new(page_size: usize, height: u16) -> Self {
        Self {
            view: View::MainMenu,
            return_view: View::MainMenu,
            cursor: 0,
            page: 0,
            page_size: page_size.max(1),
            users: Vec::new(),
            buckets: Vec::new(),
            selected_user: 0,
            selected_bucket: 0,
            pending: None,
            form: None,
            error: None,
            success: None,
            provision_scroll: 0,
            height: if height == 0 { DEFAULT_HEIGHT } else { height },
        }
    }

    /// Absolute index of the highlighted list row.
    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.page * self.page_size + self.cursor
    }

    /// Number of selectable rows in the current view (all pages).
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self.view {
            View::MainMenu => MAIN_MENU.len(),
            View::Operations => OPERATIONS_MENU.len(),
            View::UsersList => self.users.len(),
            View::BucketsList => self.buckets.len(),
            _ => 1,
        }
    }

    /// Pages needed for the current list; never less than one.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.item_count().div_ceil(self.page_size).max(1)
    }

    /// Rows visible on the current page.
    #[must_use]
    pub fn rows_on_page(&self) -> usize {
        let items = self.item_count();
        if self.view.is_list() {
            items
                .saturating_sub(self.page * self.page_size)
                .min(self.page_size)
        } else {
            items
        }
    }

    #[must_use]
    pub fn highlighted_user(&self) -> Option<&User> {
        self.users.get(self.selected_index())
    }

    #[must_use]
    pub fn highlighted_bucket(&self) -> Option<&Bucket> {
        self.buckets.get(self.selected_index())
    }

    pub fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.success = Some(message.into());
    }

    /// Show `form` and remember where to go when it closes.
    pub fn open_form(&mut self, form: Form, return_view: View) {
        self.view = form.kind.view();
        self.return_view = return_view;
        self.cursor = 0;
        self.provision_scroll = 0;
        self.form = Some(form);
    }

    /// Leave the current form for its return view.
    pub fn close_form(&mut self) {
        self.form = None;
        self.view = self.return_view;
        self.cursor = 0;
    }

    /// Keep page and cursor inside the list after it shrank.
    pub fn clamp_to_list(&mut self) {
        let items = self.item_count();
        if items == 0 {
            self.page = 0;
            self.cursor = 0;
            return;
        }
        let last_page = (items - 1) / self.page_size;
        if self.page > last_page {
            self.page = last_page;
            self.cursor = 0;
        }
        let rows = self.rows_on_page();
        if self.cursor >= rows {
            self.cursor = rows.saturating_sub(1);
        }
    }
}

// ──────────────────── messages ────────────────────

/// Why a list is being (re)loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// Entering the list view: reset page and cursor.
    Open,
    /// After a mutation: keep position, clamped.
    Refresh,
}

#[derive(Debug)]
pub enum PublicOutcome {
    Applied,
    /// A policy document already exists.
    AlreadyPublic,
    ProbeFailed(VgwError),
    SetFailed(VgwError),
}

#[derive(Debug)]
pub enum PrivateOutcome {
    Removed,
    /// No policy document was attached.
    AlreadyPrivate,
    ProbeFailed(VgwError),
    RemoveFailed(VgwError),
}

/// Input events and completed admin calls.
#[derive(Debug)]
pub enum SessionMsg {
    Key(Key),
    Resize {
        rows: u16,
    },
    UsersLoaded {
        reload: Reload,
        result: Result<Vec<User>>,
    },
    BucketsLoaded {
        result: Result<Vec<Bucket>>,
    },
    UserSaved {
        access: String,
        updated: bool,
        result: Result<()>,
    },
    UserDeleted {
        access: String,
        result: Result<()>,
    },
    BucketCreated {
        name: String,
        result: Result<()>,
        /// `None` when no owner was requested or creation failed.
        owner_result: Option<Result<()>>,
    },
    OwnerChanged {
        bucket: String,
        owner: String,
        result: Result<()>,
    },
    Provisioned {
        result: Result<ProvisionSummary>,
    },
    BucketRemoved {
        name: String,
        result: Result<RemovalPath>,
    },
    PublicApplied {
        bucket: String,
        owner: String,
        /// Came from a confirmed list action rather than the form.
        from_list: bool,
        outcome: PublicOutcome,
    },
    PrivateApplied {
        bucket: String,
        outcome: PrivateOutcome,
    },
    Copied {
        result: Result<()>,
    },
}

// ──────────────────── commands ────────────────────

/// Side-effects for the runtime. Each one that reaches the admin surface
/// answers with exactly one [`SessionMsg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCmd {
    None,
    Quit,
    LoadUsers(Reload),
    LoadBuckets,
    CreateUser(User),
    UpdateUser(User),
    DeleteUser(String),
    CreateBucket { spec: BucketSpec, owner: String },
    ChangeOwner { bucket: String, owner: String },
    Provision(ProvisionRequest),
    RemoveBucket(String),
    /// `from_list` probes for an existing policy before setting one.
    MakePublic {
        bucket: String,
        owner: String,
        from_list: bool,
    },
    MakePrivate(String),
    /// Put text on the operator's clipboard.
    Copy(String),
}
