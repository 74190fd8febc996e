//! Pure state transitions: `(model, msg) -> cmd`.
//!
//! The update function never performs I/O. Admin calls come back as
//! [`SessionMsg`] results, so every branch here can be driven from a test.

#![allow(missing_docs)]

use tracing::{debug, warn};

use crate::core::errors::VgwError;
use crate::ops::RemovalPath;
use crate::ops::generate_secret_key;
use crate::ops::provision::STEPS;

use super::forms::{Form, FormKind, Submission};
use super::input::{FormAction, InputAction, Key, resolve, resolve_form};
use super::model::{
    Pending, PendingAction, PrivateOutcome, PublicOutcome, Reload, SessionCmd, SessionModel,
    SessionMsg, View,
};
use super::render::{provision_lines, provision_target_line, visible_rows};

/// Characters of a failed auto-public error kept in the fallback form.
const AUTO_PUBLIC_ERROR_CHARS: usize = 50;

/// Owners that cannot be named as a policy principal.
const UNUSABLE_OWNERS: [&str; 4] = ["", "-", "unknown", "root"];

/// Apply one message and return the side-effect the runtime should perform.
pub fn update(model: &mut SessionModel, msg: SessionMsg) -> SessionCmd {
    match msg {
        SessionMsg::Key(key) => {
            if model.view.is_form() {
                handle_form_key(model, key)
            } else {
                handle_key(model, key)
            }
        }
        SessionMsg::Resize { rows } => {
            model.height = rows.max(1);
            if model.view == View::Provision {
                ensure_provision_visible(model);
            }
            SessionCmd::None
        }
        SessionMsg::UsersLoaded { reload, result } => {
            match (reload, result) {
                (Reload::Open, Ok(users)) => {
                    model.users = users;
                    model.view = View::UsersList;
                    model.cursor = 0;
                    model.page = 0;
                }
                (Reload::Open, Err(err)) => {
                    model.fail(format!("Error loading users: {}", err.message()));
                }
                (Reload::Refresh, Ok(users)) => {
                    model.users = users;
                    if model.view == View::UsersList {
                        model.clamp_to_list();
                    }
                }
                (Reload::Refresh, Err(err)) => {
                    warn!(error = %err, "user list refresh failed");
                }
            }
            SessionCmd::None
        }
        SessionMsg::BucketsLoaded { result } => {
            match result {
                Ok(buckets) => {
                    model.buckets = buckets;
                    model.view = View::BucketsList;
                    model.cursor = 0;
                    model.page = 0;
                }
                Err(err) => model.fail(format!("Error loading buckets: {}", err.message())),
            }
            SessionCmd::None
        }
        SessionMsg::UserSaved {
            access,
            updated,
            result,
        } => {
            let verb = if updated { "update" } else { "create" };
            if let Err(err) = result {
                model.fail(format!("Failed to {verb} user: {}", err.message()));
                return SessionCmd::None;
            }
            model.succeed(format!("User '{access}' {verb}d successfully!"));
            model.close_form();
            SessionCmd::LoadUsers(Reload::Refresh)
        }
        SessionMsg::UserDeleted { access, result } => match result {
            Ok(()) => {
                model.succeed(format!("User '{access}' deleted"));
                SessionCmd::LoadUsers(Reload::Refresh)
            }
            Err(err) => {
                model.fail(format!("Failed to delete user: {}", err.message()));
                SessionCmd::None
            }
        },
        SessionMsg::BucketCreated {
            name,
            result,
            owner_result,
        } => {
            if let Err(err) = result {
                model.fail(format!("Failed to create bucket: {}", err.message()));
                return SessionCmd::None;
            }
            if let Some(Err(err)) = owner_result {
                model.fail(format!(
                    "Bucket created but failed to set owner: {}",
                    err.message()
                ));
                return SessionCmd::None;
            }
            model.succeed(format!("Bucket '{name}' created successfully!"));
            model.close_form();
            SessionCmd::None
        }
        SessionMsg::OwnerChanged {
            bucket,
            owner,
            result,
        } => {
            if let Err(err) = result {
                model.fail(format!("Failed to change owner: {}", err.message()));
                return SessionCmd::None;
            }
            if let Some(cached) = model.buckets.iter_mut().find(|b| b.name == bucket) {
                cached.owner.clone_from(&owner);
            }
            model.succeed(format!("Owner for '{bucket}' changed to '{owner}'"));
            model.close_form();
            SessionCmd::None
        }
        SessionMsg::Provisioned { result } => {
            match result {
                Ok(summary) => {
                    let mut message = format!(
                        "Provisioned user '{}' and bucket '{}' (owner '{}')",
                        summary.access, summary.bucket, summary.owner
                    );
                    if summary.secret_generated {
                        message.push_str(&format!(
                            ". Secret key (auto-generated): {}",
                            summary.secret
                        ));
                    }
                    model.succeed(message);
                    model.close_form();
                }
                Err(err) => model.fail(provision_failure(&err)),
            }
            SessionCmd::None
        }
        SessionMsg::BucketRemoved { name, result } => match result {
            Ok(path) => {
                if let RemovalPath::Api { dataset_error } = &path {
                    debug!(bucket = %name, dataset_error = %dataset_error, "bucket removed through the API");
                }
                model.succeed(format!("Bucket '{name}' deleted."));
                SessionCmd::LoadBuckets
            }
            Err(err) if err.is_busy_or_not_empty() => {
                model.fail(format!(
                    "Cannot delete bucket '{name}': Bucket is not empty or busy."
                ));
                SessionCmd::None
            }
            Err(err) => {
                model.fail(format!("Failed to delete bucket: {}", err.message()));
                SessionCmd::None
            }
        },
        SessionMsg::PublicApplied {
            bucket,
            owner,
            from_list,
            outcome,
        } => {
            apply_public_outcome(model, &bucket, &owner, from_list, outcome);
            SessionCmd::None
        }
        SessionMsg::PrivateApplied { bucket, outcome } => {
            match outcome {
                PrivateOutcome::Removed => {
                    model.succeed(format!("Bucket '{bucket}' is now PRIVATE (policy removed)."));
                }
                PrivateOutcome::AlreadyPrivate => {
                    model.succeed(format!("Bucket '{bucket}' is already PRIVATE (no policy)."));
                }
                PrivateOutcome::ProbeFailed(err) => {
                    model.fail(format!("Failed to check policy: {}", err.message()));
                }
                PrivateOutcome::RemoveFailed(err) => {
                    model.fail(format!("Failed to make private: {}", err.message()));
                }
            }
            SessionCmd::None
        }
        SessionMsg::Copied { result } => {
            match result {
                Ok(()) => model.succeed("✓ Credentials copied to clipboard!"),
                Err(err) => model.fail(format!("Copy failed: {}", err.message())),
            }
            SessionCmd::None
        }
    }
}

// ──────────────────── non-form views ────────────────────

fn handle_key(model: &mut SessionModel, key: Key) -> SessionCmd {
    model.clear_messages();
    let Some(action) = resolve(model.view, key) else {
        return SessionCmd::None;
    };

    match action {
        InputAction::Quit => return SessionCmd::Quit,
        InputAction::QuitOrHome => {
            if model.view == View::MainMenu {
                return SessionCmd::Quit;
            }
            go_home(model);
        }
        InputAction::Back => match model.view {
            View::MainMenu => return SessionCmd::Quit,
            View::UserDetail => model.view = View::UsersList,
            View::BucketDetail => model.view = View::BucketsList,
            _ => go_home(model),
        },
        InputAction::Up => model.cursor = model.cursor.saturating_sub(1),
        InputAction::Down => {
            if model.cursor + 1 < model.rows_on_page() {
                model.cursor += 1;
            }
        }
        InputAction::PrevPage => {
            if model.view.is_list() && model.page > 0 {
                model.page -= 1;
                model.cursor = 0;
            }
        }
        InputAction::NextPage => {
            if model.view.is_list() && model.page + 1 < model.total_pages() {
                model.page += 1;
                model.cursor = 0;
            }
        }
        InputAction::Select => return select(model),
        InputAction::Copy => return copy_credentials(model),
        InputAction::Edit => {
            if let Some(user) = model.highlighted_user() {
                let form = Form::update_user(user);
                model.open_form(form, View::UsersList);
            }
        }
        InputAction::Delete => match model.view {
            View::UsersList => {
                if let Some(access) = model.highlighted_user().map(|u| u.access.clone()) {
                    ask(model, PendingAction::DeleteUser, access);
                }
            }
            View::BucketsList => {
                if let Some(name) = model.highlighted_bucket().map(|b| b.name.clone()) {
                    ask(model, PendingAction::DeleteBucket, name);
                }
            }
            _ => {}
        },
        InputAction::MakePublic => {
            if let Some(name) = model.highlighted_bucket().map(|b| b.name.clone()) {
                ask(model, PendingAction::MakePublic, name);
            }
        }
        InputAction::MakePrivate => {
            if let Some(name) = model.highlighted_bucket().map(|b| b.name.clone()) {
                ask(model, PendingAction::MakePrivate, name);
            }
        }
        InputAction::Confirm => return confirm(model),
        InputAction::Cancel => {
            model.pending = None;
            model.view = model.return_view;
            model.succeed("Operation cancelled.");
        }
    }
    SessionCmd::None
}

fn go_home(model: &mut SessionModel) {
    model.view = View::MainMenu;
    model.cursor = 0;
    model.page = 0;
    model.pending = None;
    model.form = None;
}

fn ask(model: &mut SessionModel, action: PendingAction, target: String) {
    model.pending = Some(Pending { action, target });
    model.return_view = model.view;
    model.view = View::Confirm;
}

fn select(model: &mut SessionModel) -> SessionCmd {
    match model.view {
        View::MainMenu => match model.cursor {
            0 => return SessionCmd::LoadUsers(Reload::Open),
            1 => return SessionCmd::LoadBuckets,
            2 => {
                model.view = View::Operations;
                model.cursor = 0;
            }
            _ => return SessionCmd::Quit,
        },
        View::Operations => {
            let form = match model.cursor {
                0 => Form::create_user(generate_secret_key()),
                1 => Form::create_bucket(),
                2 => Form::change_owner(),
                3 => Form::make_public("", ""),
                _ => Form::provision(generate_secret_key()),
            };
            model.open_form(form, View::Operations);
        }
        View::UsersList => {
            if model.highlighted_user().is_some() {
                model.selected_user = model.selected_index();
                model.view = View::UserDetail;
            }
        }
        View::BucketsList => {
            if model.highlighted_bucket().is_some() {
                model.selected_bucket = model.selected_index();
                model.view = View::BucketDetail;
            }
        }
        _ => {}
    }
    SessionCmd::None
}

fn copy_credentials(model: &SessionModel) -> SessionCmd {
    let user = match model.view {
        View::UserDetail => model.users.get(model.selected_user),
        _ => model.highlighted_user(),
    };
    user.map_or(SessionCmd::None, |u| {
        SessionCmd::Copy(format!("Access Key: {}\nSecret Key: {}", u.access, u.secret))
    })
}

fn confirm(model: &mut SessionModel) -> SessionCmd {
    let Some(Pending { action, target }) = model.pending.take() else {
        model.view = model.return_view;
        return SessionCmd::None;
    };
    model.view = model.return_view;
    match action {
        PendingAction::DeleteUser => SessionCmd::DeleteUser(target),
        PendingAction::DeleteBucket => SessionCmd::RemoveBucket(target),
        PendingAction::MakePrivate => SessionCmd::MakePrivate(target),
        PendingAction::MakePublic => {
            let Some(bucket) = model.buckets.iter().find(|b| b.name == target) else {
                model.fail(format!("Bucket '{target}' not found."));
                return SessionCmd::None;
            };
            let owner = if UNUSABLE_OWNERS.contains(&bucket.owner.as_str()) {
                target.clone()
            } else {
                bucket.owner.clone()
            };
            SessionCmd::MakePublic {
                bucket: target,
                owner,
                from_list: true,
            }
        }
    }
}

// ──────────────────── forms ────────────────────

fn handle_form_key(model: &mut SessionModel, key: Key) -> SessionCmd {
    let Some(action) = resolve_form(key) else {
        return SessionCmd::None;
    };
    let provision = model.view == View::Provision;
    let Some(form) = model.form.as_mut() else {
        go_home(model);
        return SessionCmd::None;
    };

    match action {
        FormAction::Quit => return SessionCmd::Quit,
        FormAction::Cancel => model.close_form(),
        FormAction::Next => {
            form.focus_next();
            if provision {
                ensure_provision_visible(model);
            }
        }
        FormAction::Prev => {
            form.focus_prev();
            if provision {
                ensure_provision_visible(model);
            }
        }
        FormAction::Enter => {
            if form.on_cancel() {
                model.close_form();
            } else if form.on_submit() {
                return submit(model);
            } else {
                form.focus_next();
                if provision {
                    ensure_provision_visible(model);
                }
            }
        }
        FormAction::Type(ch) => form.insert(ch),
        FormAction::Erase => form.backspace(),
        FormAction::ScrollUp | FormAction::ScrollDown | FormAction::ScrollTop
        | FormAction::ScrollBottom => {
            if provision {
                scroll_provision(model, action);
            }
        }
    }
    SessionCmd::None
}

fn submit(model: &mut SessionModel) -> SessionCmd {
    model.clear_messages();
    let Some(form) = &model.form else {
        return SessionCmd::None;
    };
    let submission = match form.submission() {
        Ok(submission) => submission,
        Err(message) => {
            model.fail(message);
            return SessionCmd::None;
        }
    };
    match submission {
        Submission::CreateUser(user) => SessionCmd::CreateUser(user),
        Submission::UpdateUser(user) => SessionCmd::UpdateUser(user),
        Submission::CreateBucket { spec, owner } => SessionCmd::CreateBucket { spec, owner },
        Submission::ChangeOwner { bucket, owner } => SessionCmd::ChangeOwner { bucket, owner },
        Submission::MakePublic { bucket, owner } => SessionCmd::MakePublic {
            bucket,
            owner,
            from_list: false,
        },
        Submission::Provision(req) => SessionCmd::Provision(req),
    }
}

fn scroll_provision(model: &mut SessionModel, action: FormAction) {
    let visible = visible_rows(model);
    let max_offset = provision_lines(model).len().saturating_sub(visible);
    let step = (usize::from(model.height) / 2).max(1);
    model.provision_scroll = match action {
        FormAction::ScrollUp => model.provision_scroll.saturating_sub(step),
        FormAction::ScrollDown => (model.provision_scroll + step).min(max_offset),
        FormAction::ScrollTop => 0,
        _ => max_offset,
    };
}

/// Scroll just enough to keep the focused field (or the buttons) on screen.
fn ensure_provision_visible(model: &mut SessionModel) {
    let Some(form) = &model.form else {
        return;
    };
    let target = provision_target_line(form);
    let visible = visible_rows(model);
    if target < model.provision_scroll {
        model.provision_scroll = target;
    } else if target >= model.provision_scroll + visible {
        model.provision_scroll = target + 1 - visible;
    }
}

// ──────────────────── result helpers ────────────────────

fn provision_failure(err: &VgwError) -> String {
    match err {
        VgwError::Step { step, source } => {
            let prefix = match STEPS.iter().position(|s| s == step) {
                Some(0) => "Failed to create user",
                Some(1) => "Failed to create bucket",
                Some(_) => "Bucket created but failed to set owner",
                None => "Provision failed",
            };
            format!("{prefix}: {}", source.message())
        }
        other => other.message(),
    }
}

fn apply_public_outcome(
    model: &mut SessionModel,
    bucket: &str,
    owner: &str,
    from_list: bool,
    outcome: PublicOutcome,
) {
    match outcome {
        PublicOutcome::Applied => {
            model.succeed(format!("Bucket '{bucket}' is now PUBLIC!"));
            if !from_list && model.form.as_ref().is_some_and(|f| f.kind == FormKind::MakePublic)
            {
                model.close_form();
            }
        }
        PublicOutcome::AlreadyPublic => model.succeed(format!(
            "Bucket '{bucket}' is already PUBLIC (or has policy). Use 'P' to make private."
        )),
        PublicOutcome::ProbeFailed(err) => {
            model.fail(format!("Failed to check policy status: {}", err.message()));
        }
        PublicOutcome::SetFailed(err) if from_list => {
            let mut form = Form::make_public(bucket, owner);
            form.set_focus(1);
            model.open_form(form, View::BucketsList);
            model.fail(format!(
                "Auto-public failed: {}",
                clip(&err.message(), AUTO_PUBLIC_ERROR_CHARS)
            ));
        }
        PublicOutcome::SetFailed(err) => {
            model.fail(format!("Failed to make public: {}", err.message()));
        }
    }
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max - 3).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}
