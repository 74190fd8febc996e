//! Pure rendering: model in, styled lines out.
//!
//! The runtime paints these lines; tests read them as plain text.

#![allow(missing_docs)]

use super::forms::{CANCEL_LABEL, Form};
use super::input::help_line;
use super::model::{MAIN_MENU, OPERATIONS_MENU, PendingAction, SessionModel, View};
use super::theme::Token;

/// Smallest provision viewport, whatever the terminal reports.
pub const MIN_VISIBLE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    fn styled(text: impl Into<String>, token: Token) -> Self {
        Self {
            spans: vec![Span {
                text: text.into(),
                token,
            }],
        }
    }

    fn blank() -> Self {
        Self::default()
    }

    fn push(mut self, text: impl Into<String>, token: Token) -> Self {
        self.spans.push(Span {
            text: text.into(),
            token,
        });
        self
    }

    /// Concatenated text without styling.
    #[must_use]
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Every line of the current view, in order.
#[must_use]
pub fn render(model: &SessionModel) -> Vec<Line> {
    match model.view {
        View::MainMenu => menu(
            model,
            "VGW Manager",
            "VersityGW Management Tool",
            &MAIN_MENU,
        ),
        View::Operations => menu(
            model,
            "Operations",
            "Create User • Create Bucket • Change Owner • Provision",
            &OPERATIONS_MENU,
        ),
        View::UsersList => users_list(model),
        View::BucketsList => buckets_list(model),
        View::UserDetail => user_detail(model),
        View::BucketDetail => bucket_detail(model),
        View::Confirm => confirm(model),
        View::Provision => provision_viewport(model),
        View::CreateUser
        | View::UpdateUser
        | View::CreateBucket
        | View::ChangeOwner
        | View::MakeBucketPublic => stacked_form(model),
    }
}

/// Shorten to `max` characters, ending in `...` when cut.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let kept: String = text.chars().take(max - 3).collect();
    format!("{kept}...")
}

fn menu(model: &SessionModel, title: &str, subtitle: &str, items: &[&str]) -> Vec<Line> {
    let mut lines = vec![
        Line::styled(title, Token::Title),
        Line::styled(subtitle, Token::Subtitle),
        Line::blank(),
    ];
    for (i, item) in items.iter().enumerate() {
        lines.push(if i == model.cursor {
            Line::styled(format!("▶ {item}"), Token::Selected)
        } else {
            Line::styled(format!("  {item}"), Token::Normal)
        });
    }
    lines.push(Line::blank());
    lines.push(Line::styled(help_line(model.view), Token::Muted));
    push_messages(&mut lines, model, true);
    lines
}

fn page_bounds(model: &SessionModel, len: usize) -> (usize, usize) {
    let start = (model.page * model.page_size).min(len);
    let end = (start + model.page_size).min(len);
    (start, end)
}

fn page_footer(model: &SessionModel, len: usize) -> Line {
    Line::styled(
        format!(
            "Page {} of {} ({} items)",
            model.page + 1,
            model.total_pages(),
            len
        ),
        Token::Muted,
    )
}

fn users_list(model: &SessionModel) -> Vec<Line> {
    let mut lines = vec![
        Line::styled("Users List", Token::Title),
        Line::blank(),
        Line::styled(
            format!("  {:<20} {:<20} {:<10}", "ACCESS KEY", "SECRET KEY", "ROLE"),
            Token::Muted,
        ),
        Line::styled("-".repeat(60), Token::Muted),
    ];
    let (start, end) = page_bounds(model, model.users.len());
    for (row, user) in model.users[start..end].iter().enumerate() {
        let selected = row == model.cursor;
        let text = format!(
            "{} {:<20} {:<20} {:<10}",
            if selected { ">" } else { " " },
            truncate(&user.access, 20),
            truncate(&user.secret, 20),
            user.role
        );
        lines.push(Line::styled(
            text,
            if selected { Token::Selected } else { Token::Normal },
        ));
    }
    lines.push(Line::blank());
    lines.push(page_footer(model, model.users.len()));
    lines.push(Line::styled(help_line(View::UsersList), Token::Muted));
    push_messages(&mut lines, model, false);
    lines
}

fn buckets_list(model: &SessionModel) -> Vec<Line> {
    let mut lines = vec![
        Line::styled("Buckets List", Token::Title),
        Line::blank(),
        Line::styled(
            format!(
                "  {:<30} {:<40} {:<10} {:<10} {:<10} {:<15}",
                "Name", "Mountpoint", "Quota", "Used", "Available", "Owner"
            ),
            Token::Muted,
        ),
        Line::styled("-".repeat(125), Token::Muted),
    ];
    let (start, end) = page_bounds(model, model.buckets.len());
    for (row, bucket) in model.buckets[start..end].iter().enumerate() {
        let selected = row == model.cursor;
        let owner = if bucket.owner.is_empty() {
            "unknown"
        } else {
            bucket.owner.as_str()
        };
        let text = format!(
            "{} {:<30} {:<40} {:<10} {:<10} {:<10} {:<15}",
            if selected { ">" } else { " " },
            truncate(&bucket.name, 30),
            truncate(&bucket.mountpoint, 40),
            bucket.quota,
            bucket.used,
            bucket.available,
            owner
        );
        lines.push(Line::styled(
            text,
            if selected { Token::Selected } else { Token::Normal },
        ));
    }
    lines.push(Line::blank());
    lines.push(page_footer(model, model.buckets.len()));
    lines.push(Line::styled(help_line(View::BucketsList), Token::Muted));
    push_messages(&mut lines, model, false);
    lines
}

fn detail_rows(lines: &mut Vec<Line>, rows: &[(&str, String)]) {
    for (label, value) in rows {
        lines.push(Line::styled(*label, Token::Label));
        lines.push(Line::styled(format!(" {value}"), Token::Normal));
        lines.push(Line::blank());
    }
}

fn user_detail(model: &SessionModel) -> Vec<Line> {
    let mut lines = vec![Line::styled("User Details", Token::Title), Line::blank()];
    let Some(user) = model.users.get(model.selected_user) else {
        lines.push(Line::styled("Invalid user selection", Token::Error));
        return lines;
    };
    let mut rows = vec![
        ("Access Key", user.access.clone()),
        ("Secret Key", user.secret.clone()),
        ("Role", user.role.clone()),
        ("User ID", user.user_id.to_string()),
        ("Group ID", user.group_id.to_string()),
    ];
    if user.project_id > 0 {
        rows.push(("Project ID", user.project_id.to_string()));
    }
    detail_rows(&mut lines, &rows);
    lines.push(Line::styled(help_line(View::UserDetail), Token::Muted));
    push_messages(&mut lines, model, true);
    lines
}

fn bucket_detail(model: &SessionModel) -> Vec<Line> {
    let mut lines = vec![Line::styled("Bucket Details", Token::Title), Line::blank()];
    let Some(bucket) = model.buckets.get(model.selected_bucket) else {
        lines.push(Line::styled("Invalid bucket selection", Token::Error));
        return lines;
    };
    detail_rows(
        &mut lines,
        &[
            ("Bucket Name", bucket.name.clone()),
            ("Mountpoint", bucket.mountpoint.clone()),
            ("Owner", bucket.owner.clone()),
            ("Quota", bucket.quota.clone()),
            ("Used Space", bucket.used.clone()),
            ("Available Space", bucket.available.clone()),
        ],
    );
    lines.push(Line::styled(help_line(View::BucketDetail), Token::Muted));
    push_messages(&mut lines, model, true);
    lines
}

fn confirm(model: &SessionModel) -> Vec<Line> {
    let mut lines = vec![Line::styled("Confirm", Token::Title), Line::blank()];
    let prompt = match &model.pending {
        Some(pending) => {
            let target = &pending.target;
            match pending.action {
                PendingAction::DeleteUser => format!("Delete user '{target}'?"),
                PendingAction::DeleteBucket => {
                    format!("Delete bucket '{target}' and destroy its dataset?")
                }
                PendingAction::MakePublic => {
                    format!("Make bucket '{target}' PUBLIC (anonymous read)?")
                }
                PendingAction::MakePrivate => {
                    format!("Make bucket '{target}' PRIVATE (remove its policy)?")
                }
            }
        }
        None => "Nothing to confirm.".to_string(),
    };
    lines.push(Line::styled(prompt, Token::Normal));
    lines.push(Line::blank());
    lines.push(Line::styled(help_line(View::Confirm), Token::Muted));
    push_messages(&mut lines, model, true);
    lines
}

fn field_value(form: &Form, idx: usize) -> (String, Token) {
    let field = &form.fields[idx];
    let focused = form.focus == idx;
    let token = if focused {
        Token::FocusedInput
    } else {
        Token::Input
    };
    let shown = if field.value.is_empty() && !focused {
        return (format!("[ {} ]", field.placeholder), Token::Muted);
    } else if focused {
        format!("{}_", field.value)
    } else {
        field.value.clone()
    };
    (format!("[ {shown} ]"), token)
}

fn buttons(form: &Form) -> Line {
    let (submit, cancel) = if form.on_submit() {
        (Token::FocusedButton, Token::Button)
    } else if form.on_cancel() {
        (Token::Button, Token::FocusedButton)
    } else {
        (Token::Button, Token::Button)
    };
    Line::styled(form.kind.submit_label(), submit)
        .push("  ", Token::Normal)
        .push(CANCEL_LABEL, cancel)
}

fn stacked_form(model: &SessionModel) -> Vec<Line> {
    let Some(form) = &model.form else {
        return vec![Line::styled("No form open", Token::Error)];
    };
    let mut lines = vec![Line::styled(form.kind.title(), Token::Title), Line::blank()];
    for (idx, field) in form.fields.iter().enumerate() {
        lines.push(Line::styled(field.label, Token::Label));
        let (text, token) = field_value(form, idx);
        lines.push(Line::styled(text, token));
        lines.push(Line::blank());
    }
    lines.push(buttons(form));
    lines.push(Line::blank());
    lines.push(Line::styled(help_line(model.view), Token::Muted));
    if model.view == View::CreateBucket {
        lines.push(Line::styled(
            "Note: Bucket will be created as a dataset mounted at <mount base>/<name>",
            Token::Muted,
        ));
    }
    push_messages(&mut lines, model, true);
    lines
}

/// Full provision form, before the viewport is applied.
#[must_use]
pub fn provision_lines(model: &SessionModel) -> Vec<Line> {
    let Some(form) = &model.form else {
        return vec![Line::styled("No form open", Token::Error)];
    };
    let mut lines = vec![Line::styled(form.kind.title(), Token::Title), Line::blank()];
    for (idx, field) in form.fields.iter().enumerate() {
        let (text, token) = field_value(form, idx);
        lines.push(Line::styled(format!("{:<13}", field.label), Token::Label).push(text, token));
    }
    lines.push(buttons(form));
    lines.push(Line::styled(help_line(View::Provision), Token::Muted));
    lines.push(Line::styled(
        "Creates user, then bucket, then sets bucket owner.",
        Token::Muted,
    ));
    push_messages(&mut lines, model, true);
    lines
}

/// Lines the provision viewport can show at once.
#[must_use]
pub fn visible_rows(model: &SessionModel) -> usize {
    usize::from(model.height).max(MIN_VISIBLE)
}

/// Line holding the focused field, or the buttons row.
#[must_use]
pub fn provision_target_line(form: &Form) -> usize {
    2 + form.focus.min(form.fields.len())
}

fn provision_viewport(model: &SessionModel) -> Vec<Line> {
    let lines = provision_lines(model);
    let visible = visible_rows(model);
    let max_offset = lines.len().saturating_sub(visible);
    let start = model.provision_scroll.min(max_offset);
    lines.into_iter().skip(start).take(visible).collect()
}

fn push_messages(lines: &mut Vec<Line>, model: &SessionModel, prefixed: bool) {
    if let Some(error) = &model.error {
        let text = if prefixed {
            format!("Error: {error}")
        } else {
            error.clone()
        };
        lines.push(Line::styled(text, Token::Error));
        if !prefixed {
            return;
        }
    }
    if let Some(success) = &model.success {
        lines.push(Line::styled(success.as_str(), Token::Success));
    }
}
