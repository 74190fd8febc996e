//! Interactive session loop: draw, read one event, update, run its command.
//!
//! Everything runs on one thread. A command blocks until its admin call
//! returns, and the next key is read only after the result has been applied.

#![allow(missing_docs)]

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use tracing::info;

use crate::ops::Services;

use super::effects;
use super::input::decode;
use super::model::{SessionCmd, SessionModel, SessionMsg};
use super::render::{Line, render};
use super::terminal_guard::TerminalGuard;
use super::theme::{ColorMode, Theme};
use super::update::update;

/// Session settings taken from config and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub page_size: usize,
    pub color: ColorMode,
}

/// Run the interactive session until the operator quits.
///
/// # Errors
/// Returns I/O errors from the terminal. Admin failures never end the session;
/// they are shown as messages.
pub fn run_session(services: &mut Services, config: SessionConfig) -> io::Result<()> {
    let _guard = TerminalGuard::new()?;
    let (_, rows) = TerminalGuard::terminal_size();
    let mut model = SessionModel::new(config.page_size, rows);
    let theme = Theme::new(config.color);
    let mut stdout = io::stdout();
    info!(page_size = model.page_size, "interactive session started");

    loop {
        draw(&mut stdout, &render(&model), theme)?;

        let msg = match event::read()? {
            Event::Key(key) => match decode(&key) {
                Some(key) => SessionMsg::Key(key),
                None => continue,
            },
            Event::Resize(_, rows) => SessionMsg::Resize { rows },
            _ => continue,
        };

        if dispatch(&mut model, services, &mut stdout, msg) {
            info!("interactive session ended");
            return Ok(());
        }
    }
}

/// Feed `msg` through update and run commands until none remain.
/// Returns `true` when the session should end.
fn dispatch(
    model: &mut SessionModel,
    services: &mut Services,
    out: &mut impl Write,
    msg: SessionMsg,
) -> bool {
    let mut next = Some(msg);
    while let Some(msg) = next.take() {
        match update(model, msg) {
            SessionCmd::Quit => return true,
            cmd => next = effects::execute(services, out, cmd),
        }
    }
    false
}

fn draw(out: &mut impl Write, lines: &[Line], theme: Theme) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        queue!(out, MoveTo(0, row))?;
        for span in &line.spans {
            let style = theme.style(span.token);
            if let Some(color) = style.color {
                queue!(out, SetForegroundColor(color))?;
            }
            for attr in style.attributes() {
                queue!(out, SetAttribute(attr))?;
            }
            queue!(out, Print(&span.text), SetAttribute(Attribute::Reset))?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::accounts::AccountRegistry;
    use crate::logger::audit::AuditLog;
    use crate::ops::fakes::{FakeAdmin, FakeDatasets};
    use crate::tui::input::Key;
    use crate::tui::model::View;
    use crate::tui::theme::Token;

    fn services(dir: &tempfile::TempDir, api: Arc<FakeAdmin>) -> Services {
        let users = dir.path().join("users.json");
        fs::write(
            &users,
            r#"{"accessAccounts":{"ann":{"access":"ann","secret":"s1","role":"admin"},"bo":{"access":"bo","secret":"s2","role":"user"}}}"#,
        )
        .unwrap();
        Services::new(
            Box::new(api),
            Box::new(FakeDatasets::with_buckets(&[("alpha", "1T")])),
            AccountRegistry::new(users),
            AuditLog::disabled(),
        )
    }

    fn press(model: &mut SessionModel, services: &mut Services, key: Key) -> bool {
        let mut sink: Vec<u8> = Vec::new();
        dispatch(model, services, &mut sink, SessionMsg::Key(key))
    }

    #[test]
    fn delete_user_round_trip_through_effects() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeAdmin::default());
        let mut services = services(&dir, Arc::clone(&api));
        let mut model = SessionModel::new(20, 24);

        assert!(!press(&mut model, &mut services, Key::Enter));
        assert_eq!(model.view, View::UsersList);
        assert_eq!(model.users.len(), 2);

        press(&mut model, &mut services, Key::Char('d'));
        assert_eq!(model.view, View::Confirm);
        assert!(api.calls().is_empty());

        press(&mut model, &mut services, Key::Char('y'));
        assert_eq!(api.calls(), vec!["delete_user ann".to_string()]);
        assert_eq!(model.view, View::UsersList);
        assert_eq!(model.success.as_deref(), Some("User 'ann' deleted"));
    }

    #[test]
    fn bucket_list_is_reconciled_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeAdmin::with_buckets(&[("alpha", "bob"), ("beta", "carol")]));
        let mut services = services(&dir, api);
        let mut model = SessionModel::new(20, 24);

        press(&mut model, &mut services, Key::Down);
        press(&mut model, &mut services, Key::Enter);
        assert_eq!(model.view, View::BucketsList);
        let names: Vec<_> = model.buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta"]);
        assert_eq!(model.buckets[1].quota, "-");
    }

    #[test]
    fn quit_ends_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut services = services(&dir, Arc::new(FakeAdmin::default()));
        let mut model = SessionModel::new(20, 24);
        assert!(press(&mut model, &mut services, Key::Char('q')));
    }

    #[test]
    fn draw_emits_text_and_resets_style() {
        let lines = vec![Line {
            spans: vec![crate::tui::render::Span {
                text: "VGW Manager".into(),
                token: Token::Title,
            }],
        }];
        let mut out = Vec::new();
        draw(&mut out, &lines, Theme::new(ColorMode::Disabled)).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("VGW Manager"));
        assert!(text.contains("\x1b[0m"));
    }
}
