//! Key decoding and the per-view key table.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::model::View;

/// Terminal-independent key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Backspace,
    /// Ctrl-C.
    Interrupt,
}

/// Decode a crossterm key event. Releases and unmapped keys yield `None`.
#[must_use]
pub fn decode(event: &KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let key = match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Key::Interrupt,
        KeyCode::Char(_) if event.modifiers.contains(KeyModifiers::CONTROL) => return None,
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Tab if event.modifiers.contains(KeyModifiers::SHIFT) => Key::BackTab,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Backspace => Key::Backspace,
        _ => return None,
    };
    Some(key)
}

/// What a key means in a menu, list, detail, or confirmation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// End the session from any view.
    Quit,
    /// Quit at the main menu, otherwise return to it.
    QuitOrHome,
    /// Leave the view for its parent.
    Back,
    Up,
    Down,
    PrevPage,
    NextPage,
    Select,
    Copy,
    Edit,
    Delete,
    MakePublic,
    MakePrivate,
    Confirm,
    Cancel,
}

/// What a key means inside a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Quit,
    Cancel,
    Next,
    Prev,
    Enter,
    Type(char),
    Erase,
    ScrollUp,
    ScrollDown,
    ScrollTop,
    ScrollBottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

const fn bind(keys: &'static str, description: &'static str) -> HelpBinding {
    HelpBinding { keys, description }
}

/// Resolve a key for a non-form view. Unbound keys yield `None`.
#[must_use]
pub fn resolve(view: View, key: Key) -> Option<InputAction> {
    if view == View::Confirm {
        return match key {
            Key::Char('y' | 'Y') => Some(InputAction::Confirm),
            Key::Char('n' | 'N' | 'q') | Key::Esc => Some(InputAction::Cancel),
            Key::Interrupt => Some(InputAction::Quit),
            _ => None,
        };
    }

    let common = match key {
        Key::Interrupt => Some(InputAction::Quit),
        Key::Char('q') => Some(InputAction::QuitOrHome),
        Key::Esc => Some(InputAction::Back),
        Key::Up | Key::Char('k') => Some(InputAction::Up),
        Key::Down | Key::Char('j') => Some(InputAction::Down),
        Key::Left | Key::Char('h') => Some(InputAction::PrevPage),
        Key::Right | Key::Char('l') => Some(InputAction::NextPage),
        Key::Enter => Some(InputAction::Select),
        _ => None,
    };
    if common.is_some() {
        return common;
    }

    match (view, key) {
        (View::UsersList | View::UserDetail, Key::Char('c')) => Some(InputAction::Copy),
        (View::UsersList, Key::Char('e')) => Some(InputAction::Edit),
        (View::UsersList | View::BucketsList, Key::Char('d')) => Some(InputAction::Delete),
        (View::BucketsList, Key::Char('p')) => Some(InputAction::MakePublic),
        (View::BucketsList, Key::Char('P')) => Some(InputAction::MakePrivate),
        _ => None,
    }
}

/// Resolve a key inside a form. Printable characters are typed, including `q`.
#[must_use]
pub const fn resolve_form(key: Key) -> Option<FormAction> {
    Some(match key {
        Key::Interrupt => FormAction::Quit,
        Key::Esc => FormAction::Cancel,
        Key::Tab | Key::Down => FormAction::Next,
        Key::BackTab | Key::Up => FormAction::Prev,
        Key::Enter => FormAction::Enter,
        Key::Char(ch) => FormAction::Type(ch),
        Key::Backspace => FormAction::Erase,
        Key::PageUp => FormAction::ScrollUp,
        Key::PageDown => FormAction::ScrollDown,
        Key::Home => FormAction::ScrollTop,
        Key::End => FormAction::ScrollBottom,
        Key::Left | Key::Right => return None,
    })
}

const MAIN_MENU_HELP: &[HelpBinding] = &[
    bind("↑/↓", "Navigate"),
    bind("Enter", "Select"),
    bind("q", "Quit"),
];

const OPERATIONS_HELP: &[HelpBinding] = &[
    bind("↑/↓", "Navigate"),
    bind("Enter", "Select"),
    bind("esc/q", "Back to main menu"),
];

const USERS_HELP: &[HelpBinding] = &[
    bind("↑/↓", "Navigate"),
    bind("←/→", "Page"),
    bind("c", "Copy"),
    bind("e", "Edit"),
    bind("d", "Delete"),
    bind("Enter", "View"),
    bind("q", "Back"),
];

const BUCKETS_HELP: &[HelpBinding] = &[
    bind("↑/k", "Up"),
    bind("↓/j", "Down"),
    bind("←/h", "Prev Page"),
    bind("→/l", "Next Page"),
    bind("p", "Public"),
    bind("P", "Private"),
    bind("d", "Delete"),
    bind("enter", "Details"),
    bind("esc", "Back"),
];

const USER_DETAIL_HELP: &[HelpBinding] = &[bind("c", "Copy Credentials"), bind("esc", "Back to list")];

const BUCKET_DETAIL_HELP: &[HelpBinding] = &[bind("esc", "Back to list")];

const CONFIRM_HELP: &[HelpBinding] = &[bind("y", "Confirm"), bind("n/esc", "Cancel")];

const PROVISION_HELP: &[HelpBinding] = &[
    bind("tab", "Next"),
    bind("shift+tab", "Prev"),
    bind("enter", "Submit/Select"),
    bind("esc", "Cancel"),
    bind("PgUp/PgDn", "scroll"),
];

const FORM_HELP: &[HelpBinding] = &[
    bind("tab", "Next field"),
    bind("shift+tab", "Previous"),
    bind("enter", "Submit/Select"),
    bind("esc", "Cancel"),
];

/// Key hints shown at the bottom of each view.
#[must_use]
pub const fn bindings(view: View) -> &'static [HelpBinding] {
    match view {
        View::MainMenu => MAIN_MENU_HELP,
        View::Operations => OPERATIONS_HELP,
        View::UsersList => USERS_HELP,
        View::BucketsList => BUCKETS_HELP,
        View::UserDetail => USER_DETAIL_HELP,
        View::BucketDetail => BUCKET_DETAIL_HELP,
        View::Confirm => CONFIRM_HELP,
        View::Provision => PROVISION_HELP,
        View::CreateUser
        | View::UpdateUser
        | View::CreateBucket
        | View::ChangeOwner
        | View::MakeBucketPublic => FORM_HELP,
    }
}

/// `keys: description • ...`
#[must_use]
pub fn help_line(view: View) -> String {
    bindings(view)
        .iter()
        .map(|b| format!("{}: {}", b.keys, b.description))
        .collect::<Vec<_>>()
        .join(" • ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn decodes_ctrl_c_as_interrupt() {
        assert_eq!(
            decode(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Key::Interrupt)
        );
        assert_eq!(decode(&press(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
        assert_eq!(
            decode(&press(KeyCode::Char('P'), KeyModifiers::SHIFT)),
            Some(Key::Char('P'))
        );
        assert_eq!(
            decode(&press(KeyCode::Tab, KeyModifiers::SHIFT)),
            Some(Key::BackTab)
        );
    }

    #[test]
    fn release_events_are_dropped() {
        let mut event = press(KeyCode::Enter, KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(decode(&event), None);
    }

    #[test]
    fn confirm_accepts_only_y_as_affirmative() {
        assert_eq!(resolve(View::Confirm, Key::Char('y')), Some(InputAction::Confirm));
        assert_eq!(resolve(View::Confirm, Key::Char('Y')), Some(InputAction::Confirm));
        assert_eq!(resolve(View::Confirm, Key::Char('n')), Some(InputAction::Cancel));
        assert_eq!(resolve(View::Confirm, Key::Esc), Some(InputAction::Cancel));
        assert_eq!(resolve(View::Confirm, Key::Enter), None);
        assert_eq!(resolve(View::Confirm, Key::Char('d')), None);
    }

    #[test]
    fn ctrl_c_quits_from_every_view() {
        for view in [
            View::MainMenu,
            View::UsersList,
            View::BucketsList,
            View::Operations,
            View::UserDetail,
            View::BucketDetail,
            View::Confirm,
        ] {
            assert_eq!(resolve(view, Key::Interrupt), Some(InputAction::Quit), "{view:?}");
        }
        assert_eq!(resolve(View::UsersList, Key::Char('q')), Some(InputAction::QuitOrHome));
    }

    #[test]
    fn list_keys_are_view_specific() {
        assert_eq!(resolve(View::UsersList, Key::Char('e')), Some(InputAction::Edit));
        assert_eq!(resolve(View::BucketsList, Key::Char('e')), None);
        assert_eq!(
            resolve(View::BucketsList, Key::Char('P')),
            Some(InputAction::MakePrivate)
        );
        assert_eq!(resolve(View::UsersList, Key::Char('p')), None);
        assert_eq!(resolve(View::UserDetail, Key::Char('c')), Some(InputAction::Copy));
        assert_eq!(resolve(View::BucketDetail, Key::Char('c')), None);
        assert_eq!(resolve(View::MainMenu, Key::Char('j')), Some(InputAction::Down));
    }

    #[test]
    fn forms_type_q_and_cancel_on_esc() {
        assert_eq!(resolve_form(Key::Char('q')), Some(FormAction::Type('q')));
        assert_eq!(resolve_form(Key::Esc), Some(FormAction::Cancel));
        assert_eq!(resolve_form(Key::Down), Some(FormAction::Next));
        assert_eq!(resolve_form(Key::Left), None);
    }

    #[test]
    fn every_view_has_help() {
        for view in [
            View::MainMenu,
            View::UsersList,
            View::BucketsList,
            View::Operations,
            View::CreateUser,
            View::CreateBucket,
            View::ChangeOwner,
            View::UserDetail,
            View::BucketDetail,
            View::Provision,
            View::UpdateUser,
            View::MakeBucketPublic,
            View::Confirm,
        ] {
            assert!(!bindings(view).is_empty(), "{view:?}");
        }
        assert_eq!(
            help_line(View::MainMenu),
            "↑/↓: Navigate • Enter: Select • q: Quit"
        );
    }
}
