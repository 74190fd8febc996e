//! Semantic style tokens and their terminal colors.

#![allow(missing_docs)]

use std::env;

use crossterm::style::{Attribute, Color};

/// Color output mode for compatibility with `NO_COLOR` and `--no-color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Enabled,
    Disabled,
}

impl ColorMode {
    #[must_use]
    pub const fn from_no_color_flag(no_color: bool) -> Self {
        if no_color { Self::Disabled } else { Self::Enabled }
    }

    /// `--no-color` or a set `NO_COLOR` disables color.
    #[must_use]
    pub fn resolve(no_color_flag: bool) -> Self {
        Self::from_no_color_flag(no_color_flag || env::var_os("NO_COLOR").is_some())
    }
}

/// What a piece of text is, independent of how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Title,
    Subtitle,
    Normal,
    /// Highlighted menu entry or table row.
    Selected,
    Muted,
    Label,
    Input,
    FocusedInput,
    Button,
    FocusedButton,
    Error,
    Success,
}

/// Foreground color plus attributes for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: Option<Color>,
    pub bold: bool,
    pub reverse: bool,
    pub italic: bool,
}

impl Style {
    const fn plain() -> Self {
        Self {
            color: None,
            bold: false,
            reverse: false,
            italic: false,
        }
    }

    const fn fg(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::plain()
        }
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Attributes to queue after the color.
    #[must_use]
    pub fn attributes(self) -> Vec<Attribute> {
        let mut attrs = Vec::new();
        if self.bold {
            attrs.push(Attribute::Bold);
        }
        if self.reverse {
            attrs.push(Attribute::Reverse);
        }
        if self.italic {
            attrs.push(Attribute::Italic);
        }
        attrs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub color: ColorMode,
}

impl Theme {
    #[must_use]
    pub const fn new(color: ColorMode) -> Self {
        Self { color }
    }

    /// Without color, emphasis survives as bold/reverse so focus stays visible.
    #[must_use]
    pub const fn style(self, token: Token) -> Style {
        let styled = match token {
            Token::Title => Style::fg(Color::Cyan).bold(),
            Token::Subtitle => Style::fg(Color::Magenta).italic(),
            Token::Normal | Token::Input => Style::fg(Color::White),
            Token::Selected => Style::fg(Color::Cyan).bold().reverse(),
            Token::Muted => Style::fg(Color::DarkGrey),
            Token::Label => Style::fg(Color::Cyan).bold(),
            Token::FocusedInput => Style::fg(Color::Cyan).bold(),
            Token::Button => Style::fg(Color::Magenta),
            Token::FocusedButton => Style::fg(Color::Cyan).bold().reverse(),
            Token::Error => Style::fg(Color::Red).bold(),
            Token::Success => Style::fg(Color::Green).bold(),
        };
        match self.color {
            ColorMode::Enabled => styled,
            ColorMode::Disabled => Style {
                color: None,
                ..styled
            },
        }
    }
}
