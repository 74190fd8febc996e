//! Interactive terminal session over the admin surface.
//!
//! Elm-style split: [`model`] holds state, [`update`] is a pure transition
//! function, [`render`] turns state into styled lines, [`effects`] performs the
//! admin calls a transition asks for, and [`runtime`] owns the terminal loop.

#![allow(missing_docs)]

pub mod effects;
pub mod forms;
pub mod input;
pub mod model;
pub mod render;
pub mod runtime;
pub mod terminal_guard;
pub mod theme;
pub mod update;

pub use runtime::{SessionConfig, run_session};
