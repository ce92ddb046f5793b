//! Headless behaviour graph editor
//!
//! Loads graph documents, replays gesture scripts through the undoable editing
//! session and writes the result back.

pub mod commands;
pub mod config;
pub mod inspect;
pub mod io;
pub mod logging;
pub mod script;

pub use config::*;
