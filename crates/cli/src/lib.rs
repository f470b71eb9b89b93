//! # PharmAssist CLI
//!
//! Terminal front end for the prescription dashboard: process bootstrap,
//! a printing [`Surface`](pharmassist_core::Surface), text formatting of the
//! view models and the command set shared by the `pharmassist` binary and the
//! interactive shell.

pub mod bootstrap;
pub mod commands;
pub mod format;
pub mod shell;
pub mod terminal;

pub use bootstrap::{config_from_env, init_tracing, Client};
pub use commands::Commands;
pub use terminal::TerminalSurface;
