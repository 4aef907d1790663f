//! The `vtfs` command-line tool.
//!
//! Client commands mount a [`vtfs::Vtfs`], resolve their paths through
//! it (so entries known only to the remote store are fetched), perform
//! one operation and unmount. `vtfs serve` runs the reference remote
//! store.

pub mod commands;
mod env;
pub mod logging;

pub use crate::commands::VtfsCmd;
pub use crate::env::VtfsEnv;
