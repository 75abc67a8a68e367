//! Container launch for the corral runtime.
//!
//! [`Launcher::launch`](launcher::Launcher::launch) is the single entry
//! point: it clones an isolated child, lets it build its root filesystem
//! and exec the target command, and blocks until that child exits.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod context;
pub mod launcher;
pub mod process;
pub mod report;

pub use launcher::{LaunchOutcome, Launcher};
pub use process::ExitStatus;
