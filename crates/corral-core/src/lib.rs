//! # corral-core
//!
//! Low-level Linux isolation primitives for the corral launcher.
//!
//! This crate provides safe wrappers over:
//! - **Namespaces**: clone flags for PID, mount, UTS, and network isolation,
//!   private mount propagation, and hostname assignment.
//! - **Filesystem**: container directory layout, the `OverlayFS` root,
//!   pseudo-filesystem mounts, `/dev` population, and `pivot_root`.
//!
//! Every function here mutates per-process kernel state and is meant to be
//! called in a fixed order from the isolated child; see
//! `corral-runtime` for the orchestration.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

#[cfg(not(target_os = "linux"))]
compile_error!("corral-core requires Linux namespaces and mount(2)");

pub mod filesystem;
pub mod namespace;
