//! Shared deployment domain primitives.
//!
//! This crate owns the deterministic parts of a deployment: the project
//! descriptor and its role resolution, remote naming, the remote function
//! snapshot and the create-or-update decision. It intentionally excludes AWS
//! SDK clients and subprocess concerns.

pub mod contract;
pub mod descriptor;
pub mod naming;
pub mod reconcile;
pub mod registry;
