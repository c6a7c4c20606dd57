//! Build, package, publish and reconcile pipeline for one function.
//!
//! Adapters describe the external collaborators (compiler, archiver, object
//! store, function API) as small synchronous traits. Handlers sequence them
//! and tag every failure with the stage it happened in. AWS-backed adapter
//! implementations live in the `lambdaup` binary.

pub mod adapters;
pub mod error;
pub mod handlers;
