//! Full deployment of one function.
//!
//! The sequence is build, package, publish, existence check, then a single
//! create or update call. It is not atomic: once the package is uploaded, a
//! failing existence check or remote call leaves the object in the bucket
//! and the error reports where it is. Nothing is retried or rolled back.

use std::io::Write;

use lambdaup_core::contract::{BuildTarget, DeployAction, PackageLocation, DEFAULT_RUNTIME};
use lambdaup_core::descriptor::ProjectDescriptor;
use lambdaup_core::naming::{package_location, remote_function_name, ArtifactPaths};
use lambdaup_core::reconcile::{plan_reconcile, ReconcilePlan};
use lambdaup_core::registry::drain_function_pages;
use tracing::{info, warn};

use crate::adapters::archiver::Archiver;
use crate::adapters::compiler::Compiler;
use crate::adapters::object_store::PackageStore;
use crate::adapters::registry::{FunctionRegistry, FunctionWriter};
use crate::error::DeployError;
use crate::handlers::build::{build_artifact, package_artifact};
use crate::handlers::publish::publish_package;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub target: BuildTarget,
    pub runtime: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            target: BuildTarget::default(),
            runtime: DEFAULT_RUNTIME.to_string(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct DeployDependencies<'a> {
    pub compiler: &'a dyn Compiler,
    pub archiver: &'a dyn Archiver,
    pub store: &'a dyn PackageStore,
    pub registry: &'a dyn FunctionRegistry,
    pub functions: &'a dyn FunctionWriter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub action: DeployAction,
    pub function_name: String,
    pub package: PackageLocation,
    pub response: String,
}

/// Runs every stage for `base_name`, stopping at the first failure.
/// Progress lines and the remote response are written to `out`.
pub fn deploy_function(
    descriptor: &ProjectDescriptor,
    base_name: &str,
    config: &DeployConfig,
    deps: DeployDependencies<'_>,
    out: &mut dyn Write,
) -> Result<DeployOutcome, DeployError> {
    let paths = ArtifactPaths::new(descriptor.base_dir(), base_name);
    let function_name = remote_function_name(descriptor.name(), base_name);
    let location = package_location(descriptor.bucket(), &function_name);

    let binary = build_artifact(deps.compiler, &paths, &config.target)?;
    let package = package_artifact(deps.archiver, &binary, &paths.package)?;
    publish_package(deps.store, &package, &location, out)?;

    reconcile_published(
        descriptor,
        base_name,
        function_name,
        config,
        deps,
        location,
        out,
    )
    .map_err(|error| {
        if let Some(package) = error.orphaned_package() {
            warn!(%package, "package was uploaded but the function was not reconciled");
        }
        error
    })
}

fn reconcile_published(
    descriptor: &ProjectDescriptor,
    base_name: &str,
    function_name: String,
    config: &DeployConfig,
    deps: DeployDependencies<'_>,
    location: PackageLocation,
    out: &mut dyn Write,
) -> Result<DeployOutcome, DeployError> {
    info!(function = %function_name, "checking deployed functions");
    let snapshot = match drain_function_pages(|marker| deps.registry.list_functions_page(marker)) {
        Ok(snapshot) => snapshot,
        Err(source) => {
            return Err(DeployError::Registry {
                function_name,
                package: location,
                source,
            })
        }
    };
    let plan = plan_reconcile(descriptor, base_name, &snapshot, location, &config.runtime);
    drop(snapshot);

    let response = match &plan {
        ReconcilePlan::Update(request) => {
            info!(function = %request.function_name, code = %request.code, "updating function");
            deps.functions.update_function_code(request)
        }
        ReconcilePlan::Create(request) => {
            info!(
                function = %request.function_name,
                handler = %request.handler,
                runtime = %request.runtime,
                "creating function"
            );
            deps.functions.create_function(request)
        }
    }
    .map_err(|message| DeployError::Reconcile {
        action: plan.action(),
        function_name: plan.function_name().to_string(),
        package: plan.code().clone(),
        message,
    })?;

    if let Err(error) = writeln!(out, "{response}") {
        warn!(%error, "could not display remote response");
    }

    Ok(DeployOutcome {
        action: plan.action(),
        function_name: plan.function_name().to_string(),
        package: plan.code().clone(),
        response,
    })
}
