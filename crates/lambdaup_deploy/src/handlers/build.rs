use std::path::{Path, PathBuf};

use lambdaup_core::contract::BuildTarget;
use lambdaup_core::naming::ArtifactPaths;
use tracing::info;

use crate::adapters::archiver::Archiver;
use crate::adapters::compiler::Compiler;
use crate::error::DeployError;

/// Compiles the function's source next to it and returns the binary path.
pub fn build_artifact(
    compiler: &dyn Compiler,
    paths: &ArtifactPaths,
    target: &BuildTarget,
) -> Result<PathBuf, DeployError> {
    info!(source = %paths.source.display(), %target, "building");
    compiler
        .compile(&paths.source, &paths.binary, target)
        .map_err(|message| DeployError::Build {
            path: paths.binary.clone(),
            message,
        })?;
    Ok(paths.binary.clone())
}

pub fn package_artifact(
    archiver: &dyn Archiver,
    artifact: &Path,
    package: &Path,
) -> Result<PathBuf, DeployError> {
    info!(package = %package.display(), "zipping");
    archiver
        .archive(artifact, package)
        .map_err(|message| DeployError::Package {
            path: package.to_path_buf(),
            message,
        })?;
    Ok(package.to_path_buf())
}
