use std::fmt;
use std::path::PathBuf;

use lambdaup_core::contract::{DeployAction, PackageLocation};
use lambdaup_core::descriptor::LoadError;
use lambdaup_core::registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    Load,
    Build,
    Package,
    Publish,
    CheckExistence,
    Create,
    Update,
}

impl DeployStage {
    /// Code logged with a fatal failure of this stage.
    pub fn code(self) -> u16 {
        match self {
            Self::Load => 201,
            Self::Build => 2020,
            Self::Package => 2021,
            Self::Publish => 2024,
            Self::CheckExistence => 2025,
            Self::Update => 2026,
            Self::Create => 2027,
        }
    }
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Build => write!(f, "build"),
            Self::Package => write!(f, "package"),
            Self::Publish => write!(f, "publish"),
            Self::CheckExistence => write!(f, "check-existence"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("build of {} failed: {message}", .path.display())]
    Build { path: PathBuf, message: String },

    #[error("packaging of {} failed: {message}", .path.display())]
    Package { path: PathBuf, message: String },

    #[error("upload to {location} failed: {message}")]
    Publish {
        location: PackageLocation,
        message: String,
    },

    #[error("existence check for {function_name} failed: {source}")]
    Registry {
        function_name: String,
        package: PackageLocation,
        #[source]
        source: RegistryError,
    },

    #[error("{action} of function {function_name} failed: {message}")]
    Reconcile {
        action: DeployAction,
        function_name: String,
        package: PackageLocation,
        message: String,
    },
}

impl DeployError {
    pub fn stage(&self) -> DeployStage {
        match self {
            Self::Load(_) => DeployStage::Load,
            Self::Build { .. } => DeployStage::Build,
            Self::Package { .. } => DeployStage::Package,
            Self::Publish { .. } => DeployStage::Publish,
            Self::Registry { .. } => DeployStage::CheckExistence,
            Self::Reconcile {
                action: DeployAction::Create,
                ..
            } => DeployStage::Create,
            Self::Reconcile {
                action: DeployAction::Update,
                ..
            } => DeployStage::Update,
        }
    }

    /// Package left in the bucket when the failure happened after a
    /// successful upload.
    pub fn orphaned_package(&self) -> Option<&PackageLocation> {
        match self {
            Self::Registry { package, .. } | Self::Reconcile { package, .. } => Some(package),
            _ => None,
        }
    }
}
