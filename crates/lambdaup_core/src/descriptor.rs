use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Roles given with this prefix are used as-is, without a directory lookup.
pub const ROLE_ARN_PREFIX: &str = "arn:";

/// Source of symbolic role name to role ARN mappings.
pub trait RoleDirectory {
    fn role_arns(&self) -> Result<HashMap<String, String>, String>;
}

impl RoleDirectory for HashMap<String, String> {
    fn role_arns(&self) -> Result<HashMap<String, String>, String> {
        Ok(self.clone())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read project descriptor {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed project descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to fetch role table: {0}")]
    RoleDirectory(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    #[serde(rename = "Name", alias = "name")]
    name: String,
    #[serde(rename = "Bucket", alias = "bucket")]
    bucket: String,
    #[serde(rename = "Role", alias = "role")]
    role: String,
}

/// Resolved project configuration. The role is always a fully-qualified
/// reference once a descriptor exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    name: String,
    bucket: String,
    role: String,
    base_dir: PathBuf,
}

impl ProjectDescriptor {
    /// Reads the descriptor at `path`. Its directory becomes the project root.
    pub fn load(path: &Path, roles: &dyn RoleDirectory) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path, project_dir(path), roles)
    }

    pub fn from_json(
        text: &str,
        base_dir: impl Into<PathBuf>,
        roles: &dyn RoleDirectory,
    ) -> Result<Self, LoadError> {
        let base_dir = base_dir.into();
        let origin = base_dir.clone();
        Self::parse(text, &origin, base_dir, roles)
    }

    fn parse(
        text: &str,
        origin: &Path,
        base_dir: PathBuf,
        roles: &dyn RoleDirectory,
    ) -> Result<Self, LoadError> {
        let file: DescriptorFile =
            serde_json::from_str(text).map_err(|source| LoadError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;

        let role = resolve_role(&file.role, roles)?;
        info!(project = %file.name, bucket = %file.bucket, "loaded project descriptor");

        Ok(Self {
            name: file.name,
            bucket: file.bucket,
            role,
            base_dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

pub fn resolve_role(role: &str, roles: &dyn RoleDirectory) -> Result<String, LoadError> {
    if role.starts_with(ROLE_ARN_PREFIX) {
        debug!(role, "role already fully qualified");
        return Ok(role.to_string());
    }

    let table = roles.role_arns().map_err(LoadError::RoleDirectory)?;
    match table.get(role) {
        Some(arn) => {
            debug!(role, arn = %arn, "resolved symbolic role");
            Ok(arn.clone())
        }
        None => Err(LoadError::RoleNotFound(role.to_string())),
    }
}

fn project_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
