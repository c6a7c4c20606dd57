use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::contract::PackageLocation;

pub const REMOTE_NAME_SEPARATOR: &str = "_";
pub const SOURCE_EXTENSION: &str = ".go";
pub const PACKAGE_EXTENSION: &str = ".zip";

/// Name the function is known by remotely: the base name prefixed with the
/// project name.
pub fn remote_function_name(project_name: &str, base_name: &str) -> String {
    format!("{project_name}{REMOTE_NAME_SEPARATOR}{base_name}")
}

pub fn package_object_key(remote_function_name: &str) -> String {
    format!("{remote_function_name}{PACKAGE_EXTENSION}")
}

pub fn package_location(bucket: &str, remote_function_name: &str) -> PackageLocation {
    PackageLocation {
        bucket: bucket.to_string(),
        key: package_object_key(remote_function_name),
    }
}

/// Local files produced for one function, all rooted at the project
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub source: PathBuf,
    pub binary: PathBuf,
    pub package: PathBuf,
}

impl ArtifactPaths {
    pub fn new(base_dir: &Path, base_name: &str) -> Self {
        let binary = base_dir.join(base_name);
        Self {
            source: with_suffix(&binary, SOURCE_EXTENSION),
            package: with_suffix(&binary, PACKAGE_EXTENSION),
            binary,
        }
    }
}

// Appends rather than replacing an extension, so `v1.2` keeps its dot.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
