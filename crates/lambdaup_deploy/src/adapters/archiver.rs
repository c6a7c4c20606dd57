use std::fs::File;
use std::io;
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub trait Archiver {
    /// Wraps `artifact` into the single-entry archive at `package`.
    fn archive(&self, artifact: &Path, package: &Path) -> Result<(), String>;
}

/// Writes a deflated zip whose only entry is the artifact's file name, with
/// no directory components, marked executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, artifact: &Path, package: &Path) -> Result<(), String> {
        let entry_name = archive_entry_name(artifact)?;
        let mut binary = File::open(artifact)
            .map_err(|error| format!("failed to open {}: {error}", artifact.display()))?;
        let file = File::create(package)
            .map_err(|error| format!("failed to create {}: {error}", package.display()))?;

        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o755);
        zip.start_file(entry_name.as_str(), options)
            .map_err(|error| format!("failed to start {entry_name} entry: {error}"))?;
        io::copy(&mut binary, &mut zip)
            .map_err(|error| format!("failed to write {entry_name} entry: {error}"))?;
        zip.finish()
            .map_err(|error| format!("failed to finish {}: {error}", package.display()))?;
        Ok(())
    }
}

pub fn archive_entry_name(artifact: &Path) -> Result<String, String> {
    artifact
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("{} has no usable file name", artifact.display()))
}
