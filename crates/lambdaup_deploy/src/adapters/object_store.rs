use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use lambdaup_core::contract::{PackageLocation, TransferProgress};
use tracing::warn;

/// Smallest part S3 accepts for every part but the last.
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

pub trait PackageStore {
    /// Uploads `package` to `location`, calling `on_progress` as bytes are
    /// sent. A failed upload is not rolled back.
    fn put_package(
        &self,
        package: &Path,
        location: &PackageLocation,
        on_progress: &mut dyn FnMut(TransferProgress),
    ) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub part_number: i32,
    pub e_tag: Option<String>,
}

/// Object store calls behind a chunked upload.
pub trait PartUploader {
    fn put_object(&self, location: &PackageLocation, body: Vec<u8>) -> Result<(), String>;

    /// Starts a multipart upload and returns its id.
    fn start_upload(&self, location: &PackageLocation) -> Result<String, String>;

    fn upload_part(
        &self,
        location: &PackageLocation,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<UploadedPart, String>;

    fn complete_upload(
        &self,
        location: &PackageLocation,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> Result<(), String>;

    fn abort_upload(&self, location: &PackageLocation, upload_id: &str) -> Result<(), String>;
}

/// Sends a package in `part_size` chunks, reporting progress after every
/// part. Packages that fit in one part go up in a single request. A multipart
/// upload that fails at any step is aborted, so no partial object remains.
pub fn upload_in_parts(
    uploader: &dyn PartUploader,
    package: &Path,
    location: &PackageLocation,
    part_size: u64,
    on_progress: &mut dyn FnMut(TransferProgress),
) -> Result<(), String> {
    let total = fs::metadata(package)
        .map_err(|error| format!("failed to stat {}: {error}", package.display()))?
        .len();

    if total <= part_size {
        let body = fs::read(package)
            .map_err(|error| format!("failed to read {}: {error}", package.display()))?;
        uploader.put_object(location, body)?;
        on_progress(TransferProgress {
            transferred: total,
            total,
        });
        return Ok(());
    }

    let upload_id = uploader.start_upload(location)?;
    let result = send_parts(uploader, package, location, &upload_id, part_size, total, on_progress)
        .and_then(|parts| uploader.complete_upload(location, &upload_id, parts));

    if result.is_err() {
        if let Err(error) = uploader.abort_upload(location, &upload_id) {
            warn!(%error, %location, "failed to abort multipart upload");
        }
    }
    result
}

fn send_parts(
    uploader: &dyn PartUploader,
    package: &Path,
    location: &PackageLocation,
    upload_id: &str,
    part_size: u64,
    total: u64,
    on_progress: &mut dyn FnMut(TransferProgress),
) -> Result<Vec<UploadedPart>, String> {
    let mut file = File::open(package)
        .map_err(|error| format!("failed to open {}: {error}", package.display()))?;
    let mut parts = Vec::new();
    let mut transferred = 0u64;
    let mut part_number = 1i32;

    loop {
        let chunk = read_chunk(&mut file, part_size)
            .map_err(|error| format!("failed to read {}: {error}", package.display()))?;
        if chunk.is_empty() {
            return Ok(parts);
        }
        let chunk_len = chunk.len() as u64;

        parts.push(uploader.upload_part(location, upload_id, part_number, chunk)?);
        transferred += chunk_len;
        on_progress(TransferProgress { transferred, total });
        part_number += 1;
    }
}

fn read_chunk(reader: &mut impl Read, size: u64) -> io::Result<Vec<u8>> {
    let mut chunk = Vec::new();
    reader.by_ref().take(size).read_to_end(&mut chunk)?;
    Ok(chunk)
}
