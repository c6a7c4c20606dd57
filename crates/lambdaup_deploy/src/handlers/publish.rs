use std::io::{self, Write};
use std::path::Path;

use lambdaup_core::contract::PackageLocation;
use tracing::{info, warn};

use crate::adapters::object_store::PackageStore;
use crate::error::DeployError;

/// Uploads the package, writing one progress line to `out` per report and
/// flushing each so a long transfer stays visible.
pub fn publish_package(
    store: &dyn PackageStore,
    package: &Path,
    location: &PackageLocation,
    out: &mut dyn Write,
) -> Result<(), DeployError> {
    if !package.is_file() {
        return Err(DeployError::Publish {
            location: location.clone(),
            message: format!("package {} does not exist", package.display()),
        });
    }

    info!(package = %package.display(), %location, "starting upload");
    let mut display_error: Option<io::Error> = None;
    let result = store.put_package(package, location, &mut |progress| {
        if display_error.is_some() {
            return;
        }
        if let Err(error) = writeln!(out, "{progress}").and_then(|()| out.flush()) {
            display_error = Some(error);
        }
    });

    if let Some(error) = display_error {
        warn!(%error, "could not display upload progress");
    }
    result.map_err(|message| DeployError::Publish {
        location: location.clone(),
        message,
    })?;

    info!(%location, "upload complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use lambdaup_core::contract::TransferProgress;

    use super::*;

    struct ChunkedStore {
        chunk: u64,
        uploads: Mutex<Vec<PackageLocation>>,
        failure: Option<&'static str>,
    }

    impl PackageStore for ChunkedStore {
        fn put_package(
            &self,
            package: &Path,
            location: &PackageLocation,
            on_progress: &mut dyn FnMut(TransferProgress),
        ) -> Result<(), String> {
            let total = fs::metadata(package)
                .map_err(|error| error.to_string())?
                .len();
            let mut transferred = 0;
            while transferred < total {
                transferred = (transferred + self.chunk).min(total);
                on_progress(TransferProgress { transferred, total });
            }
            self.uploads
                .lock()
                .expect("poisoned mutex")
                .push(location.clone());
            match self.failure {
                Some(message) => Err(message.to_string()),
                None => Ok(()),
            }
        }
    }

    fn location() -> PackageLocation {
        PackageLocation {
            bucket: "b".to_string(),
            key: "svc_fetch.zip".to_string(),
        }
    }

    #[test]
    fn progress_is_written_line_by_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let package = dir.path().join("fetch.zip");
        fs::write(&package, vec![0u8; 3000]).expect("write package");
        let store = ChunkedStore {
            chunk: 1024,
            uploads: Mutex::new(Vec::new()),
            failure: None,
        };
        let mut out = Vec::new();

        publish_package(&store, &package, &location(), &mut out).expect("publish should pass");

        let text = String::from_utf8(out).expect("utf8 output");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Completed 1.0 KiB/2.9 KiB (34%)",
                "Completed 2.0 KiB/2.9 KiB (68%)",
                "Completed 2.9 KiB/2.9 KiB (100%)",
            ]
        );
        assert_eq!(
            *store.uploads.lock().expect("poisoned mutex"),
            vec![location()]
        );
    }

    #[test]
    fn missing_package_never_starts_a_transfer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ChunkedStore {
            chunk: 1024,
            uploads: Mutex::new(Vec::new()),
            failure: None,
        };

        let error = publish_package(
            &store,
            &dir.path().join("fetch.zip"),
            &location(),
            &mut Vec::new(),
        )
        .expect_err("missing package should fail");

        assert!(matches!(error, DeployError::Publish { .. }));
        assert!(store.uploads.lock().expect("poisoned mutex").is_empty());
    }

    #[test]
    fn transfer_failure_is_a_publish_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let package = dir.path().join("fetch.zip");
        fs::write(&package, b"zip").expect("write package");
        let store = ChunkedStore {
            chunk: 1024,
            uploads: Mutex::new(Vec::new()),
            failure: Some("AccessDenied"),
        };

        let error = publish_package(&store, &package, &location(), &mut Vec::new())
            .expect_err("failed transfer should fail");

        assert_eq!(
            error.to_string(),
            "upload to s3://b/svc_fetch.zip failed: AccessDenied"
        );
    }
}
