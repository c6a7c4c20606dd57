use std::fmt;

/// Runtime identifier sent with every create call.
pub const DEFAULT_RUNTIME: &str = "go1.x";
pub const DEFAULT_TARGET_OS: &str = "linux";
pub const DEFAULT_TARGET_ARCH: &str = "amd64";

/// Platform the function binary is compiled for. The remote executor only
/// runs linux/amd64 binaries, whatever the host running the pipeline is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub os: String,
    pub arch: String,
}

impl Default for BuildTarget {
    fn default() -> Self {
        Self {
            os: DEFAULT_TARGET_OS.to_string(),
            arch: DEFAULT_TARGET_ARCH.to_string(),
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLocation {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for PackageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFunction {
    pub function_name: String,
    pub runtime: String,
    pub role: String,
    pub handler: String,
    pub code: PackageLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFunctionCode {
    pub function_name: String,
    pub code: PackageLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Create,
    Update,
}

impl fmt::Display for DeployAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// Bytes sent so far for one package upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub transferred: u64,
    pub total: u64,
}

impl TransferProgress {
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        self.transferred.min(self.total) * 100 / self.total
    }
}

impl fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Completed {}/{} ({}%)",
            human_bytes(self.transferred),
            human_bytes(self.total),
            self.percent()
        )
    }
}

fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let value = bytes as f64;
    if value >= MIB {
        format!("{:.1} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{bytes} Bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_build_target_is_linux_amd64() {
        let target = BuildTarget::default();
        assert_eq!(target.os, "linux");
        assert_eq!(target.arch, "amd64");
        assert_eq!(target.to_string(), "linux/amd64");
    }

    #[test]
    fn package_location_renders_as_s3_uri() {
        let location = PackageLocation {
            bucket: "b".to_string(),
            key: "svc_fetch.zip".to_string(),
        };
        assert_eq!(location.to_string(), "s3://b/svc_fetch.zip");
    }

    #[test]
    fn transfer_progress_line_reports_sizes_and_percent() {
        let progress = TransferProgress {
            transferred: 8 * 1024 * 1024,
            total: 16 * 1024 * 1024,
        };
        assert_eq!(progress.to_string(), "Completed 8.0 MiB/16.0 MiB (50%)");

        let small = TransferProgress {
            transferred: 512,
            total: 512,
        };
        assert_eq!(small.to_string(), "Completed 512 Bytes/512 Bytes (100%)");
    }

    #[test]
    fn empty_transfer_counts_as_complete() {
        let progress = TransferProgress {
            transferred: 0,
            total: 0,
        };
        assert_eq!(progress.percent(), 100);
    }
}
