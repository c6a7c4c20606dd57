use std::path::{Path, PathBuf};
use std::process::Command;

use lambdaup_core::contract::BuildTarget;
use tracing::debug;

pub trait Compiler {
    /// Compiles `source` into the binary at `output` for `target`.
    fn compile(&self, source: &Path, output: &Path, target: &BuildTarget) -> Result<(), String>;
}

/// Go toolchain driven through `go build`. The target platform is passed to
/// the child process only; the pipeline's own environment is left untouched.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: PathBuf,
}

impl GoToolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command(&self, source: &Path, output: &Path, target: &BuildTarget) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("build")
            .arg("-o")
            .arg(output)
            .arg(source)
            .env("GOOS", &target.os)
            .env("GOARCH", &target.arch);
        command
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl Compiler for GoToolchain {
    fn compile(&self, source: &Path, output: &Path, target: &BuildTarget) -> Result<(), String> {
        debug!(
            program = %self.program.display(),
            source = %source.display(),
            output = %output.display(),
            %target,
            "invoking go build"
        );

        let status = self
            .command(source, output, target)
            .status()
            .map_err(|error| {
                format!(
                    "failed to execute {}: {error}",
                    self.program.display()
                )
            })?;

        if !status.success() {
            return Err(format!(
                "{} build exited with {status}",
                self.program.display()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    #[test]
    fn command_sets_target_platform_on_the_child() {
        let toolchain = GoToolchain::default();
        let command = toolchain.command(
            Path::new("proj/fetch.go"),
            Path::new("proj/fetch"),
            &BuildTarget::default(),
        );

        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(args, ["build", "-o", "proj/fetch", "proj/fetch.go"]);

        let envs: Vec<(&OsStr, Option<&OsStr>)> = command.get_envs().collect();
        assert!(envs.contains(&(OsStr::new("GOOS"), Some(OsStr::new("linux")))));
        assert!(envs.contains(&(OsStr::new("GOARCH"), Some(OsStr::new("amd64")))));
    }

    #[test]
    fn missing_toolchain_fails_to_start() {
        let toolchain = GoToolchain::new("lambdaup-test-missing-go");
        let error = toolchain
            .compile(
                Path::new("fetch.go"),
                Path::new("fetch"),
                &BuildTarget::default(),
            )
            .expect_err("missing program should fail");
        assert!(error.contains("failed to execute lambdaup-test-missing-go"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_failure() {
        let toolchain = GoToolchain::new("false");
        let error = toolchain
            .compile(
                Path::new("fetch.go"),
                Path::new("fetch"),
                &BuildTarget::default(),
            )
            .expect_err("non-zero exit should fail");
        assert!(error.contains("exited with"));
    }
}
