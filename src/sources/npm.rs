//! npm-compatible installer.
//!
//! Runs `<client> install --no-save <specs>` in the target directory. Any
//! client accepting npm's `install` arguments works.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::resolver::Specifier;
use crate::sources::Installer;
use crate::util::process::{find_executable, ProcessBuilder};

/// Default installer executable.
pub const DEFAULT_CLIENT: &str = "npm";

/// Failure of the external installer.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("npm client `{client}` not found in PATH")]
    ClientNotFound { client: String },

    #[error("`{command}` failed in {} with exit code {code:?}\n{stderr}", .dir.display())]
    Failed {
        command: String,
        dir: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
}

/// Installer backed by an npm-compatible executable.
///
/// The client is looked up on first use, so workspaces with nothing to
/// install never need it.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    client: String,
}

impl NpmInstaller {
    /// Use `client`, a name on PATH or a path to an executable.
    pub fn new(client: impl Into<String>) -> Self {
        NpmInstaller {
            client: client.into(),
        }
    }

    /// Locate the client executable.
    pub fn resolve(&self) -> Result<PathBuf, InstallError> {
        find_executable(&self.client).ok_or_else(|| InstallError::ClientNotFound {
            client: self.client.clone(),
        })
    }

    /// The command that installs `specs` with `program`.
    pub fn command(&self, program: &Path, dir: &Path, specs: &[Specifier]) -> ProcessBuilder {
        ProcessBuilder::new(program)
            .arg("install")
            .arg("--no-save")
            .args(specs.iter().map(|s| s.to_string()))
            .cwd(dir)
    }
}

impl Default for NpmInstaller {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT)
    }
}

impl Installer for NpmInstaller {
    fn name(&self) -> &str {
        Path::new(&self.client)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_CLIENT)
    }

    fn install_into(&self, dir: &Path, specs: &[Specifier]) -> Result<()> {
        if specs.is_empty() {
            return Ok(());
        }

        let program = self.resolve()?;
        let cmd = self.command(&program, dir, specs);
        tracing::debug!("running `{}` in {}", cmd.display_command(), dir.display());

        let output = cmd.exec()?;
        if !output.status.success() {
            return Err(InstallError::Failed {
                command: cmd.display_command(),
                dir: dir.to_path_buf(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}
