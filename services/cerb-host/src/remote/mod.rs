//! Remote shell access to the Cerberus board
//!
//! The acquisition workflow only needs a handful of capabilities from the
//! board: run a command, move files, and ask where it is. They live behind
//! [`RemoteShell`] so the workflow can run against a fake in tests.

mod ssh;

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

pub use ssh::SshShell;

/// Remote transport failures
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("remote command timed out after {timeout:?}: {command}")]
    Timeout { command: String, timeout: Duration },

    #[error("remote command output is not UTF-8: {command}")]
    Encoding { command: String },
}

/// Capabilities the host tools need from a remote shell
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Timeout used by the helper commands below
    fn default_timeout(&self) -> Duration;

    /// Run a command and return its combined stdout and stderr
    async fn run(&self, command: &str, timeout: Duration) -> Result<String, RemoteError>;

    /// Copy a remote file to a local path; `false` if the transfer failed
    async fn get_file(&self, remote: &str, local: &Path) -> Result<bool, RemoteError>;

    /// Copy a local file to a remote path; `false` if the transfer failed
    async fn put_file(&self, local: &Path, remote: &str) -> Result<bool, RemoteError>;

    /// Recursively remove a remote path
    async fn remove(&self, path: &str) -> Result<String, RemoteError> {
        self.run(&format!("rm -r {path}"), self.default_timeout())
            .await
    }

    /// Remote working directory
    async fn pwd(&self) -> Result<String, RemoteError> {
        let out = self.run("echo $PWD", self.default_timeout()).await?;
        Ok(out.trim().to_string())
    }

    /// Remote home directory
    async fn home(&self) -> Result<String, RemoteError> {
        let out = self.run("echo $HOME", self.default_timeout()).await?;
        Ok(out.trim().to_string())
    }

    async fn mkdir(&self, path: &str) -> Result<String, RemoteError> {
        self.run(&format!("mkdir {path}"), self.default_timeout())
            .await
    }

    async fn file_exists(&self, path: &str) -> Result<bool, RemoteError> {
        let out = self
            .run(&format!("[ -f {path} ] && echo OK"), self.default_timeout())
            .await?;
        Ok(out.contains("OK"))
    }

    async fn dir_exists(&self, path: &str) -> Result<bool, RemoteError> {
        let out = self
            .run(&format!("[ -d {path} ] && echo OK"), self.default_timeout())
            .await?;
        Ok(out.contains("OK"))
    }
}
