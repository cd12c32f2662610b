//! Remote shell over the system OpenSSH client
//!
//! Spawns `ssh`/`scp` per operation. Password logins go through `sshpass`,
//! which reads the password from `SSHPASS` so it never shows up in argv.
//! Otherwise the client runs in batch mode and relies on key auth.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use super::{RemoteError, RemoteShell};
use crate::config::RemoteConfig;

/// OpenSSH-backed [`RemoteShell`]
#[derive(Debug, Clone)]
pub struct SshShell {
    config: RemoteConfig,
}

impl SshShell {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Start an `ssh`/`scp` invocation with the shared login options
    fn client(&self, program: &Path) -> Command {
        let mut cmd = match &self.config.password {
            Some(password) => {
                let mut cmd = Command::new("sshpass");
                cmd.env("SSHPASS", password).arg("-e").arg(program);
                cmd
            }
            None => {
                let mut cmd = Command::new(program);
                cmd.arg("-o").arg("BatchMode=yes");
                cmd
            }
        };
        cmd.arg("-o")
            .arg("StrictHostKeyChecking=accept-new")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn ssh_command(&self, command: &str) -> Command {
        let mut cmd = self.client(&self.config.ssh_path);
        cmd.arg(self.config.destination())
            .arg(format!("{}{}", self.config.command_prefix, command));
        cmd
    }

    fn scp_command(&self, from: &str, to: &str) -> Command {
        let mut cmd = self.client(&self.config.scp_path);
        cmd.arg("-q").arg(from).arg(to);
        cmd
    }

    fn remote_spec(&self, path: &str) -> String {
        format!("{}:{}", self.config.destination(), path)
    }

    async fn transfer(&self, mut cmd: Command, what: &str) -> Result<bool, RemoteError> {
        let program = program_name(&cmd);
        debug!("Executing: {} {:?}", program, args_of(&cmd));
        let output = cmd
            .output()
            .await
            .map_err(|source| RemoteError::Spawn { program, source })?;

        if !output.status.success() {
            warn!(
                "{} failed ({}): {}",
                what,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.status.success())
    }
}

/// Program actually spawned, `sshpass` included
fn program_name(cmd: &Command) -> String {
    cmd.as_std().get_program().to_string_lossy().into_owned()
}

/// Arguments only; `Command`'s Debug output would include `SSHPASS`
fn args_of(cmd: &Command) -> Vec<String> {
    cmd.as_std()
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

impl RemoteShell for SshShell {
    fn default_timeout(&self) -> Duration {
        self.config.command_timeout
    }

    async fn run(&self, command: &str, timeout: Duration) -> Result<String, RemoteError> {
        let mut cmd = self.ssh_command(command);
        let program = program_name(&cmd);
        debug!("Executing: {} {:?}", program, args_of(&cmd));

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| RemoteError::Spawn { program, source })?,
            Err(_) => {
                return Err(RemoteError::Timeout {
                    command: command.to_string(),
                    timeout,
                })
            }
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        if !output.status.success() {
            debug!("Remote command exited with {}", output.status);
        }

        String::from_utf8(combined).map_err(|_| RemoteError::Encoding {
            command: command.to_string(),
        })
    }

    async fn get_file(&self, remote: &str, local: &Path) -> Result<bool, RemoteError> {
        let local = local.to_string_lossy();
        let cmd = self.scp_command(&self.remote_spec(remote), &local);
        self.transfer(cmd, &format!("Retrieving {remote}")).await
    }

    async fn put_file(&self, local: &Path, remote: &str) -> Result<bool, RemoteError> {
        let local = local.to_string_lossy();
        let cmd = self.scp_command(&local, &self.remote_spec(remote));
        self.transfer(cmd, &format!("Sending {local}")).await
    }
}
