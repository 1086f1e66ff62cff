// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Upstream process management.
//!
//! Spawns the wrapped MCP server with piped stdin/stdout and an inherited
//! stderr (the server's own diagnostics are not intercepted). On Linux the
//! child is bound to the proxy with PR_SET_PDEATHSIG so it cannot outlive a
//! crashed proxy.

use crate::engine_core::errors::WardenError;
use crate::mcp::pipeline::UpstreamEvent;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

pub struct ProcessSupervisor {
    pid: Option<u32>,
    // Channel to trigger a forceful kill
    kill_tx: Option<oneshot::Sender<()>>,
}

pub type ProcessSpawnResult = (
    ProcessSupervisor,
    Option<Box<dyn AsyncWrite + Unpin + Send>>,
    Option<Box<dyn AsyncRead + Unpin + Send>>,
);

impl ProcessSupervisor {
    pub fn spawn(
        cmd: &str,
        args: &[String],
        tx_events: mpsc::Sender<UpstreamEvent>,
    ) -> Result<ProcessSpawnResult, WardenError> {
        debug!("ProcessSupervisor: spawning '{}' with args {:?}", cmd, args);

        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(target_os = "linux")]
        // SAFETY: prctl with PR_SET_PDEATHSIG is the standard Linux mechanism
        // to guarantee child termination when the parent dies; the constants
        // come from libc and are valid for this platform.
        unsafe {
            command.pre_exec(|| {
                let ret = libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL);
                if ret != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = command.spawn().map_err(|e| {
            WardenError::ProcessError(format!("failed to spawn '{}': {}", cmd, e))
        })?;

        let pid = child.id();
        let stdin = child
            .stdin
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncWrite + Unpin + Send>);
        let stdout = child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>);

        let (kill_tx, kill_rx) = oneshot::channel();

        tokio::spawn(async move {
            tokio::select! {
                _ = kill_rx => {
                    let _ = child.kill().await;
                    let _ = tx_events.send(UpstreamEvent::Terminated(None)).await;
                }
                status = child.wait() => {
                    match status {
                        Ok(s) => {
                            let _ = tx_events.send(UpstreamEvent::Terminated(s.code())).await;
                        }
                        Err(_) => {
                            let _ = tx_events.send(UpstreamEvent::Terminated(None)).await;
                        }
                    }
                }
            }
        });

        Ok((
            Self {
                pid,
                kill_tx: Some(kill_tx),
            },
            stdin,
            stdout,
        ))
    }

    /// Deliver a termination signal to the child without killing it
    /// outright; the caller escalates after the grace period.
    pub fn forward_signal(&self, signum: i32) {
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        if let Some(pid) = self.pid {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;
            if let Ok(sig) = Signal::try_from(signum) {
                debug!("forwarding signal {} to child {}", sig, pid);
                let _ = kill(Pid::from_raw(pid as i32), sig);
            }
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let _ = signum;
        }
    }

    /// Forceful kill; idempotent.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Arm a SIGKILL that fires after the grace period unless the child has
    /// already exited. Called once per shutdown; later calls are no-ops.
    pub fn escalate_kill(&mut self, grace: std::time::Duration) {
        if let Some(tx) = self.kill_tx.take() {
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                let _ = tx.send(());
            });
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.kill();
    }
}
