//! Thin façade over one OS process: spawn, exit checks, kill with grace.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::error::{Error, Result};

/// One live server process.
///
/// `kill_on_drop` guarantees the OS process never outlives the handle, on
/// every release path including panics and early returns.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    program: String,
}

impl ServerProcess {
    pub fn spawn(program: &str, args: &[String], working_dir: &Path) -> Result<Self> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| Error::ProcessLaunch {
            program: program.to_string(),
            source,
        })?;
        tracing::info!("launched {:?} (pid {:?})", program, child.id());
        Ok(Self {
            child,
            program: program.to_string(),
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether the process has exited; reaps it if so.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Send the kill signal and wait up to `grace` for the exit. Returns
    /// whether the process exited within the window.
    pub async fn kill_and_wait(&mut self, grace: Duration) -> bool {
        if let Err(e) = self.child.start_kill() {
            // Usually means the process already exited on its own.
            tracing::debug!("kill signal for {:?} not delivered: {}", self.program, e);
        }
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!("{:?} exited with {}", self.program, status);
                true
            }
            Ok(Err(e)) => {
                tracing::warn!("waiting on {:?} failed: {}", self.program, e);
                false
            }
            Err(_) => false,
        }
    }
}
