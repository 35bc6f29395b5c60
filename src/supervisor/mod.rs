//! Process supervisor: owns one server process and its configuration stores,
//! and drives the Stopped/Starting/Started/Stopping lifecycle.

pub mod process;
pub mod readiness;
pub mod state_machine;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command;
use crate::config::ConfigStore;
use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::mirror::{FileMirror, FsMirror};
use crate::settings::InstanceSettings;
use process::ServerProcess;
use state_machine::{StateMachine, Status};

/// Grace window for a killed process to confirm its exit. An overrun is
/// logged as a warning and the stop still counts as complete; the kill
/// signal is forceful, there is no shutdown negotiation with the server.
const KILL_GRACE: Duration = Duration::from_secs(10);

const DATA_DIRECTORY_KEY: &str = "dbms.directories.data";
const ACTIVE_DATABASE_KEY: &str = "dbms.active_database";
const DEFAULT_DATA_DIRECTORY: &str = "data/databases";
const DEFAULT_ACTIVE_DATABASE: &str = "graph.db";

/// Which configuration files an instance edits under `<home>/conf`.
///
/// Server versions differ only in how many files they carry and which one
/// holds the JVM and data-directory keys; the first file is that primary.
#[derive(Debug, Clone)]
pub struct ConfigTopology {
    files: Vec<String>,
}

impl ConfigTopology {
    pub const DEFAULT_CONFIG_FILE: &'static str = "neo4j.conf";

    pub fn single(file: &str) -> Self {
        Self {
            files: vec![file.to_string()],
        }
    }

    pub fn multi(primary: &str, extra: &[String]) -> Self {
        let mut files = vec![primary.to_string()];
        files.extend(extra.iter().filter(|f| f.as_str() != primary).cloned());
        Self { files }
    }

    pub fn primary(&self) -> &str {
        &self.files[0]
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }
}

impl Default for ConfigTopology {
    fn default() -> Self {
        Self::single(Self::DEFAULT_CONFIG_FILE)
    }
}

/// One supervised Neo4j server: home directory, launcher, endpoints, status
/// and at most one live OS process.
///
/// Operations take `&mut self`, so concurrent calls against the same
/// instance are rejected at compile time; independent instances share
/// nothing and may run in parallel.
pub struct ServerInstance {
    java_path: String,
    home_dir: PathBuf,
    endpoints: Endpoints,
    topology: ConfigTopology,
    configs: HashMap<String, ConfigStore>,
    state: StateMachine,
    process: Option<ServerProcess>,
    mirror: Arc<dyn FileMirror>,
}

impl ServerInstance {
    /// Open an instance over an installed server, loading every configuration
    /// file named by the topology. A missing file is fatal here.
    pub fn open(
        java_path: impl Into<String>,
        home_dir: impl Into<PathBuf>,
        endpoints: Endpoints,
        topology: ConfigTopology,
        mirror: Arc<dyn FileMirror>,
    ) -> Result<Self> {
        let home_dir = home_dir.into();
        let mut configs = HashMap::new();
        for file in topology.files() {
            let store = ConfigStore::load(home_dir.join("conf").join(file))?;
            configs.insert(file.clone(), store);
        }
        Ok(Self {
            java_path: java_path.into(),
            home_dir,
            endpoints,
            topology,
            configs,
            state: StateMachine::new(),
            process: None,
            mirror,
        })
    }

    /// Open from TOML settings with the default filesystem mirror.
    pub fn from_settings(settings: &InstanceSettings) -> Result<Self> {
        Self::open(
            settings.java_path.clone(),
            settings.home_dir.clone(),
            settings.endpoints()?,
            settings.topology(),
            Arc::new(FsMirror),
        )
    }

    pub fn status(&self) -> Status {
        self.state.current()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    /// PID of the owned process, if one is assigned.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.id())
    }

    fn primary_config(&self) -> &ConfigStore {
        &self.configs[self.topology.primary()]
    }

    /// Launch the server and wait until every endpoint answers.
    ///
    /// No-op when the instance is already `Started` with a live process. On
    /// cancellation the spawned process keeps running and the handle stays
    /// assigned; a subsequent [`stop`](Self::stop) cleans it up.
    pub async fn start(&mut self, token: &CancellationToken) -> Result<()> {
        // Reap a process that exited on its own since the last start.
        let exited = match self.process.as_mut() {
            Some(proc) => proc.has_exited(),
            None => false,
        };
        if exited {
            tracing::warn!("start: previous process exited on its own");
            self.process = None;
            self.resolve_stopped()?;
        }

        match (self.state.current(), self.process.is_some()) {
            (Status::Started, true) => {
                tracing::debug!("start: already running, nothing to do");
                return Ok(());
            }
            (Status::Starting, true) => {
                // A cancelled start left the process running; resume waiting.
                tracing::debug!("start: resuming readiness wait for a live process");
            }
            _ => {
                if self.state.current() != Status::Starting {
                    self.state.transition(Status::Starting)?;
                }
                let args = command::build_java_args(&self.home_dir, self.primary_config());
                match ServerProcess::spawn(&self.java_path, &args, &self.home_dir) {
                    Ok(proc) => self.process = Some(proc),
                    Err(e) => {
                        self.state.transition(Status::Stopped)?;
                        return Err(e);
                    }
                }
            }
        }

        readiness::wait_until_ready(&self.endpoints, token).await?;
        self.state.transition(Status::Started)?;
        Ok(())
    }

    /// Kill the process and wait up to the grace window for it to exit.
    ///
    /// No-op when nothing is running. The token aborts only this caller's
    /// wait; the kill itself always runs to completion on a detached task
    /// and the status still resolves to `Stopped`.
    pub async fn stop(&mut self, token: &CancellationToken) -> Result<()> {
        let Some(mut proc) = self.process.take() else {
            tracing::debug!("stop: no process, nothing to do");
            return self.resolve_stopped();
        };

        if proc.has_exited() {
            tracing::debug!("stop: process already exited");
            return self.resolve_stopped();
        }

        self.state.transition(Status::Stopping)?;
        let pid = proc.id();
        let waiter = tokio::spawn(async move { proc.kill_and_wait(KILL_GRACE).await });

        tokio::select! {
            exited = waiter => match exited {
                Ok(true) => tracing::info!("process {:?} exited within the grace window", pid),
                Ok(false) => tracing::warn!(
                    "process {:?} did not confirm exit within {:?}; stop treated as complete",
                    pid,
                    KILL_GRACE
                ),
                Err(e) => tracing::warn!("stop waiter task failed: {}", e),
            },
            _ = token.cancelled() => {
                // The detached task owns the process; it still kills and
                // reaps it. Only this caller unblocks.
                tracing::debug!("stop: wait cancelled by caller, kill continues in background");
            }
        }

        self.state.transition(Status::Stopped)?;
        Ok(())
    }

    /// Set a key in the primary configuration file and flush it to disk.
    /// Takes effect on the next start; a running process keeps the flags it
    /// was launched with.
    pub fn configure(&mut self, key: &str, value: &str) -> Result<()> {
        let primary = self.topology.primary().to_string();
        self.configure_in(&primary, key, value)
    }

    /// Same as [`configure`](Self::configure) against a named file of a
    /// multi-file topology.
    pub fn configure_in(&mut self, file: &str, key: &str, value: &str) -> Result<()> {
        let store = self
            .configs
            .get_mut(file)
            .ok_or_else(|| Error::UnknownConfigFile {
                name: file.to_string(),
            })?;
        store.set_value(key, value);
        store.save()
    }

    /// Active data directory, recomputed from current configuration on
    /// every call; `configure` may move it between operations.
    pub fn data_path(&self) -> PathBuf {
        let config = self.primary_config();
        let data_dir = config
            .get_value(DATA_DIRECTORY_KEY)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_DATA_DIRECTORY);
        let active = config
            .get_value(ACTIVE_DATABASE_KEY)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ACTIVE_DATABASE);
        self.home_dir.join(data_dir).join(active)
    }

    /// Stop, delete the active data directory, start again.
    ///
    /// A missing directory is fine (the server recreates it on launch); any
    /// other deletion failure aborts before the restart, leaving the
    /// instance stopped.
    pub async fn clear(&mut self, token: &CancellationToken) -> Result<()> {
        let data_path = self.data_path();
        self.stop(token).await?;

        match tokio::fs::remove_dir_all(&data_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("clear: {} did not exist", data_path.display());
            }
            Err(source) => {
                return Err(Error::FileOperation {
                    op: "clear",
                    path: data_path,
                    source,
                });
            }
        }

        self.start(token).await
    }

    /// Mirror the data directory to `destination`.
    ///
    /// With `stop_before` the instance is stopped for a consistent snapshot
    /// and started again afterwards. Without it the copy races a live
    /// process writing the same files; that inconsistency is the caller's
    /// explicit trade-off.
    pub async fn backup(
        &mut self,
        destination: &Path,
        stop_before: bool,
        token: &CancellationToken,
    ) -> Result<()> {
        let data_path = self.data_path();
        if stop_before {
            self.stop(token).await?;
        }
        self.mirror_folders(&data_path, destination, "backup").await?;
        if stop_before {
            self.start(token).await?;
        }
        Ok(())
    }

    /// Mirror `source` over the data directory and start the server on it.
    /// Files present only in the old data directory are removed.
    pub async fn restore(&mut self, source: &Path, token: &CancellationToken) -> Result<()> {
        let data_path = self.data_path();
        self.stop(token).await?;
        self.mirror_folders(source, &data_path, "restore").await?;
        self.start(token).await
    }

    /// Best-effort teardown: stop the process and release the handle. Safe
    /// to call at any point; `kill_on_drop` on the child covers every path
    /// that skips this.
    pub async fn close(&mut self) {
        let token = CancellationToken::new();
        if let Err(e) = self.stop(&token).await {
            tracing::warn!("close: stop failed: {}", e);
        }
        self.process = None;
    }

    /// Walk the valid transitions down to `Stopped` from wherever the
    /// lifecycle currently is.
    fn resolve_stopped(&mut self) -> Result<()> {
        match self.state.current() {
            Status::Stopped => {}
            Status::Starting | Status::Started => {
                self.state.transition(Status::Stopping)?;
                self.state.transition(Status::Stopped)?;
            }
            Status::Stopping => {
                self.state.transition(Status::Stopped)?;
            }
        }
        Ok(())
    }

    /// Run the mirror collaborator off the async runtime. The copy is never
    /// cancelled mid-flight; it runs to completion or hard-fails.
    async fn mirror_folders(
        &self,
        source: &Path,
        destination: &Path,
        op: &'static str,
    ) -> Result<()> {
        let mirror = Arc::clone(&self.mirror);
        let (src, dst) = (source.to_path_buf(), destination.to_path_buf());
        let result = tokio::task::spawn_blocking(move || mirror.mirror_folders(&src, &dst))
            .await
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        result.map_err(|source| Error::FileOperation {
            op,
            path: destination.to_path_buf(),
            source,
        })
    }
}
