//! Error taxonomy for the harness.
//!
//! Every failure callers can react to differently gets its own variant;
//! in particular a cancelled readiness wait ([`Error::StartCancelled`]) is
//! distinguishable from "the server never came up" so callers know the
//! spawned process is still theirs to stop.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::supervisor::state_machine::TransitionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The file backing a [`ConfigStore`](crate::ConfigStore) does not exist.
    /// Fatal when constructing an instance.
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// A non-blank, non-comment line is not a `key=value` entry. Loading is
    /// strict: the first malformed line aborts the whole load.
    #[error("{}: line {line}: not a key=value entry: {text:?}", path.display())]
    ConfigParse {
        path: PathBuf,
        line: usize,
        text: String,
    },

    /// The wait for endpoint readiness was cancelled. The spawned server
    /// process is left running; callers are expected to `stop` it.
    #[error("start cancelled while waiting for endpoints to become ready")]
    StartCancelled,

    /// The OS refused to spawn the server process. Status stays `Stopped`.
    #[error("failed to launch {program:?}: {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A mirror or delete step of clear/backup/restore failed. The remaining
    /// steps of that sequence are not attempted.
    #[error("{op} failed for {}: {source}", path.display())]
    FileOperation {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid endpoint url {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// An endpoint whose scheme has no well-known port was given without an
    /// explicit one; the TCP readiness probe needs a concrete port.
    #[error("endpoint url {url:?} carries no port and its scheme has no default")]
    EndpointMissingPort { url: String },

    /// `configure_in` named a file that is not part of this instance's
    /// configuration topology.
    #[error("unknown configuration file {name:?} for this instance")]
    UnknownConfigFile { name: String },

    /// Internal guard: a status write that the lifecycle does not allow.
    #[error("invalid status transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("failed to build readiness probe client: {0}")]
    Probe(#[source] reqwest::Error),

    #[error("failed to load settings from {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
