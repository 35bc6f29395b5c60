//! Lifecycle management for a locally-installed Neo4j server.
//!
//! The crate supervises one external Java server process per
//! [`ServerInstance`]: starting it and polling its endpoints until ready,
//! stopping it with a kill-grace window, editing its line-oriented
//! `key=value` configuration, and coordinating data-directory
//! clear/backup/restore around those state transitions.
//!
//! Built for development and test automation, not production orchestration:
//! there is no cluster coordination and no management of the database
//! protocol itself.

pub mod command;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod mirror;
pub mod settings;
pub mod supervisor;

pub use config::{ConfigEntry, ConfigStore};
pub use endpoints::Endpoints;
pub use error::{Error, Result};
pub use mirror::{FileMirror, FsMirror};
pub use settings::InstanceSettings;
pub use supervisor::state_machine::Status;
pub use supervisor::{ConfigTopology, ServerInstance};
