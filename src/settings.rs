//! Instance settings loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::endpoints::Endpoints;
use crate::error::{Error, Result};
use crate::supervisor::ConfigTopology;

/// Settings for one supervised instance, as read from a TOML file.
///
/// ```toml
/// java_path = "/usr/lib/jvm/java-8-openjdk/bin/java"
/// home_dir = "/opt/neo4j-community-3.5.3"
///
/// [endpoints]
/// http = "http://localhost:7474"
/// bolt = "bolt://localhost:7687"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceSettings {
    pub java_path: String,
    pub home_dir: PathBuf,
    pub endpoints: EndpointSettings,
    /// Configuration files under `<home>/conf`; the first is the primary.
    /// Empty means the single `neo4j.conf` topology.
    #[serde(default)]
    pub config_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSettings {
    pub http: String,
    pub bolt: Option<String>,
    pub https: Option<String>,
}

impl InstanceSettings {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::parse(
            &self.endpoints.http,
            self.endpoints.bolt.as_deref(),
            self.endpoints.https.as_deref(),
        )
    }

    pub fn topology(&self) -> ConfigTopology {
        match self.config_files.split_first() {
            Some((primary, rest)) => ConfigTopology::multi(primary, rest),
            None => ConfigTopology::default(),
        }
    }
}
