//! Line-oriented `key=value` configuration store with multi-valued keys.
//!
//! Neo4j's `neo4j.conf` allows a key to repeat across lines
//! (`dbms.jvm.additional` carries one JVM flag per occurrence), so entries
//! are kept as an ordered sequence rather than a map.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// One `key=value` line. Keys are not unique across a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

/// In-memory view of one configuration file.
///
/// All mutation happens in memory; [`ConfigStore::save`] is the only
/// persistence point. Comment and blank lines are dropped on rewrite.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    entries: Vec<ConfigEntry>,
}

impl ConfigStore {
    /// Load and parse the file at `path`.
    ///
    /// Blank lines and `#` comments are skipped. Parsing is strict: the first
    /// line that is not `key=value` aborts the load with
    /// [`Error::ConfigParse`] rather than silently dropping the line.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::ConfigNotFound { path });
        }
        let content = fs::read_to_string(&path)?;

        let mut entries = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // The first '=' splits; values may themselves contain '='.
            let parsed = line.split_once('=').filter(|(key, _)| !key.trim().is_empty());
            let Some((key, value)) = parsed else {
                return Err(Error::ConfigParse {
                    path,
                    line: idx + 1,
                    text: raw.to_string(),
                });
            };
            entries.push(ConfigEntry {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            });
        }

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// Last write wins among same-key entries.
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// All entries for `key`, in file order. Used for legitimately repeated
    /// keys such as `dbms.jvm.additional`.
    pub fn find_values(&self, key: &str) -> Vec<&ConfigEntry> {
        self.entries.iter().filter(|e| e.key == key).collect()
    }

    /// Replace the first entry for `key` and drop any other duplicates, so
    /// the key collapses to a single value; append when the key is absent.
    /// Every other entry keeps its position.
    pub fn set_value(&mut self, key: &str, value: &str) {
        match self.entries.iter().position(|e| e.key == key) {
            Some(first) => {
                self.entries[first].value = value.to_string();
                let mut i = first + 1;
                while i < self.entries.len() {
                    if self.entries[i].key == key {
                        self.entries.remove(i);
                    } else {
                        i += 1;
                    }
                }
            }
            None => self.entries.push(ConfigEntry {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Atomically rewrite the backing file: write a sibling temp file, then
    /// rename it over the original so a failure mid-write cannot leave a
    /// half-written config behind.
    pub fn save(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        for entry in &self.entries {
            writeln!(tmp, "{}={}", entry.key, entry.value)?;
        }
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_from(content: &str) -> (tempfile::TempDir, ConfigStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("neo4j.conf");
        fs::write(&path, content).unwrap();
        let store = ConfigStore::load(&path).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_is_config_not_found() {
        let dir = tempdir().unwrap();
        let err = ConfigStore::load(dir.path().join("absent.conf")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let (_dir, store) = store_from("# header\n\ndbms.active_database=graph.db\n   \n# tail\n");
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.get_value("dbms.active_database"), Some("graph.db"));
    }

    #[test]
    fn malformed_line_is_fatal_with_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("neo4j.conf");
        fs::write(&path, "a=1\nnot a pair\nb=2\n").unwrap();
        match ConfigStore::load(&path).unwrap_err() {
            Error::ConfigParse { line, text, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "not a pair");
            }
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }

    #[test]
    fn value_may_contain_equals() {
        let (_dir, store) = store_from("dbms.jvm.additional=-Dfoo=bar\n");
        assert_eq!(store.get_value("dbms.jvm.additional"), Some("-Dfoo=bar"));
    }

    #[test]
    fn get_value_last_wins_among_duplicates() {
        let (_dir, store) = store_from("k=first\nother=x\nk=second\n");
        assert_eq!(store.get_value("k"), Some("second"));
    }

    #[test]
    fn find_values_preserves_order_and_duplicates() {
        let (_dir, store) = store_from("j=-Xa\nother=x\nj=-Xb\nj=-Xa\n");
        let values: Vec<&str> = store.find_values("j").iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, ["-Xa", "-Xb", "-Xa"]);
    }

    #[test]
    fn set_value_collapses_duplicates_to_one() {
        let (_dir, mut store) = store_from("j=-Xa\nj=-Xb\nj=-Xc\n");
        for value in ["v1", "v2", "v3"] {
            store.set_value("j", value);
        }
        assert_eq!(store.find_values("j").len(), 1);
        assert_eq!(store.get_value("j"), Some("v3"));
    }

    #[test]
    fn set_value_replaces_in_place_and_appends_new_keys() {
        let (_dir, mut store) = store_from("a=1\nb=2\nc=3\n");
        store.set_value("b", "20");
        store.set_value("d", "4");
        let keys: Vec<&str> = store.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
        assert_eq!(store.get_value("b"), Some("20"));
    }

    #[test]
    fn set_then_get_returns_exactly_that_value() {
        let (_dir, mut store) = store_from("");
        store.set_value("dbms.memory.heap.max_size", "1g");
        assert_eq!(store.get_value("dbms.memory.heap.max_size"), Some("1g"));
    }

    #[test]
    fn save_round_trips_untouched_entries() {
        let (_dir, mut store) = store_from("a=1\nj=-Xa\nj=-Xb\nz=9\n");
        store.set_value("a", "10");
        store.save().unwrap();

        let reloaded = ConfigStore::load(store.path()).unwrap();
        assert_eq!(reloaded.get_value("a"), Some("10"));
        assert_eq!(reloaded.find_values("j").len(), 2);
        assert_eq!(reloaded.get_value("z"), Some("9"));
        assert_eq!(reloaded.entries().len(), 4);
    }
}
