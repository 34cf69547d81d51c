//! Persisted problem registry: name → launch metadata.
//!
//! Backed by a single JSON document under the config root. Every mutation
//! synchronously rewrites the store through a same-directory temp file and
//! an atomic rename, so a failed write never corrupts the previous state.
//! Concurrent writers from different processes resolve last-writer-wins.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::env::provisioner;
use crate::error::{Error, Result};
use crate::problem::available_problems;

/// How to launch one registered problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Executable accepting `port` and `secret` as its first two arguments.
    pub run_script_location: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    /// Reserved slot: global default observer run script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    observer: Option<PathBuf>,
    #[serde(default)]
    problems: BTreeMap<String, RegistryEntry>,
}

pub struct Registry {
    path: PathBuf,
    file: RegistryFile,
}

impl Registry {
    /// Open the registry for this config, creating an empty store in memory
    /// if none is persisted yet.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.registry_path();
        let file = Self::read_file(&path)?;
        Ok(Self { path, file })
    }

    /// Re-read the persisted store, discarding in-memory state. Used after a
    /// subprocess (the one-shot registration entrypoint) has written to it.
    pub fn reload(&mut self) -> Result<()> {
        self.file = Self::read_file(&self.path)?;
        Ok(())
    }

    fn read_file(path: &Path) -> Result<RegistryFile> {
        if !path.exists() {
            return Ok(RegistryFile::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Add or overwrite an entry. Without `force`, an existing name is an
    /// [`Error::AlreadyRegistered`]; that is the single conflict policy for
    /// every call site.
    pub fn register(
        &mut self,
        name: &str,
        run_script_location: impl Into<PathBuf>,
        force: bool,
    ) -> Result<()> {
        if self.file.problems.contains_key(name) && !force {
            return Err(Error::AlreadyRegistered(name.to_string()));
        }
        self.file.problems.insert(
            name.to_string(),
            RegistryEntry {
                run_script_location: run_script_location.into(),
            },
        );
        self.flush()?;
        tracing::debug!(problem = name, "registered");
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        if self.file.problems.remove(name).is_none() {
            return Err(Error::NotFound(name.to_string()));
        }
        self.flush()
    }

    pub fn lookup(&self, name: &str) -> Result<&RegistryEntry> {
        self.file
            .problems
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Names with a persisted entry.
    pub fn registered_names(&self) -> Vec<String> {
        self.file.problems.keys().cloned().collect()
    }

    /// Persisted entries merged with the static catalog; with
    /// `include_provisionable`, also names that could be installed from the
    /// problem repository. Sorted, deduplicated.
    pub fn list(&self, config: &Config, include_provisionable: bool) -> Vec<String> {
        let mut names: std::collections::BTreeSet<String> =
            self.file.problems.keys().cloned().collect();
        names.extend(available_problems().iter().map(|s| s.to_string()));
        if include_provisionable {
            names.extend(provisioner::provisionable_names(config));
        }
        names.into_iter().collect()
    }

    pub fn observer_run_script(&self) -> Option<&Path> {
        self.file.observer.as_deref()
    }

    pub fn set_observer_run_script(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.file.observer = Some(path.into());
        self.flush()
    }

    /// Clears the slot and returns the previous location, if any.
    pub fn delete_observer_run_script(&mut self) -> Result<Option<PathBuf>> {
        let previous = self.file.observer.take();
        self.flush()?;
        Ok(previous)
    }

    /// Atomic replace-on-write: serialize to a temp file in the registry's
    /// directory, then rename over the store.
    fn flush(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Configuration(format!("registry path has no parent: {}", self.path.display())))?;
        std::fs::create_dir_all(parent)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(serde_json::to_string_pretty(&self.file)?.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> (tempfile::TempDir, Config) {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::with_root(tmp.path().join("home"));
        (tmp, cfg)
    }

    #[test]
    fn register_then_lookup() {
        let (_tmp, cfg) = config();
        let mut registry = Registry::open(&cfg).unwrap();
        registry.register("aloha", "/opt/run_aloha.sh", false).unwrap();
        let entry = registry.lookup("aloha").unwrap();
        assert_eq!(entry.run_script_location, PathBuf::from("/opt/run_aloha.sh"));
    }

    #[test]
    fn duplicate_without_force_is_rejected() {
        let (_tmp, cfg) = config();
        let mut registry = Registry::open(&cfg).unwrap();
        registry.register("aloha", "/a", false).unwrap();
        let err = registry.register("aloha", "/b", false).unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(_)));
        // prior entry untouched
        assert_eq!(registry.lookup("aloha").unwrap().run_script_location, PathBuf::from("/a"));
    }

    #[test]
    fn force_overwrites() {
        let (_tmp, cfg) = config();
        let mut registry = Registry::open(&cfg).unwrap();
        registry.register("aloha", "/a", false).unwrap();
        registry.register("aloha", "/b", true).unwrap();
        assert_eq!(registry.lookup("aloha").unwrap().run_script_location, PathBuf::from("/b"));
    }

    #[test]
    fn delete_then_lookup_is_not_found() {
        let (_tmp, cfg) = config();
        let mut registry = Registry::open(&cfg).unwrap();
        registry.register("aloha", "/a", false).unwrap();
        registry.delete("aloha").unwrap();
        assert!(matches!(registry.lookup("aloha"), Err(Error::NotFound(_))));
        assert!(matches!(registry.delete("aloha"), Err(Error::NotFound(_))));
    }

    #[test]
    fn persisted_store_round_trips() {
        let (_tmp, cfg) = config();
        {
            let mut registry = Registry::open(&cfg).unwrap();
            registry.register("aloha", "/a", false).unwrap();
            registry.register("foldx_sasa", "/b", false).unwrap();
            registry.set_observer_run_script("/obs.sh").unwrap();
        }
        let reopened = Registry::open(&cfg).unwrap();
        assert_eq!(reopened.registered_names(), vec!["aloha", "foldx_sasa"]);
        assert_eq!(reopened.lookup("foldx_sasa").unwrap().run_script_location, PathBuf::from("/b"));
        assert_eq!(reopened.observer_run_script(), Some(Path::new("/obs.sh")));
    }

    #[test]
    fn observer_slot_clears() {
        let (_tmp, cfg) = config();
        let mut registry = Registry::open(&cfg).unwrap();
        registry.set_observer_run_script("/obs.sh").unwrap();
        let previous = registry.delete_observer_run_script().unwrap();
        assert_eq!(previous, Some(PathBuf::from("/obs.sh")));
        assert!(registry.observer_run_script().is_none());
    }

    #[test]
    fn list_merges_catalog_and_repository() {
        let (_tmp, cfg) = config();
        let problem_dir = cfg.repository_dir().join("foldx_sasa");
        std::fs::create_dir_all(&problem_dir).unwrap();
        std::fs::write(problem_dir.join("environment.spec"), "objbox__protein\nbiopython\n").unwrap();

        let mut registry = Registry::open(&cfg).unwrap();
        registry.register("custom", "/c", false).unwrap();

        let without = registry.list(&cfg, false);
        assert!(without.contains(&"aloha".to_string()));
        assert!(without.contains(&"custom".to_string()));
        assert!(!without.contains(&"foldx_sasa".to_string()));

        let with = registry.list(&cfg, true);
        assert!(with.contains(&"foldx_sasa".to_string()));
    }
}
