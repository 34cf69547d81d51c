//! Explicit configuration handle, constructed once at startup and threaded
//! through. No global state, no implicit reload.
//!
//! Layout under the root (default `~/.objbox`, overridable via `OBJBOX_HOME`):
//!
//! - `registry.json`: persisted problem registry
//! - `envs/<env>`: isolated runtime environments
//! - `scripts/`: generated run scripts
//! - `repository/`: provisionable problem definitions (spec + entrypoint),
//!   overridable via `OBJBOX_REPOSITORY`

use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    repository: Option<PathBuf>,
}

impl Config {
    /// Load from environment with defaults. Call once at process startup.
    pub fn from_env() -> Self {
        let root = std::env::var("OBJBOX_HOME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".objbox")
            });
        let repository = std::env::var("OBJBOX_REPOSITORY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        Self { root, repository }
    }

    /// Construct against an explicit root. Used by tests and embedders.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            repository: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join("registry.json")
    }

    pub fn envs_dir(&self) -> PathBuf {
        self.root.join("envs")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    pub fn repository_dir(&self) -> PathBuf {
        self.repository
            .clone()
            .unwrap_or_else(|| self.root.join("repository"))
    }

    /// Create the directory skeleton if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.envs_dir())?;
        std::fs::create_dir_all(self.scripts_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_root() {
        let cfg = Config::with_root("/tmp/objbox-test");
        assert_eq!(cfg.registry_path(), PathBuf::from("/tmp/objbox-test/registry.json"));
        assert_eq!(cfg.envs_dir(), PathBuf::from("/tmp/objbox-test/envs"));
        assert_eq!(cfg.repository_dir(), PathBuf::from("/tmp/objbox-test/repository"));
    }

    #[test]
    fn ensure_dirs_creates_skeleton() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::with_root(tmp.path().join("home"));
        cfg.ensure_dirs().unwrap();
        assert!(cfg.envs_dir().is_dir());
        assert!(cfg.scripts_dir().is_dir());
    }
}
