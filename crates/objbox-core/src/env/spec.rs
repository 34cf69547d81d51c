//! Environment spec file: first line names the environment, the remaining
//! lines enumerate dependency specifiers. Owned by the problem author,
//! consumed only by the provisioner.

use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSpec {
    pub name: String,
    pub dependencies: Vec<String>,
}

impl EnvironmentSpec {
    /// Blank lines and `#` comments are skipped; the first remaining line is
    /// the environment name.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        let name = lines
            .next()
            .ok_or_else(|| Error::Configuration("environment spec is empty".to_string()))?
            .to_string();
        let dependencies = lines.map(String::from).collect();
        Ok(Self { name, dependencies })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SpecNotFound(path.to_path_buf()));
        }
        Self::parse(&std::fs::read_to_string(path)?)
    }
}
