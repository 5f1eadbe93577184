use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{OsyError, Result};

/// Tunables shared by every subcommand.  All fields are optional in the JSON
/// file; unknown fields are an error so typos do not go unnoticed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OsyConfig {
    /// zlib level, 0-9.
    pub compression_level: u32,
    /// Worker threads for `compile`; defaults to the number of CPUs.
    pub workers: Option<usize>,
    pub prune_unlocated: bool,
    pub collapse_references: bool,
    /// Keep node data for units that reported diagnostics.
    pub persist_nodes_with_diagnostics: bool,
    /// Skip producer inputs whose output is newer.
    pub skip_up_to_date: bool,
}

impl Default for OsyConfig {
    fn default() -> Self {
        OsyConfig {
            compression_level: 6,
            workers: None,
            prune_unlocated: true,
            collapse_references: true,
            persist_nodes_with_diagnostics: false,
            skip_up_to_date: true,
        }
    }
}

impl OsyConfig {
    pub fn from_json(text: &str) -> Result<OsyConfig> {
        let config: OsyConfig = serde_json::from_str(text)?;
        config.check()
    }

    pub fn load(path: &Path) -> Result<OsyConfig> {
        let reader = BufReader::new(File::open(path)?);
        let config: OsyConfig = serde_json::from_reader(reader)
            .map_err(|e| OsyError::Config(format!("{}: {}", path.display(), e)))?;
        config.check()
    }

    /// The configuration at `path`, or the defaults when there is none.
    pub fn load_or_default(path: Option<&Path>) -> Result<OsyConfig> {
        match path {
            Some(path) => OsyConfig::load(path),
            None => Ok(OsyConfig::default()),
        }
    }

    fn check(self) -> Result<OsyConfig> {
        if self.compression_level > 9 {
            return Err(OsyError::Config(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }
        if self.workers == Some(0) {
            return Err(OsyError::Config("workers must be at least 1".to_string()));
        }
        Ok(self)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = OsyConfig::from_json(r#"{"workers": 2}"#).unwrap();
        assert_eq!(config.worker_count(), 2);
        assert_eq!(config.compression_level, 6);
        assert!(config.prune_unlocated);
        assert!(!config.persist_nodes_with_diagnostics);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(OsyConfig::from_json(r#"{"compresion_level": 3}"#).is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            OsyConfig::from_json(r#"{"compression_level": 12}"#),
            Err(OsyError::Config(_))
        ));
        assert!(OsyConfig::from_json(r#"{"workers": 0}"#).is_err());
    }

    #[test]
    fn default_worker_count_is_positive() {
        assert!(OsyConfig::default().worker_count() >= 1);
    }
}
