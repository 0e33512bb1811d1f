use super::traits::ConfigSection;
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Directory holding one subdirectory per generation.
    pub root: PathBuf,
    pub size: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("bin/populations"),
            size: 16,
        }
    }
}

impl ConfigSection for PopulationConfig {
    fn section_name() -> &'static str {
        "population"
    }

    fn validate(&self) -> Result<()> {
        if self.size < 2 {
            return Err(GpError::Configuration(
                "Population size must be at least 2".to_string()
            ));
        }
        if self.root.as_os_str().is_empty() {
            return Err(GpError::Configuration(
                "Population root must not be empty".to_string()
            ));
        }
        Ok(())
    }
}
