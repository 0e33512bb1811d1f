use super::traits::ConfigSection;
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub min_program_length: usize,
    pub max_program_length: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// Whether both crossover parents may be the same program.
    pub allow_self_crossover: bool,
    /// Fixed seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            min_program_length: 256,
            max_program_length: 2048,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            allow_self_crossover: true,
            seed: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<()> {
        if self.min_program_length == 0 {
            return Err(GpError::Configuration(
                "Minimum program length must be at least 1".to_string()
            ));
        }
        if self.min_program_length > self.max_program_length {
            return Err(GpError::Configuration(format!(
                "Minimum program length {} exceeds maximum {}",
                self.min_program_length, self.max_program_length
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(GpError::Configuration(
                "Mutation rate must be between 0 and 1".to_string()
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(GpError::Configuration(
                "Crossover rate must be between 0 and 1".to_string()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_length_range() {
        let config = EvolutionConfig {
            min_program_length: 10,
            max_program_length: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_rates_out_of_range() {
        let config = EvolutionConfig { mutation_rate: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
        let config = EvolutionConfig { crossover_rate: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
