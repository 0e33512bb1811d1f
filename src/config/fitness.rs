use super::traits::ConfigSection;
use crate::error::{GpError, Result};
use crate::types::ResultLog;
use serde::{Deserialize, Serialize};

/// Scoring policy applied to result logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitnessPolicy {
    /// Plain sum of the six fields.
    Sum,
    /// Weighted sum, one weight per field in file order.
    Weighted { weights: [f64; ResultLog::FIELD_COUNT] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub policy: FitnessPolicy,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self { policy: FitnessPolicy::Sum }
    }
}

impl ConfigSection for FitnessConfig {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<()> {
        if let FitnessPolicy::Weighted { weights } = &self.policy {
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(GpError::Configuration(
                    "Fitness weights must be finite and non-negative".to_string()
                ));
            }
        }
        Ok(())
    }
}
