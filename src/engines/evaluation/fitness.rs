use crate::config::FitnessPolicy;
use crate::types::ResultLog;

/// Turns a result log into a selection weight.
pub trait FitnessModel: Send + Sync {
    fn score(&self, log: &ResultLog) -> f64;
}

/// Reference policy: every statistic counts once.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumFitness;

impl FitnessModel for SumFitness {
    fn score(&self, log: &ResultLog) -> f64 {
        log.fields().iter().map(|&v| v as f64).sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeightedFitness {
    weights: [f64; ResultLog::FIELD_COUNT],
}

impl WeightedFitness {
    pub fn new(weights: [f64; ResultLog::FIELD_COUNT]) -> Self {
        Self { weights }
    }
}

impl FitnessModel for WeightedFitness {
    fn score(&self, log: &ResultLog) -> f64 {
        log.fields()
            .iter()
            .zip(&self.weights)
            .map(|(&value, weight)| value as f64 * weight)
            .sum()
    }
}

pub fn score(log: &ResultLog) -> f64 {
    SumFitness.score(log)
}

pub fn model_for(policy: &FitnessPolicy) -> Box<dyn FitnessModel> {
    match policy {
        FitnessPolicy::Sum => Box::new(SumFitness),
        FitnessPolicy::Weighted { weights } => Box::new(WeightedFitness::new(*weights)),
    }
}
