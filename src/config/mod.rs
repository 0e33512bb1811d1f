pub mod traits;
pub mod population;
pub mod evolution;
pub mod evaluator;
pub mod fitness;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use population::PopulationConfig;
pub use evolution::EvolutionConfig;
pub use evaluator::{EvaluatorConfig, Readiness};
pub use fitness::{FitnessConfig, FitnessPolicy};
pub use traits::ConfigSection;
