pub mod fitness;
pub mod gateway;
pub mod process;
pub mod readiness;
pub mod result_log;

pub use fitness::{FitnessModel, SumFitness, WeightedFitness};
pub use gateway::{Evaluation, EvaluationStatus, Evaluator, SimulatorGateway};
pub use process::{ManagedChild, WaitOutcome};
pub use result_log::{log_path_for, parse_result_log, read_result_log};
