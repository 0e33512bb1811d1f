pub mod codec;
pub mod operators;
pub mod evolution_engine;
pub mod progress;

pub use evolution_engine::{
    CycleState, EvolutionEngine, GenerationReport, ProgressCallback,
};
pub use operators::{CrossoverStats, Selection};
pub use progress::{ConsoleProgressCallback, SilentProgress};
