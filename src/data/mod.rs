pub mod population;

pub use population::{read_program, PopulationStore, StagedGeneration, PROGRAM_EXTENSION};
