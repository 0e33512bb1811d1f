//! Genetic programming driver for Slash/A tank programs.
//!
//! Each generation lives on disk as a directory of `.sla` program files.
//! A cycle runs every program in the Morrigan simulator, scores the
//! statistics each client leaves behind, and writes the next generation
//! produced by roulette-wheel selection, two-point crossover and
//! opcode mutation.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod instructions;
pub mod types;

pub use error::{GpError, Result};
