pub mod registry;

pub use registry::InstructionSet;
