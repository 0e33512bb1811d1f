use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation numbers are plain decimal directory names starting at 0.
pub type GenerationId = u32;

/// Largest immediate literal a program may carry.
pub const MAX_IMMEDIATE: u16 = u16::MAX;

/// Single program step: a named opcode or an immediate literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    Opcode(String),
    Immediate(u16),
}

impl Instruction {
    pub fn opcode(name: impl Into<String>) -> Self {
        Instruction::Opcode(name.into())
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Instruction::Immediate(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Opcode(name) => f.write_str(name),
            Instruction::Immediate(value) => write!(f, "{}", value),
        }
    }
}

/// Linear genome evaluated by the simulator client.
///
/// Always holds at least one instruction. Operators may rewrite positions
/// in place but never change the length, so the invariant survives
/// crossover and mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Result<Self> {
        if instructions.is_empty() {
            return Err(GpError::Format(
                "program has zero instructions".to_string(),
            ));
        }
        Ok(Self { instructions })
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instructions_mut(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }
}

/// Statistics a simulator client writes after its tank's run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLog {
    pub survival_time: u64,
    pub remaining_health: u64,
    pub direct_hits_scored: u64,
    pub hits_scored: u64,
    pub direct_hits_received: u64,
    pub hits_received: u64,
}

impl ResultLog {
    /// Number of lines in a result log file.
    pub const FIELD_COUNT: usize = 6;

    /// Stand-in for a missing, unreadable or timed-out evaluation.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: [u64; Self::FIELD_COUNT]) -> Self {
        let [survival_time, remaining_health, direct_hits_scored, hits_scored, direct_hits_received, hits_received] =
            fields;
        Self {
            survival_time,
            remaining_health,
            direct_hits_scored,
            hits_scored,
            direct_hits_received,
            hits_received,
        }
    }

    /// Fields in file order.
    pub fn fields(&self) -> [u64; Self::FIELD_COUNT] {
        [
            self.survival_time,
            self.remaining_health,
            self.direct_hits_scored,
            self.hits_scored,
            self.direct_hits_received,
            self.hits_received,
        ]
    }
}
