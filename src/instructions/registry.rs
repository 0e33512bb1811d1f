use crate::types::{Instruction, MAX_IMMEDIATE};
use rand::Rng;

/// Opcodes understood by the genetic client, in draw order.
///
/// The position of each name is significant: random draws index into this
/// list, so reordering it changes what a given seed generates.
pub const DEFAULT_OPCODES: &[&str] = &[
    "itof", "ftoi", "inc", "dec", "load", "save", "swap", "cmp", "label",
    "gotoifp", "jumpifn", "jumphere", "loop", "endloop",
    "add", "sub", "mul", "div", "abs", "sign", "exp", "log", "sin", "cos",
    "pow", "ran", "SetEnginePower", "Shoot", "Turn", "LookAt",
];

/// Ordered catalog of opcodes a program may use.
#[derive(Debug, Clone)]
pub struct InstructionSet {
    opcodes: Vec<String>,
}

impl InstructionSet {
    pub fn new() -> Self {
        Self::from_names(DEFAULT_OPCODES.iter().copied())
    }

    /// Build a catalog from an explicit list. Used by tests and by callers
    /// running a client with a different instruction table.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            opcodes: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn opcodes(&self) -> &[String] {
        &self.opcodes
    }

    /// `K`, the number of opcodes.
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.opcodes.get(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.opcodes.iter().any(|op| op == name)
    }

    /// Draw one instruction for program generation.
    ///
    /// A uniform value in `[0, K]` picks an opcode when below `K`; `K` itself
    /// means an immediate, which is then uniform in `[0, 65535]`.
    pub fn random_instruction<R: Rng>(&self, rng: &mut R) -> Instruction {
        let count = self.opcodes.len();
        let index = rng.gen_range(0..=count);

        if index < count {
            Instruction::Opcode(self.opcodes[index].clone())
        } else {
            Instruction::Immediate(rng.gen_range(0..=MAX_IMMEDIATE))
        }
    }

    /// Draw a uniformly chosen opcode, never an immediate.
    ///
    /// Returns `None` for an empty catalog.
    pub fn random_opcode<R: Rng>(&self, rng: &mut R) -> Option<Instruction> {
        if self.opcodes.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.opcodes.len());
        Some(Instruction::Opcode(self.opcodes[index].clone()))
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_catalog() {
        let set = InstructionSet::new();
        assert_eq!(set.len(), 30);
        assert_eq!(set.get(0), Some("itof"));
        assert_eq!(set.get(29), Some("LookAt"));
        assert!(set.contains("Shoot"));
        assert!(!set.contains("input"));
    }

    #[test]
    fn test_single_opcode_catalog_draws_immediates_half_the_time() {
        // K = 1: the draw is over {0, 1}, so immediates should be common.
        let set = InstructionSet::from_names(["nop"]);
        let mut rng = StdRng::seed_from_u64(7);
        let immediates = (0..1000)
            .filter(|_| set.random_instruction(&mut rng).is_immediate())
            .count();
        assert!(immediates > 400 && immediates < 600, "got {}", immediates);
    }

    #[test]
    fn test_random_opcode_never_immediate() {
        let set = InstructionSet::new();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            match set.random_opcode(&mut rng) {
                Some(Instruction::Opcode(name)) => assert!(set.contains(&name)),
                other => panic!("unexpected draw: {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_catalog() {
        let set = InstructionSet::from_names(Vec::<String>::new());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(set.random_opcode(&mut rng).is_none());
        // Only the immediate slot remains.
        assert!(set.random_instruction(&mut rng).is_immediate());
    }
}
