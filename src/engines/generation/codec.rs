//! Flat text form of a program: `tok/tok/.../tok.`

use crate::error::{GpError, Result};
use crate::instructions::InstructionSet;
use crate::types::{Instruction, Program};
use rand::Rng;

pub const FIELD_SEPARATOR: char = '/';
pub const SENTINEL: char = '.';

/// Generate a random program with a length drawn from `[min_len, max_len]`.
pub fn generate<R: Rng>(
    instruction_set: &InstructionSet,
    min_len: usize,
    max_len: usize,
    rng: &mut R,
) -> Result<Program> {
    if min_len == 0 || min_len > max_len {
        return Err(GpError::Configuration(format!(
            "Program length range [{}, {}] is empty or allows zero-length programs",
            min_len, max_len
        )));
    }

    let length = rng.gen_range(min_len..=max_len);
    let instructions = (0..length)
        .map(|_| instruction_set.random_instruction(rng))
        .collect();

    Program::new(instructions)
}

/// Parse program text.
///
/// Opcode tokens are taken verbatim; they are not checked against any
/// instruction set so that populations survive catalog changes. Trailing
/// whitespace after the sentinel is ignored.
pub fn decode(text: &str) -> Result<Program> {
    let text = text.trim_end();
    let body = text.strip_suffix(SENTINEL).ok_or_else(|| {
        GpError::Format(format!("text does not end with '{}'", SENTINEL))
    })?;

    if body.is_empty() {
        return Err(GpError::Format("program has zero instructions".to_string()));
    }

    let instructions = body
        .split(FIELD_SEPARATOR)
        .enumerate()
        .map(|(position, token)| decode_token(position, token))
        .collect::<Result<Vec<_>>>()?;

    Program::new(instructions)
}

fn decode_token(position: usize, token: &str) -> Result<Instruction> {
    if token.is_empty() {
        return Err(GpError::Format(format!("empty field at position {}", position)));
    }

    // Digits that do not fit an immediate stay a verbatim token.
    if token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = token.parse::<u16>() {
            return Ok(Instruction::Immediate(value));
        }
    }

    Ok(Instruction::Opcode(token.to_string()))
}

/// Render a program to its text form.
pub fn encode(program: &Program) -> String {
    let mut text = String::new();
    for (i, instruction) in program.instructions().iter().enumerate() {
        if i > 0 {
            text.push(FIELD_SEPARATOR);
        }
        text.push_str(&instruction.to_string());
    }
    text.push(SENTINEL);
    text
}
