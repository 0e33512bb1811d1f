use crate::error::{GpError, Result};
use crate::instructions::InstructionSet;
use crate::types::Program;
use rand::Rng;
use serde::Serialize;

/// Scale fitness values so they sum to one.
///
/// An all-zero population is returned as-is rather than rejected; selection
/// over it then falls through to the last index.
pub fn normalize_weights(fitness: &[f64]) -> Vec<f64> {
    let total: f64 = fitness.iter().sum();
    if total == 0.0 {
        return fitness.to_vec();
    }
    fitness.iter().map(|f| f / total).collect()
}

/// Spin the wheel once over already-normalized weights.
///
/// Accumulates in index order and returns the first index whose running
/// total exceeds the draw; rounding shortfall lands on the last index.
pub fn roulette_wheel_index<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let spin = rng.gen::<f64>();
    let mut running = 0.0;

    for (index, weight) in weights.iter().enumerate() {
        running += weight;
        if running > spin {
            return Some(index);
        }
    }

    Some(weights.len() - 1)
}

/// Roulette wheel selection: probability proportional to fitness
pub fn roulette_selection<R: Rng>(fitness: &[f64], rng: &mut R) -> Option<usize> {
    roulette_wheel_index(&normalize_weights(fitness), rng)
}

/// Output of fitness-proportionate selection.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Copies of the chosen programs, in new-generation index order.
    pub programs: Vec<Program>,
    /// `(new_index, weight_of_source)` for each selected program.
    pub weights: Vec<(usize, f64)>,
    /// Source index each new program was copied from.
    pub sources: Vec<usize>,
}

/// Fill a new generation of `count` programs by sampling with replacement.
pub fn select_generation<R: Rng>(
    programs: &[Program],
    fitness: &[f64],
    count: usize,
    rng: &mut R,
) -> Result<Selection> {
    if programs.is_empty() || programs.len() != fitness.len() {
        return Err(GpError::Configuration(format!(
            "Selection needs one fitness value per program ({} programs, {} values)",
            programs.len(),
            fitness.len()
        )));
    }

    let weights = normalize_weights(fitness);
    let mut selection = Selection {
        programs: Vec::with_capacity(count),
        weights: Vec::with_capacity(count),
        sources: Vec::with_capacity(count),
    };

    for new_index in 0..count {
        // Non-empty weights always yield an index.
        let source = roulette_wheel_index(&weights, rng).unwrap_or(weights.len() - 1);
        selection.programs.push(programs[source].clone());
        selection.weights.push((new_index, weights[source]));
        selection.sources.push(source);
    }

    Ok(selection)
}

/// Draw two distinct cut points in `[0, shared_len)` and return them ordered.
///
/// The second point is drawn from the remaining `shared_len - 1` positions,
/// so this never retries.
pub fn draw_cut_points<R: Rng>(shared_len: usize, rng: &mut R) -> Result<(usize, usize)> {
    if shared_len <= 1 {
        return Err(GpError::InvalidCrossover { shorter_len: shared_len });
    }

    let first = rng.gen_range(0..shared_len);
    let mut second = rng.gen_range(0..shared_len - 1);
    if second >= first {
        second += 1;
    }

    Ok((first.min(second), first.max(second)))
}

/// Swap the instructions on `[start, end]` (inclusive) between two programs.
pub fn swap_segments(a: &mut Program, b: &mut Program, start: usize, end: usize) -> Result<()> {
    let shared_len = a.len().min(b.len());
    if start > end || end >= shared_len {
        return Err(GpError::InvalidCrossover { shorter_len: shared_len });
    }

    a.instructions_mut()[start..=end].swap_with_slice(&mut b.instructions_mut()[start..=end]);
    Ok(())
}

/// Two-point crossover over the shorter program's length; lengths are kept.
pub fn crossover<R: Rng>(a: &mut Program, b: &mut Program, rng: &mut R) -> Result<(usize, usize)> {
    let (start, end) = draw_cut_points(a.len().min(b.len()), rng)?;
    swap_segments(a, b, start, end)?;
    Ok((start, end))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrossoverStats {
    pub trials: usize,
    pub applied: usize,
    /// Trials that lost the crossover-rate draw.
    pub not_drawn: usize,
    /// Pairs abandoned: too short, or same parent under a distinct-parent policy.
    pub skipped: usize,
    /// Trials that drew the same parent twice; nothing is exchanged.
    pub self_pairs: usize,
}

/// Recombine a freshly selected generation in place.
///
/// Runs `floor(n / 4)` trials. Parents are drawn by roulette over the
/// selection's weight table. A pair that cannot be crossed is skipped.
pub fn crossover_generation<R: Rng>(
    programs: &mut [Program],
    weights: &[(usize, f64)],
    crossover_rate: f64,
    allow_self_crossover: bool,
    rng: &mut R,
) -> CrossoverStats {
    let mut stats = CrossoverStats {
        trials: programs.len() / 4,
        ..Default::default()
    };

    let pool: Vec<f64> = normalize_weights(&weights.iter().map(|(_, w)| *w).collect::<Vec<_>>());
    let draw = |rng: &mut R| roulette_wheel_index(&pool, rng).map(|slot| weights[slot].0);

    for _ in 0..stats.trials {
        if rng.gen::<f64>() >= crossover_rate {
            stats.not_drawn += 1;
            continue;
        }

        let (Some(first), Some(mut second)) = (draw(&mut *rng), draw(&mut *rng)) else {
            stats.skipped += 1;
            continue;
        };

        if !allow_self_crossover {
            let mut redraws = 0;
            while second == first && redraws < programs.len() {
                second = draw(&mut *rng).unwrap_or(second);
                redraws += 1;
            }
            if second == first {
                log::debug!("Skipping crossover: parent {} drawn twice", first);
                stats.skipped += 1;
                continue;
            }
        }

        if first >= programs.len() || second >= programs.len() {
            stats.skipped += 1;
            continue;
        }

        if first == second {
            // The cut points are still drawn to keep the random stream aligned.
            match draw_cut_points(programs[first].len(), rng) {
                Ok(_) => stats.self_pairs += 1,
                Err(e) => {
                    log::debug!("Skipping crossover of {:x} with itself: {}", first, e);
                    stats.skipped += 1;
                }
            }
            continue;
        }

        let (a, b) = pair_mut(programs, first, second);
        match crossover(a, b, rng) {
            Ok((start, end)) => {
                log::debug!(
                    "Crossed programs {:x} and {:x} on [{}, {}]",
                    first, second, start, end
                );
                stats.applied += 1;
            }
            Err(e) => {
                log::debug!("Skipping crossover of {:x} and {:x}: {}", first, second, e);
                stats.skipped += 1;
            }
        }
    }

    stats
}

fn pair_mut(programs: &mut [Program], i: usize, j: usize) -> (&mut Program, &mut Program) {
    if i < j {
        let (left, right) = programs.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = programs.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

/// Replace one random position with a random opcode.
///
/// Returns the mutated position, or `None` when the catalog is empty.
pub fn mutate_program<R: Rng>(
    program: &mut Program,
    instruction_set: &InstructionSet,
    rng: &mut R,
) -> Option<usize> {
    let position = rng.gen_range(0..program.len());
    let opcode = instruction_set.random_opcode(rng)?;
    program.instructions_mut()[position] = opcode;
    Some(position)
}

/// Mutation pass over the whole generation; returns how many programs changed.
pub fn mutate_generation<R: Rng>(
    programs: &mut [Program],
    instruction_set: &InstructionSet,
    mutation_rate: f64,
    rng: &mut R,
) -> usize {
    let mut mutated = 0;
    for (index, program) in programs.iter_mut().enumerate() {
        if rng.gen::<f64>() < mutation_rate {
            if let Some(position) = mutate_program(program, instruction_set, rng) {
                log::debug!("Mutated program {:x} at position {}", index, position);
                mutated += 1;
            }
        }
    }
    mutated
}
