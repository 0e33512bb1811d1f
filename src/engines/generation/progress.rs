use super::evolution_engine::{CycleState, GenerationReport, ProgressCallback};

/// Reports cycle progress through the `log` facade.
pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_state(&mut self, state: CycleState) {
        log::debug!("Cycle state: {}", state);
    }

    fn on_program_scored(&mut self, index: usize, fitness: f64) {
        log::info!("  Program {:x}: fitness {:.1}", index, fitness);
    }

    fn on_cycle_complete(&mut self, report: &GenerationReport) {
        log::info!(
            "Generation {} -> {} complete. Best: program {:x} ({:.1}), mean {:.2}, crossovers {}/{} ({} self-paired), mutations {}",
            report.source_generation,
            report.next_generation,
            report.best_index,
            report.best_fitness,
            report.mean_fitness,
            report.crossover.applied,
            report.crossover.trials,
            report.crossover.self_pairs,
            report.mutations
        );
        if !report.unavailable_logs.is_empty() || !report.timed_out.is_empty() {
            log::warn!(
                "{} program(s) scored as zero: {} without a usable log, {} timed out",
                report.unavailable_logs.len() + report.timed_out.len(),
                report.unavailable_logs.len(),
                report.timed_out.len()
            );
        }
    }
}

/// Ignores every event.
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_state(&mut self, _state: CycleState) {}

    fn on_program_scored(&mut self, _index: usize, _fitness: f64) {}

    fn on_cycle_complete(&mut self, _report: &GenerationReport) {}
}
