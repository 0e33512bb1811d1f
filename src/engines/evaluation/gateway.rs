use super::process::{ManagedChild, WaitOutcome};
use super::readiness;
use super::result_log::{log_path_for, read_result_log};
use crate::config::EvaluatorConfig;
use crate::error::{GpError, Result};
use crate::types::ResultLog;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Runs one evaluation cycle over a generation's program files.
///
/// Results come back in the order of `programs`.
pub trait Evaluator {
    fn evaluate(&mut self, programs: &[(usize, PathBuf)]) -> Result<Vec<Evaluation>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationStatus {
    Completed,
    /// Log missing or malformed; scored as all zeros.
    LogUnavailable { reason: String },
    /// Client killed at its deadline; scored as all zeros.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub index: usize,
    pub program_path: PathBuf,
    pub log: ResultLog,
    pub status: EvaluationStatus,
    /// Client exit code; `None` when killed or ended by a signal.
    pub exit_code: Option<i32>,
}

impl Evaluation {
    pub fn completed(index: usize, program_path: PathBuf, log: ResultLog) -> Self {
        Self {
            index,
            program_path,
            log,
            status: EvaluationStatus::Completed,
            exit_code: Some(0),
        }
    }

    pub fn unavailable(index: usize, program_path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            index,
            program_path,
            log: ResultLog::zero(),
            status: EvaluationStatus::LogUnavailable { reason: reason.into() },
            exit_code: None,
        }
    }
}

struct LaunchedClient {
    index: usize,
    program_path: PathBuf,
    process: ManagedChild,
}

struct FinishedClient {
    index: usize,
    program_path: PathBuf,
    outcome: WaitOutcome,
}

/// Drives the external simulator: one server, one client per program.
pub struct SimulatorGateway {
    config: EvaluatorConfig,
    server: Option<ManagedChild>,
    clients: Vec<LaunchedClient>,
}

impl SimulatorGateway {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            config,
            server: None,
            clients: Vec::new(),
        }
    }

    pub fn start_server(&mut self) -> Result<()> {
        if self.server.is_some() {
            return Err(GpError::EvaluatorLaunch("server already running".to_string()));
        }

        let mut command = Command::new(&self.config.server_path);
        command.stdin(Stdio::null());
        if let Some(dir) = &self.config.server_working_dir {
            command.current_dir(dir);
        }

        log::info!("Starting {}", self.config.server_path.display());
        let server = ManagedChild::spawn(&mut command, "simulator server").map_err(|e| {
            GpError::EvaluatorLaunch(format!(
                "{}: {}",
                self.config.server_path.display(),
                e
            ))
        })?;
        self.server = Some(server);
        Ok(())
    }

    pub fn wait_until_ready(&mut self) -> Result<()> {
        let server = self
            .server
            .as_mut()
            .ok_or_else(|| GpError::EvaluatorLaunch("server not started".to_string()))?;
        readiness::wait_until_ready(&self.config.readiness, server)
    }

    /// Launch one client per program, in the given order.
    pub fn launch_clients(&mut self, programs: &[(usize, PathBuf)]) -> Result<()> {
        for (index, program_path) in programs {
            let absolute = fs::canonicalize(program_path).unwrap_or_else(|_| program_path.clone());

            let mut command = Command::new(&self.config.client_path);
            command.arg(&absolute).arg(&self.config.target).stdin(Stdio::null());
            if self.config.silence_clients {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }

            log::info!(
                "Starting {} {} {}",
                self.config.client_path.display(),
                absolute.display(),
                self.config.target
            );
            let process = ManagedChild::spawn(&mut command, format!("client {:x}", index))
                .map_err(|e| {
                    GpError::EvaluatorLaunch(format!(
                        "{} for {}: {}",
                        self.config.client_path.display(),
                        program_path.display(),
                        e
                    ))
                })?;

            self.clients.push(LaunchedClient {
                index: *index,
                program_path: program_path.clone(),
                process,
            });
        }
        Ok(())
    }

    /// Wait for every client in launch order, killing any past its deadline.
    fn await_clients(&mut self) -> Result<Vec<FinishedClient>> {
        log::info!("Waiting for {} clients to terminate", self.clients.len());
        let timeout = self.config.client_timeout();
        let mut finished = Vec::with_capacity(self.clients.len());

        for mut client in self.clients.drain(..) {
            let outcome = client.process.wait_with_deadline(timeout)?;
            match outcome {
                WaitOutcome::Exited(status) if !status.success() => {
                    log::warn!("{} exited with {}", client.process.label(), status);
                }
                WaitOutcome::Exited(_) => {}
                WaitOutcome::TimedOut => {
                    log::warn!(
                        "{} exceeded {:?}, killing it",
                        client.process.label(),
                        timeout.unwrap_or_default()
                    );
                    client.process.kill()?;
                }
            }

            finished.push(FinishedClient {
                index: client.index,
                program_path: client.program_path,
                outcome,
            });
        }

        Ok(finished)
    }

    /// Interrupt the server and wait for it, killing it after the grace period.
    pub fn stop_server(&mut self) -> Result<()> {
        if let Some(mut server) = self.server.take() {
            let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
            let status = server.shutdown(grace)?;
            log::debug!("Simulator server exited with {}", status);
        }
        Ok(())
    }

    /// Kill every client and stop the server. Used when a cycle aborts.
    pub fn abort(&mut self) {
        for mut client in self.clients.drain(..) {
            if let Err(e) = client.process.kill() {
                log::warn!("Failed to kill {}: {}", client.process.label(), e);
            }
        }
        if let Err(e) = self.stop_server() {
            log::warn!("Failed to stop simulator server: {}", e);
        }
    }

    fn run_clients(&mut self, programs: &[(usize, PathBuf)]) -> Result<Vec<FinishedClient>> {
        self.wait_until_ready()?;
        self.launch_clients(programs)?;
        self.await_clients()
    }
}

impl Evaluator for SimulatorGateway {
    fn evaluate(&mut self, programs: &[(usize, PathBuf)]) -> Result<Vec<Evaluation>> {
        self.start_server()?;

        let finished = match self.run_clients(programs) {
            Ok(finished) => finished,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };

        if let Err(e) = self.stop_server() {
            log::warn!("Simulator server did not stop cleanly: {}", e);
        }

        Ok(collect_results(finished))
    }
}

fn collect_results(finished: Vec<FinishedClient>) -> Vec<Evaluation> {
    finished
        .into_par_iter()
        .map(|client| {
            let status = match client.outcome {
                WaitOutcome::TimedOut => {
                    return Evaluation {
                        index: client.index,
                        program_path: client.program_path,
                        log: ResultLog::zero(),
                        status: EvaluationStatus::TimedOut,
                        exit_code: None,
                    };
                }
                WaitOutcome::Exited(status) => status,
            };

            let log_path = log_path_for(&client.program_path);
            let mut evaluation = match read_result_log(&log_path) {
                Ok(log) => Evaluation::completed(client.index, client.program_path, log),
                Err(e) => {
                    log::warn!("{}; scoring program {:x} as zero", e, client.index);
                    Evaluation::unavailable(client.index, client.program_path, e.to_string())
                }
            };
            evaluation.exit_code = status.code();
            evaluation
        })
        .collect()
}
