use super::traits::ConfigSection;
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Port the simulator server listens on (UDP).
pub const SIMULATOR_PORT: u16 = 9000;

/// How the driver decides the simulator server is ready for clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Readiness {
    /// Sleep a fixed interval after launch.
    FixedDelay { millis: u64 },
    /// Poll until some process has bound the UDP port (Linux only).
    UdpPortBound { port: u16, timeout_ms: u64, poll_ms: u64 },
    /// Poll until a TCP connection to `address` succeeds.
    TcpConnect { address: String, timeout_ms: u64, poll_ms: u64 },
}

impl Default for Readiness {
    fn default() -> Self {
        Readiness::UdpPortBound {
            port: SIMULATOR_PORT,
            timeout_ms: 10_000,
            poll_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub server_path: PathBuf,
    pub client_path: PathBuf,
    /// Working directory for the server; inherited when absent.
    pub server_working_dir: Option<PathBuf>,
    /// Connection target handed to every client.
    pub target: String,
    pub readiness: Readiness,
    /// Per-client deadline measured from launch; `0` waits indefinitely.
    pub client_timeout_secs: u64,
    /// Grace period after SIGINT before the server is killed.
    pub shutdown_timeout_secs: u64,
    /// Discard client stdout/stderr.
    pub silence_clients: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            server_path: PathBuf::from("bin/morrigan"),
            client_path: PathBuf::from("bin/morrigan_genetic_client"),
            server_working_dir: None,
            target: "localhost".to_string(),
            readiness: Readiness::default(),
            client_timeout_secs: 600,
            shutdown_timeout_secs: 10,
            silence_clients: true,
        }
    }
}

impl EvaluatorConfig {
    pub fn client_timeout(&self) -> Option<std::time::Duration> {
        match self.client_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

impl ConfigSection for EvaluatorConfig {
    fn section_name() -> &'static str {
        "evaluator"
    }

    fn validate(&self) -> Result<()> {
        if self.server_path.as_os_str().is_empty() || self.client_path.as_os_str().is_empty() {
            return Err(GpError::Configuration(
                "Server and client paths must be set".to_string()
            ));
        }
        if self.target.is_empty() {
            return Err(GpError::Configuration(
                "Client connection target must not be empty".to_string()
            ));
        }
        match &self.readiness {
            Readiness::FixedDelay { .. } => {}
            Readiness::UdpPortBound { timeout_ms, poll_ms, .. }
            | Readiness::TcpConnect { timeout_ms, poll_ms, .. } => {
                if *timeout_ms == 0 || *poll_ms == 0 {
                    return Err(GpError::Configuration(
                        "Readiness timeout and poll interval must be positive".to_string()
                    ));
                }
            }
        }
        Ok(())
    }
}
