use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpError {
    #[error("No populations found under {}", .0.display())]
    NoPopulation(PathBuf),

    #[error("Bad program count in {}: expected {expected}, found {found}", .path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Malformed program: {0}")]
    Format(String),

    #[error("Evaluator launch failed: {0}")]
    EvaluatorLaunch(String),

    #[error("Result log {}: {reason}", .path.display())]
    ResultLog { path: PathBuf, reason: String },

    #[error("Generation directory already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Cannot cross over programs with only {shorter_len} shared position(s)")]
    InvalidCrossover { shorter_len: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GpError>;
