use crate::error::{GpError, Result};
use crate::types::ResultLog;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Companion log a client writes next to its program: `<program>.log`.
pub fn log_path_for(program_path: &Path) -> PathBuf {
    let mut name = OsString::from(program_path.as_os_str());
    name.push(".log");
    PathBuf::from(name)
}

/// Parse the six-line statistics format.
///
/// Blank lines are ignored; anything other than exactly six unsigned
/// integers is rejected.
pub fn parse_result_log(text: &str) -> std::result::Result<ResultLog, String> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    if lines.len() != ResultLog::FIELD_COUNT {
        return Err(format!(
            "expected {} values, found {}",
            ResultLog::FIELD_COUNT,
            lines.len()
        ));
    }

    let mut fields = [0u64; ResultLog::FIELD_COUNT];
    for (slot, line) in fields.iter_mut().zip(&lines) {
        *slot = line
            .parse()
            .map_err(|_| format!("'{}' is not a non-negative integer", line))?;
    }

    Ok(ResultLog::from_fields(fields))
}

pub fn read_result_log(path: &Path) -> Result<ResultLog> {
    let text = fs::read_to_string(path).map_err(|e| GpError::ResultLog {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_result_log(&text).map_err(|reason| GpError::ResultLog {
        path: path.to_path_buf(),
        reason,
    })
}
