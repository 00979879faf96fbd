use crate::verdict::Verdict;
use chrono::Utc;
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only decision log: one JSON object per line.
///
/// Logging is strictly best-effort; callers swallow failures so a full
/// disk or missing directory can never affect a decision.
pub struct DecisionLogger {
    log_path: PathBuf,
}

impl DecisionLogger {
    /// Create a DecisionLogger writing to the given path.
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        // Ensure directory exists
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Create a DecisionLogger with the default log path
    /// (`~/.config/preflight/decisions.log`).
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "HOME environment variable not set")
        })?;
        Self::with_path(
            PathBuf::from(home)
                .join(".config")
                .join("preflight")
                .join("decisions.log"),
        )
    }

    /// Append one decision record.
    pub fn log_decision(
        &self,
        tool_name: &str,
        file_path: Option<&str>,
        result: &Verdict,
    ) -> std::io::Result<()> {
        // Check and rotate log if needed
        self.rotate_if_needed()?;

        let record = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "tool_name": tool_name,
            "file_path": file_path,
            "result": {
                "is_valid": result.is_valid,
                "message": result.message,
                "severity": result.severity,
            },
        });

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(record.to_string().as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            // Rotate: decisions.log -> decisions.log.1
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_logger() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let logger = DecisionLogger::with_path(&log_path).unwrap();
        assert_eq!(logger.log_path(), log_path);
    }

    #[test]
    fn test_log_decision_record_shape() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let logger = DecisionLogger::with_path(&log_path).unwrap();
        logger
            .log_decision("Bash", None, &Verdict::error("blocked"))
            .unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        let record: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["tool_name"], "Bash");
        assert_eq!(record["result"]["is_valid"], false);
        assert_eq!(record["result"]["severity"], "error");
        assert_eq!(record["result"]["message"], "blocked");
        assert!(record["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_multiple_records_one_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let logger = DecisionLogger::with_path(&log_path).unwrap();
        logger
            .log_decision("Write", Some("a.txt"), &Verdict::passed())
            .unwrap();
        logger
            .log_decision("Bash", None, &Verdict::warning("careful"))
            .unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(serde_json::from_str::<serde_json::Value>(line).is_ok());
        }
    }

    #[test]
    fn test_log_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let logger = DecisionLogger::with_path(&log_path).unwrap();

        // Write a large entry to trigger rotation on the next append
        let large_message = "x".repeat(MAX_LOG_SIZE as usize + 1);
        logger
            .log_decision("Bash", None, &Verdict::warning(large_message))
            .unwrap();
        logger
            .log_decision("Bash", None, &Verdict::passed())
            .unwrap();

        let backup_path = log_path.with_extension("log.1");
        assert!(backup_path.exists());
        assert!(log_path.exists());
        let metadata = fs::metadata(&log_path).unwrap();
        assert!(metadata.len() < MAX_LOG_SIZE);
    }
}
