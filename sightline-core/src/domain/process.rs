//! External process results

use serde::{Deserialize, Serialize};

/// Outcome of one external process invocation
///
/// Produced once per invocation and never persisted beyond the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub exit_code: i32,
    /// Stdout followed by stderr, as forwarded to the job log
    pub combined_output: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Whether a nonzero exit status of an external tool fails the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Nonzero exit status is fatal
    Checked,
    /// Nonzero exit status is logged and the task carries on
    Unchecked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_result_success() {
        let ok = ProcessResult {
            exit_code: 0,
            combined_output: String::new(),
        };
        let failed = ProcessResult {
            exit_code: 2,
            combined_output: "boom".to_string(),
        };
        assert!(ok.success());
        assert!(!failed.success());
    }
}
