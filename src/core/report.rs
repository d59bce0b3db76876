//! Outcome report of a sync run

use std::fmt::Display;

/// Messages and counters accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub messages: Vec<String>,
    pub success_count: usize,
    pub fail_count: usize,
}

/// Coarse outcome callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    CompletedWithIssues,
    Failed,
}

impl RunReport {
    pub fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.success_count += 1;
        self.note(message);
    }

    pub fn fail(&mut self, error: impl Display) {
        self.fail_count += 1;
        self.note(error.to_string());
    }

    pub fn status(&self) -> RunStatus {
        match (self.success_count, self.fail_count) {
            (_, 0) => RunStatus::Succeeded,
            (0, _) => RunStatus::Failed,
            _ => RunStatus::CompletedWithIssues,
        }
    }

    /// Reduces the report to the single summary line returned to callers.
    pub fn summary(&self) -> String {
        let details = self.messages.join("\n");
        match self.status() {
            RunStatus::Failed => format!("Exchange rate sync failed for all bases:\n{details}"),
            RunStatus::CompletedWithIssues => format!(
                "Exchange rate sync completed with issues ({} succeeded, {} failed):\n{details}",
                self.success_count, self.fail_count
            ),
            RunStatus::Succeeded => "Exchange rate sync completed successfully.".to_string(),
        }
    }
}
