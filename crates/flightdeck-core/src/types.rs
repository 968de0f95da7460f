//! Shared type definitions used across Flightdeck crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A work item fetched from the issue tracker for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub number: u64,
    pub title: String,
    #[serde(default = "WorkItem::default_state")]
    pub state: String,
    #[serde(default)]
    pub labels: Vec<ItemLabel>,
}

/// Label attached to a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLabel {
    pub name: String,
}

impl WorkItem {
    fn default_state() -> String {
        "open".to_string()
    }

    /// Returns true if the item is still open.
    pub fn is_open(&self) -> bool {
        self.state.eq_ignore_ascii_case("open")
    }

    /// Comma-joined label names, truncated for narrow columns.
    pub fn label_summary(&self, max_width: usize) -> String {
        let joined = self
            .labels
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        if joined.len() > max_width && max_width > 3 {
            format!("{}...", &joined[..max_width - 3])
        } else {
            joined
        }
    }
}

/// Status of one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    /// Display indicator for headers and progress views.
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Pending => "·",
            Self::InProgress => "▶",
            Self::Completed => "✓",
            Self::Failed => "✗",
        }
    }

    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true if the step has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A step in the workflow pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Tracks progress through the workflow pipeline. Owned by the dashboard and
/// read by the header worker via a shared snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTracker {
    pub steps: Vec<WorkflowStep>,
    pub current_step: usize,
    pub started_at: DateTime<Utc>,
}

impl ProgressTracker {
    pub fn new(steps: Vec<WorkflowStep>) -> Self {
        Self {
            steps,
            current_step: 0,
            started_at: Utc::now(),
        }
    }

    /// Update a step by id. Sets `started_at` when the step begins and
    /// `finished_at` when it reaches a terminal state. Unknown ids are
    /// ignored.
    pub fn set_step(&mut self, step_id: &str, status: StepStatus) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            if step.id == step_id {
                step.status = status;
                match status {
                    StepStatus::InProgress => {
                        step.started_at = Some(Utc::now());
                        self.current_step = i;
                    }
                    StepStatus::Completed | StepStatus::Failed => {
                        step.finished_at = Some(Utc::now());
                    }
                    StepStatus::Pending => {}
                }
                return;
            }
        }
    }

    /// Fraction of steps completed, in `0.0..=1.0`.
    pub fn completion(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let done = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        done as f64 / self.steps.len() as f64
    }

    /// Returns true once every step has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status.is_terminal())
    }

    /// Wall-clock time since the tracker was created, whole seconds.
    pub fn elapsed(&self) -> chrono::Duration {
        let raw = Utc::now() - self.started_at;
        chrono::Duration::seconds(raw.num_seconds())
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(default_workflow_steps())
    }
}

/// The canonical workflow pipeline.
pub fn default_workflow_steps() -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::new("setup", "Preparing workspace", "Creating isolated run environment"),
        WorkflowStep::new("fetch", "Fetching work items", "Retrieving tracker data"),
        WorkflowStep::new("analysis", "Generating analysis", "Preparing implementation context"),
        WorkflowStep::new("implementation", "Running assistant", "Automated implementation pass"),
        WorkflowStep::new("validation", "Validating changes", "Running quality checks"),
        WorkflowStep::new("commit", "Committing changes", "Recording results in version control"),
        WorkflowStep::new("publish", "Publishing results", "Submitting for review"),
        WorkflowStep::new("complete", "Run complete", "Process finished"),
    ]
}
