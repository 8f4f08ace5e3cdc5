use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable handle for a task. Assigned once by the store and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Priority::High => "🔥",
            Priority::Normal => "⭐",
            Priority::Low => "💤",
        }
    }

    /// Parses optional user input. Missing or blank input means `normal`.
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Priority::Normal),
            Some(value) => value.parse(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Rejected input at the creation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task title cannot be empty!")]
    EmptyTitle,
    #[error("Unknown priority `{0}`; expected high, normal or low")]
    UnknownPriority(String),
}

/// Validated input for a new task. Stores assign the id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
}

impl NewTask {
    pub fn parse(title: &str, priority: Option<&str>) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(Self {
            title: title.to_string(),
            priority: Priority::parse_optional(priority)?,
        })
    }

    pub fn into_task(self, id: TaskId, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            completed: false,
            priority: self.priority,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Marks the task done. There is no way back.
    pub fn complete(&mut self) {
        self.completed = true;
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            title: self.title.clone(),
            completed: self.completed,
            created_at: self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            priority: self.priority,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.completed { "✓" } else { "○" };
        write!(f, "{} {} {}", status, self.priority.icon(), self.title)
    }
}

/// Serializable projection used by the JSON listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
    High,
}

impl TaskFilter {
    /// Unrecognized values fall back to `All`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "completed" => TaskFilter::Completed,
            "pending" => TaskFilter::Pending,
            "high" => TaskFilter::High,
            _ => TaskFilter::All,
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Completed => task.completed,
            TaskFilter::Pending => !task.completed,
            TaskFilter::High => task.priority == Priority::High,
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Completed => "completed",
            TaskFilter::Pending => "pending",
            TaskFilter::High => "high",
        }
    }

    pub const fn page_title(self) -> &'static str {
        match self {
            TaskFilter::All => "All Tasks",
            TaskFilter::Completed => "Completed Tasks",
            TaskFilter::Pending => "Pending Tasks",
            TaskFilter::High => "High Priority Tasks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub completion_rate: f64,
    pub high_priority: u64,
    pub normal_priority: u64,
    pub low_priority: u64,
}

impl TaskStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut total = 0;
        let mut completed = 0;
        let mut by_priority = [0u64; 3];
        for task in tasks {
            total += 1;
            if task.completed {
                completed += 1;
            }
            let slot = match task.priority {
                Priority::High => 0,
                Priority::Normal => 1,
                Priority::Low => 2,
            };
            by_priority[slot] += 1;
        }
        Self::from_counts(total, completed, by_priority[0], by_priority[1], by_priority[2])
    }

    /// Builds the summary from pre-aggregated counts, as a SQL backend returns them.
    pub fn from_counts(total: u64, completed: u64, high: u64, normal: u64, low: u64) -> Self {
        Self {
            total,
            completed,
            pending: total.saturating_sub(completed),
            completion_rate: completion_rate(completed, total),
            high_priority: high,
            normal_priority: normal,
            low_priority: low,
        }
    }
}

/// Percentage rounded to one decimal place, ties to even; zero for an empty board.
fn completion_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = completed as f64 / total as f64 * 100.0;
    (percent * 10.0).round_ties_even() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub completed: usize,
    pub pending: usize,
}

/// Bulk export returned by `GET /api/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExport {
    pub tasks: Vec<TaskSummary>,
    pub count: usize,
    pub summary: CompletionSummary,
}

impl TaskExport {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            tasks: tasks.iter().map(Task::summary).collect(),
            count: tasks.len(),
            summary: CompletionSummary {
                completed,
                pending: tasks.len() - completed,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub priority: Option<String>,
}
