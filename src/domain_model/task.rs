use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(TaskId)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseKindError {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ParseKindError {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }
}

impl FromStr for Status {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            other => Err(ParseKindError {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for create (`POST`) and full replace (`PUT`). The backend suggests a
/// priority from the due date when none is sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub is_important: bool,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_important: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TaskOrdering {
    DueDate,
    DueDateDesc,
    CreatedAt,
    CreatedAtDesc,
}

impl TaskOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOrdering::DueDate => "due_date",
            TaskOrdering::DueDateDesc => "-due_date",
            TaskOrdering::CreatedAt => "created_at",
            TaskOrdering::CreatedAtDesc => "-created_at",
        }
    }
}

impl FromStr for TaskOrdering {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "due_date" => Ok(TaskOrdering::DueDate),
            "-due_date" => Ok(TaskOrdering::DueDateDesc),
            "created_at" => Ok(TaskOrdering::CreatedAt),
            "-created_at" => Ok(TaskOrdering::CreatedAtDesc),
            other => Err(ParseKindError {
                kind: "ordering",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub important: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<TaskOrdering>,
    pub page: Option<u32>,
}

impl TaskQuery {
    /// Query-string pairs for the filters that are set.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: String| pairs.push((key.to_string(), value));

        if let Some(status) = self.status {
            push("status", status.as_str().to_string());
        }
        if let Some(priority) = self.priority {
            push("priority", priority.as_str().to_string());
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            push("category", category.to_string());
        }
        if let Some(important) = self.important {
            push("important", if important { "1" } else { "0" }.to_string());
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            push("search", search.to_string());
        }
        if let Some(ordering) = self.ordering {
            push("ordering", ordering.as_str().to_string());
        }
        if let Some(page) = self.page {
            push("page", page.to_string());
        }
        pairs
    }

    /// The same filters without pagination, for the unpaginated listing.
    pub fn without_page(&self) -> Self {
        Self {
            page: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Number of pages at `page_size` items each; never less than one.
    pub fn page_count(&self, page_size: u64) -> u64 {
        if page_size == 0 {
            return 1;
        }
        self.count.div_ceil(page_size).max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total: u64,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub overdue_pending: u64,
    pub due_soon_pending: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCounts {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub in_progress: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReminders {
    pub overdue: u64,
    pub due_tomorrow: u64,
    pub due_soon_7_days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub counts: InsightCounts,
    pub progress_pct: u32,
    pub reminders: InsightReminders,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderDates {
    pub today: NaiveDate,
    pub tomorrow: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderCounts {
    pub overdue: u64,
    pub due_tomorrow: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminders {
    pub date: ReminderDates,
    pub counts: ReminderCounts,
    pub overdue: Vec<Task>,
    pub due_tomorrow: Vec<Task>,
}
