use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{non_blank, ProfileSummary};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

/// Urgency shared by tasks and support tickets
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn from_request(req: &CreateTaskRequest, created_by: &str) -> Result<Self, &'static str> {
        let title = non_blank(req.title.as_deref()).ok_or("title is required")?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: non_blank(req.description.as_deref()),
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            assigned_to: non_blank(req.assigned_to.as_deref()),
            created_by: Some(created_by.to_string()),
            due_date: req.due_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update; an empty `assigned_to` unassigns
    pub fn apply(&mut self, changes: &UpdateTaskRequest) -> Result<(), &'static str> {
        if let Some(title) = changes.title.as_deref() {
            self.title = non_blank(Some(title)).ok_or("title cannot be empty")?;
        }
        if let Some(description) = changes.description.as_deref() {
            self.description = non_blank(Some(description));
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(assigned_to) = changes.assigned_to.as_deref() {
            self.assigned_to = non_blank(Some(assigned_to));
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = Some(due_date);
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<ProfileSummary>,
    pub creator: Option<ProfileSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: Option<&str>) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.map(str::to_string),
            description: None,
            status: None,
            priority: Some(Priority::High),
            assigned_to: Some("".to_string()),
            due_date: None,
        }
    }

    #[test]
    fn test_from_request_requires_title() {
        assert!(Task::from_request(&request(None), "p1").is_err());
        assert!(Task::from_request(&request(Some("  ")), "p1").is_err());

        let task = Task::from_request(&request(Some(" Ship payroll export ")), "p1").unwrap();
        assert_eq!(task.title, "Ship payroll export");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.assigned_to, None);
        assert_eq!(task.created_by.as_deref(), Some("p1"));
    }

    #[test]
    fn test_apply_partial_update() {
        let mut task = Task::from_request(&request(Some("Draft")), "p1").unwrap();
        task.apply(&UpdateTaskRequest {
            status: Some(TaskStatus::Done),
            assigned_to: Some("p2".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.assigned_to.as_deref(), Some("p2"));
        assert_eq!(task.title, "Draft");

        task.apply(&UpdateTaskRequest {
            assigned_to: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(task.assigned_to, None);

        let blank_title = UpdateTaskRequest {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(task.apply(&blank_title).is_err());
    }
}
