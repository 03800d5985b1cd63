use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TaskId;

/// A task record as the store returns it.
///
/// `id` and `created_at` are assigned by the store and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Merge one edited field, leaving the other untouched.
    pub fn set(&mut self, field: TaskField, value: impl Into<String>) {
        match field {
            TaskField::Title => self.title = value.into(),
            TaskField::Description => self.description = value.into(),
        }
    }

    /// The editable part of the task, used as the update payload.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// The user-editable fields of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Title,
    Description,
}

impl TaskField {
    pub const ALL: [TaskField; 2] = [TaskField::Title, TaskField::Description];

    /// Form field name.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(TaskField::Title),
            "description" => Ok(TaskField::Description),
            other => Err(format!("unknown task field `{other}`")),
        }
    }
}

/// Pending input for a new task; also the insert/update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn get(&self, field: TaskField) -> &str {
        match field {
            TaskField::Title => &self.title,
            TaskField::Description => &self.description,
        }
    }

    /// Merge one changed field into the buffer.
    pub fn set(&mut self, field: TaskField, value: impl Into<String>) {
        match field {
            TaskField::Title => self.title = value.into(),
            TaskField::Description => self.description = value.into(),
        }
    }

    /// Reset both fields to empty strings.
    pub fn clear(&mut self) {
        self.title.clear();
        self.description.clear();
    }

    /// First required field that is still empty, if any.
    pub fn missing_field(&self) -> Option<TaskField> {
        TaskField::ALL
            .into_iter()
            .find(|field| self.get(*field).is_empty())
    }
}
