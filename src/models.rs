use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn previous(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Documents,
    Activities,
    Food,
    Accommodation,
    Transport,
    Shopping,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Documents,
        Category::Activities,
        Category::Food,
        Category::Accommodation,
        Category::Transport,
        Category::Shopping,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Documents => "documents",
            Category::Activities => "activities",
            Category::Food => "food",
            Category::Accommodation => "accommodation",
            Category::Transport => "transport",
            Category::Shopping => "shopping",
            Category::Other => "other",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn previous(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: usize) -> T {
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(idx + step) % all.len()]
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

// Assignment of one user to a task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assigned_to: u64,
    pub assigned_by: Option<u64>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub assigned_to_username: Option<String>,
}

impl Assignment {
    pub fn display_name(&self) -> String {
        match &self.assigned_to_username {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("User #{}", self.assigned_to),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub completed_by: u64,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub completed_by_username: Option<String>,
}

/// A checklist task as returned by the backend.
///
/// `is_completed` is authoritative. Whether a task counts as assigned is
/// derived from `assignments` and never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub trip_id: u64,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<User>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub completions: Vec<Completion>,
}

impl Task {
    pub fn is_assigned(&self) -> bool {
        !self.assignments.is_empty()
    }

    pub fn is_assigned_to(&self, user_id: u64) -> bool {
        self.assignments.iter().any(|a| a.assigned_to == user_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripMember {
    pub id: u64,
    pub trip_id: u64,
    pub user_id: u64,
    pub role: Option<String>,
    pub user: Option<User>,
}

impl TripMember {
    pub fn display_name(&self) -> String {
        match &self.user {
            Some(user) if !user.username.is_empty() => user.username.clone(),
            _ => format!("User #{}", self.user_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Category,
}

// Full-field update body, all four fields are always sent
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category: Category,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssignmentRequest {
    pub assigned_to: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_decodes_without_optional_lists() {
        let task: Task = serde_json::from_str(
            r#"{"id": 1, "trip_id": 5, "title": "Passports", "description": null,
                "priority": "urgent", "category": "documents", "is_completed": false,
                "created_at": "2024-05-01T10:00:00Z", "updated_at": null, "created_by": null}"#,
        )
        .unwrap();

        assert_eq!(task.priority, Priority::Urgent);
        assert_eq!(task.category, Category::Documents);
        assert!(task.assignments.is_empty());
        assert!(!task.is_assigned());
    }

    #[test]
    fn test_assigned_is_derived_from_assignments() {
        let task: Task = serde_json::from_str(
            r#"{"id": 2, "trip_id": 5, "title": "Book hotel", "description": null,
                "created_at": null, "updated_at": null, "created_by": null,
                "assignments": [{"assigned_to": 7, "assigned_by": 1, "assigned_at": null,
                                 "notes": null, "assigned_to_username": "sam"}]}"#,
        )
        .unwrap();

        assert!(task.is_assigned());
        assert!(task.is_assigned_to(7));
        assert!(!task.is_assigned_to(9));
        assert_eq!(task.assignments[0].display_name(), "sam");
    }

    #[test]
    fn test_enums_parse_case_insensitively_and_cycle() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" food ".parse::<Category>(), Ok(Category::Food));
        let err = "soon".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown value 'soon'");

        assert_eq!(Priority::Urgent.next(), Priority::Low);
        assert_eq!(Priority::Low.previous(), Priority::Urgent);
        assert_eq!(Category::Other.next(), Category::Documents);
    }

    #[test]
    fn test_update_body_serializes_lowercase_enums() {
        let body = TaskUpdate {
            title: "Rent car".to_string(),
            description: None,
            priority: Priority::Low,
            category: Category::Transport,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["priority"], "low");
        assert_eq!(json["category"], "transport");
        assert!(json["description"].is_null());
    }

    #[test]
    fn test_member_display_name_falls_back_to_id() {
        let member = TripMember {
            id: 1,
            trip_id: 5,
            user_id: 3,
            role: None,
            user: None,
        };
        assert_eq!(member.display_name(), "User #3");
    }
}
