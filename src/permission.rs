use crate::models::Task;

/// How the completion control of a task is presented to the acting user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Interactive,
    /// Rendered as a dimmed indicator.
    ReadOnly,
}

/// Whether `user_id` may toggle completion of `task`.
///
/// Unassigned tasks are shared: any authenticated user may toggle them.
/// Once a task has assignees only they may.
pub fn can_toggle(task: &Task, user_id: u64) -> bool {
    !task.is_assigned() || task.is_assigned_to(user_id)
}

pub fn capability(task: &Task, user_id: Option<u64>) -> Capability {
    match user_id {
        Some(id) if can_toggle(task, id) => Capability::Interactive,
        _ => Capability::ReadOnly,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Assignment, Category, Priority};

    pub(crate) fn task_with_assignees(id: u64, assignees: &[u64]) -> Task {
        Task {
            id,
            trip_id: 5,
            title: format!("Task {}", id),
            description: None,
            priority: Priority::Medium,
            category: Category::Other,
            is_completed: false,
            created_at: None,
            updated_at: None,
            created_by: None,
            assignments: assignees
                .iter()
                .map(|&user| Assignment {
                    assigned_to: user,
                    assigned_by: Some(1),
                    assigned_at: None,
                    notes: None,
                    assigned_to_username: None,
                })
                .collect(),
            completions: Vec::new(),
        }
    }

    #[test]
    fn test_unassigned_task_is_open_to_everyone() {
        let task = task_with_assignees(1, &[]);
        for user in [1, 7, 9, 1000] {
            assert!(can_toggle(&task, user));
        }
    }

    #[test]
    fn test_assigned_task_is_limited_to_assignees() {
        let task = task_with_assignees(2, &[7, 8]);
        assert!(can_toggle(&task, 7));
        assert!(can_toggle(&task, 8));
        assert!(!can_toggle(&task, 9));
        assert!(!can_toggle(&task, 1));
    }

    #[test]
    fn test_capability_is_read_only_without_user() {
        let open = task_with_assignees(1, &[]);
        let assigned = task_with_assignees(2, &[7]);

        assert_eq!(capability(&open, None), Capability::ReadOnly);
        assert_eq!(capability(&open, Some(9)), Capability::Interactive);
        assert_eq!(capability(&assigned, Some(9)), Capability::ReadOnly);
        assert_eq!(capability(&assigned, Some(7)), Capability::Interactive);
    }
}
