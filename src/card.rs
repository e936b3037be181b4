use crate::api::ChecklistBackend;
use crate::error::{Action, TaskError};
use crate::feedback::{Feedback, Notification};
use crate::models::{Category, Priority, Task, TaskUpdate, User};
use crate::permission::{self, Capability};

/// Note attached to every completion made from the checklist.
pub const COMPLETION_NOTE: &str = "Task completed";

#[derive(Clone, Debug, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        TaskDraft {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            category: task.category,
        }
    }

    fn to_update(&self) -> TaskUpdate {
        let description = self.description.trim();
        TaskUpdate {
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            priority: self.priority,
            category: self.category,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CardMode {
    Viewing,
    Editing(TaskDraft),
    ConfirmingDelete,
    Removed,
}

/// Client-side state of one checklist task.
///
/// Holds the last task read from the backend plus the only field allowed to
/// run ahead of it: an optimistic completion flag, used for unassigned tasks
/// only. Assigned tasks always mirror `Task::is_completed`.
#[derive(Debug)]
pub struct TaskCard {
    task: Task,
    optimistic_completed: Option<bool>,
    busy: bool,
    mode: CardMode,
}

impl TaskCard {
    pub fn new(task: Task) -> Self {
        TaskCard {
            task,
            optimistic_completed: None,
            busy: false,
            mode: CardMode::Viewing,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn mode(&self) -> &CardMode {
        &self.mode
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn display_completed(&self) -> bool {
        if self.task.is_assigned() {
            self.task.is_completed
        } else {
            self.optimistic_completed.unwrap_or(self.task.is_completed)
        }
    }

    pub fn capability(&self, actor: Option<&User>) -> Capability {
        permission::capability(&self.task, actor.map(|u| u.id))
    }

    /// Replaces local state with an authoritative read of the task.
    pub fn sync(&mut self, task: Task) {
        self.task = task;
        self.optimistic_completed = None;
    }

    pub async fn toggle_completion<B, F>(
        &mut self,
        backend: &B,
        actor: Option<&User>,
        feedback: &mut F,
    ) -> Result<(), TaskError>
    where
        B: ChecklistBackend + ?Sized,
        F: Feedback,
    {
        if self.busy {
            return Err(TaskError::Busy);
        }
        let Some(actor) = actor else {
            return self.fail(feedback, TaskError::Unauthenticated);
        };
        if !permission::can_toggle(&self.task, actor.id) {
            return self.fail(feedback, TaskError::PermissionDenied);
        }

        let completing = !self.display_completed();
        let (trip_id, task_id) = (self.task.trip_id, self.task.id);

        self.busy = true;
        let result = if completing {
            backend
                .complete_task(trip_id, task_id, Some(COMPLETION_NOTE))
                .await
        } else {
            backend.uncomplete_task(trip_id, task_id).await
        };
        self.busy = false;

        if let Err(source) = result {
            return self.fail(
                feedback,
                TaskError::Request {
                    action: Action::Toggle,
                    source,
                },
            );
        }

        tracing::info!(task_id, user_id = actor.id, completing, "completion toggled");
        if self.task.is_assigned() {
            // completion of assigned tasks is aggregated by the backend
            feedback.request_refresh();
        } else {
            self.optimistic_completed = Some(completing);
        }
        feedback.notify(Notification::success(if completing {
            "Task completed!"
        } else {
            "Task marked as incomplete"
        }));
        Ok(())
    }

    pub async fn assign<B, F>(
        &mut self,
        backend: &B,
        user_id: u64,
        feedback: &mut F,
    ) -> Result<(), TaskError>
    where
        B: ChecklistBackend + ?Sized,
        F: Feedback,
    {
        if self.busy {
            return Err(TaskError::Busy);
        }
        self.busy = true;
        let result = backend
            .assign_user(self.task.trip_id, self.task.id, user_id)
            .await;
        self.busy = false;

        match result {
            Ok(()) => {
                tracing::info!(task_id = self.task.id, user_id, "user assigned");
                feedback.request_refresh();
                feedback.notify(Notification::success("User assigned successfully!"));
                Ok(())
            }
            Err(source) => self.fail(
                feedback,
                TaskError::Request {
                    action: Action::Assign,
                    source,
                },
            ),
        }
    }

    pub async fn unassign<B, F>(
        &mut self,
        backend: &B,
        user_id: u64,
        feedback: &mut F,
    ) -> Result<(), TaskError>
    where
        B: ChecklistBackend + ?Sized,
        F: Feedback,
    {
        if self.busy {
            return Err(TaskError::Busy);
        }
        if !self.task.is_assigned_to(user_id) {
            return self.fail(feedback, TaskError::NotAssigned(user_id));
        }
        self.busy = true;
        let result = backend
            .unassign_user(self.task.trip_id, self.task.id, user_id)
            .await;
        self.busy = false;

        match result {
            Ok(()) => {
                tracing::info!(task_id = self.task.id, user_id, "user unassigned");
                feedback.request_refresh();
                feedback.notify(Notification::success("User unassigned successfully!"));
                Ok(())
            }
            Err(source) => self.fail(
                feedback,
                TaskError::Request {
                    action: Action::Unassign,
                    source,
                },
            ),
        }
    }

    pub fn begin_edit(&mut self) {
        if self.mode == CardMode::Viewing {
            self.mode = CardMode::Editing(TaskDraft::from_task(&self.task));
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut TaskDraft> {
        match &mut self.mode {
            CardMode::Editing(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn cancel_edit(&mut self) {
        if matches!(self.mode, CardMode::Editing(_)) {
            self.mode = CardMode::Viewing;
        }
    }

    /// Sends the draft as a full update. The draft survives a failed save.
    pub async fn save_edit<B, F>(&mut self, backend: &B, feedback: &mut F) -> Result<(), TaskError>
    where
        B: ChecklistBackend + ?Sized,
        F: Feedback,
    {
        let update = match &self.mode {
            CardMode::Editing(draft) => draft.to_update(),
            _ => return Err(TaskError::NotEditing),
        };
        if update.title.is_empty() {
            return self.fail(feedback, TaskError::EmptyTitle);
        }
        if self.busy {
            return Err(TaskError::Busy);
        }

        self.busy = true;
        let result = backend
            .update_task(self.task.trip_id, self.task.id, &update)
            .await;
        self.busy = false;

        match result {
            Ok(updated) => {
                tracing::info!(task_id = self.task.id, "task updated");
                self.sync(updated);
                self.mode = CardMode::Viewing;
                feedback.request_refresh();
                feedback.notify(Notification::success("Task updated successfully!"));
                Ok(())
            }
            Err(source) => self.fail(
                feedback,
                TaskError::Request {
                    action: Action::Update,
                    source,
                },
            ),
        }
    }

    pub fn request_delete(&mut self) {
        if self.mode == CardMode::Viewing {
            self.mode = CardMode::ConfirmingDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        if self.mode == CardMode::ConfirmingDelete {
            self.mode = CardMode::Viewing;
        }
    }

    /// Deletes the task. Only valid once the confirmation is showing.
    pub async fn confirm_delete<B, F>(
        &mut self,
        backend: &B,
        feedback: &mut F,
    ) -> Result<(), TaskError>
    where
        B: ChecklistBackend + ?Sized,
        F: Feedback,
    {
        if self.mode != CardMode::ConfirmingDelete {
            return Err(TaskError::NotConfirmed);
        }
        if self.busy {
            return Err(TaskError::Busy);
        }

        self.busy = true;
        let result = backend.delete_task(self.task.trip_id, self.task.id).await;
        self.busy = false;

        match result {
            Ok(()) => {
                tracing::info!(task_id = self.task.id, "task deleted");
                self.mode = CardMode::Removed;
                feedback.request_refresh();
                feedback.notify(Notification::success("Task deleted successfully!"));
                Ok(())
            }
            Err(source) => {
                self.mode = CardMode::Viewing;
                self.fail(
                    feedback,
                    TaskError::Request {
                        action: Action::Delete,
                        source,
                    },
                )
            }
        }
    }

    fn fail<F: Feedback>(&self, feedback: &mut F, err: TaskError) -> Result<(), TaskError> {
        match &err {
            TaskError::Request { action, source } => {
                tracing::warn!(task_id = self.task.id, %action, error = %source, "request failed")
            }
            other => tracing::warn!(task_id = self.task.id, reason = %other, "operation refused"),
        }
        feedback.notify(Notification::error(err.to_string()));
        Err(err)
    }
}
