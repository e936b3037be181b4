use crate::api::ChecklistBackend;
use crate::card::{CardMode, TaskCard};
use crate::error::ApiError;
use crate::feedback::{Feedback, Inbox, Notification};
use crate::models::{NewTask, TripMember, User};
use crate::parser::parse_task_input;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;
use std::io;

pub struct App<B: ChecklistBackend> {
    backend: B,
    pub trip_id: u64,
    pub current_user: Option<User>,
    pub cards: Vec<TaskCard>,
    pub members: Vec<TripMember>,
    pub state: ListState,
    pub input_mode: InputMode,
    pub active_field: EditField,
    pub new_task_title: String,
    pub picker: Option<Picker>,
    pub hide_completed: bool,
    pub inbox: Inbox,
}

#[derive(Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Adding,
    Insert,
    Picking,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditField {
    Title,
    Description,
    Priority,
    Category,
}

impl EditField {
    fn next(self) -> Self {
        match self {
            EditField::Title => EditField::Description,
            EditField::Description => EditField::Priority,
            EditField::Priority => EditField::Category,
            EditField::Category => EditField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            EditField::Title => EditField::Category,
            EditField::Description => EditField::Title,
            EditField::Priority => EditField::Description,
            EditField::Category => EditField::Priority,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PickKind {
    Assign,
    Unassign,
}

/// Member chooser for assign/unassign; options are `(user_id, name)`.
pub struct Picker {
    pub kind: PickKind,
    pub options: Vec<(u64, String)>,
    pub state: ListState,
}

impl<B: ChecklistBackend> App<B> {
    pub fn new(backend: B, trip_id: u64) -> App<B> {
        App {
            backend,
            trip_id,
            current_user: None,
            cards: Vec::new(),
            members: Vec::new(),
            state: ListState::default(),
            input_mode: InputMode::Normal,
            active_field: EditField::Title,
            new_task_title: String::new(),
            picker: None,
            hide_completed: false,
            inbox: Inbox::default(),
        }
    }

    /// Initial load. Only the checklist itself is required.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.current_user = match self.backend.fetch_current_user().await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "could not determine current user");
                None
            }
        };
        if self.current_user.is_none() {
            self.inbox
                .notify(Notification::error("Please log in to update tasks"));
        }
        self.load_members().await;
        let tasks = self.backend.fetch_tasks(self.trip_id).await?;
        self.replace_tasks(tasks);
        Ok(())
    }

    async fn load_members(&mut self) {
        match self.backend.fetch_trip_members(self.trip_id).await {
            Ok(members) => self.members = members,
            Err(err) => tracing::warn!(error = %err, "could not load trip members"),
        }
    }

    pub async fn refresh_tasks(&mut self) {
        match self.backend.fetch_tasks(self.trip_id).await {
            Ok(tasks) => self.replace_tasks(tasks),
            Err(err) => {
                tracing::warn!(error = %err, "could not refresh checklist");
                self.inbox.notify(Notification::error(
                    "Failed to load tasks. Please try again.",
                ));
            }
        }
    }

    fn replace_tasks(&mut self, tasks: Vec<crate::models::Task>) {
        tracing::debug!(count = tasks.len(), "checklist loaded");
        self.cards = tasks.into_iter().map(TaskCard::new).collect();
        self.clamp_selection();
    }

    /// Indices into `cards` of the rows currently shown.
    pub fn visible(&self) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| *card.mode() != CardMode::Removed)
            .filter(|(_, card)| !(self.hide_completed && card.display_completed()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.state.selected()?;
        self.visible().get(selected).copied()
    }

    pub fn selected_card(&self) -> Option<&TaskCard> {
        self.selected_index().map(|i| &self.cards[i])
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(i));
        }
    }

    pub fn next(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    async fn after_mutation(&mut self) {
        if self.inbox.take_refresh() {
            self.refresh_tasks().await;
        }
        self.clamp_selection();
    }

    pub async fn handle_input(&mut self, key: KeyEvent) -> io::Result<bool> {
        let mode = self.selected_card().map(|card| card.mode().clone());
        match mode {
            Some(CardMode::Editing(_)) => self.handle_edit_key(key).await,
            Some(CardMode::ConfirmingDelete) => self.handle_confirm_key(key).await,
            _ => match self.input_mode {
                InputMode::Normal => return self.handle_normal_key(key).await,
                InputMode::Adding | InputMode::Insert => self.handle_add_key(key).await,
                InputMode::Picking => self.handle_picker_key(key).await,
            },
        }
        Ok(false)
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> io::Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => self.next(),
            KeyCode::Char('k') | KeyCode::Up => self.previous(),
            KeyCode::Char(' ') => {
                if let Some(i) = self.selected_index() {
                    // failures are already reported through the inbox
                    let _ = self.cards[i]
                        .toggle_completion(&self.backend, self.current_user.as_ref(), &mut self.inbox)
                        .await;
                    self.after_mutation().await;
                }
            }
            KeyCode::Char('a') => {
                self.input_mode = InputMode::Adding;
                self.new_task_title.clear();
            }
            KeyCode::Char('e') => {
                if let Some(i) = self.selected_index() {
                    self.cards[i].begin_edit();
                    self.active_field = EditField::Title;
                }
            }
            KeyCode::Char('d') => {
                if let Some(i) = self.selected_index() {
                    self.cards[i].request_delete();
                }
            }
            KeyCode::Char('s') => self.open_picker(PickKind::Assign).await,
            KeyCode::Char('u') => self.open_picker(PickKind::Unassign).await,
            KeyCode::Char('r') => {
                self.refresh_tasks().await;
                self.load_members().await;
            }
            KeyCode::Char('t') => {
                self.hide_completed = !self.hide_completed;
                self.clamp_selection();
            }
            _ => {}
        }
        Ok(false)
    }

    async fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(i) = self.selected_index() else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                let _ = self.cards[i].save_edit(&self.backend, &mut self.inbox).await;
                self.after_mutation().await;
            }
            KeyCode::Esc => self.cards[i].cancel_edit(),
            KeyCode::Tab => self.active_field = self.active_field.next(),
            KeyCode::BackTab => self.active_field = self.active_field.previous(),
            code => {
                let field = self.active_field;
                if let Some(draft) = self.cards[i].draft_mut() {
                    match (field, code) {
                        (EditField::Title, KeyCode::Char(c)) => draft.title.push(c),
                        (EditField::Title, KeyCode::Backspace) => {
                            draft.title.pop();
                        }
                        (EditField::Description, KeyCode::Char(c)) => draft.description.push(c),
                        (EditField::Description, KeyCode::Backspace) => {
                            draft.description.pop();
                        }
                        (EditField::Priority, KeyCode::Right | KeyCode::Char('l')) => {
                            draft.priority = draft.priority.next()
                        }
                        (EditField::Priority, KeyCode::Left | KeyCode::Char('h')) => {
                            draft.priority = draft.priority.previous()
                        }
                        (EditField::Category, KeyCode::Right | KeyCode::Char('l')) => {
                            draft.category = draft.category.next()
                        }
                        (EditField::Category, KeyCode::Left | KeyCode::Char('h')) => {
                            draft.category = draft.category.previous()
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Some(i) = self.selected_index() else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let _ = self.cards[i]
                    .confirm_delete(&self.backend, &mut self.inbox)
                    .await;
                self.after_mutation().await;
            }
            KeyCode::Char('n') | KeyCode::Esc => self.cards[i].cancel_delete(),
            _ => {}
        }
    }

    async fn handle_add_key(&mut self, key: KeyEvent) {
        if self.input_mode == InputMode::Insert {
            match key.code {
                KeyCode::Char(c) => self.new_task_title.push(c),
                KeyCode::Backspace => {
                    self.new_task_title.pop();
                }
                KeyCode::Esc => self.input_mode = InputMode::Adding,
                KeyCode::Enter => self.submit_new_task().await,
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('i') => self.input_mode = InputMode::Insert,
            KeyCode::Enter => self.submit_new_task().await,
            KeyCode::Esc | KeyCode::Char('q') => {
                self.new_task_title.clear();
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    async fn submit_new_task(&mut self) {
        let parsed = parse_task_input(&self.new_task_title);
        if parsed.title.is_empty() {
            self.inbox
                .notify(Notification::error("Task title cannot be empty."));
            return;
        }
        let task = NewTask {
            title: parsed.title,
            description: None,
            priority: parsed.priority,
            category: parsed.category,
        };
        match self.backend.create_task(self.trip_id, &task).await {
            Ok(created) => {
                tracing::info!(task_id = created.id, "task created");
                self.inbox.request_refresh();
                self.inbox
                    .notify(Notification::success("Task created successfully!"));
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not create task");
                self.inbox.notify(Notification::error(
                    "Failed to create task. Please try again.",
                ));
            }
        }
        self.new_task_title.clear();
        self.input_mode = InputMode::Normal;
        self.after_mutation().await;
    }

    async fn open_picker(&mut self, kind: PickKind) {
        let Some(i) = self.selected_index() else {
            return;
        };
        let task = self.cards[i].task();
        let options: Vec<(u64, String)> = match kind {
            PickKind::Assign => self
                .members
                .iter()
                .filter(|m| !task.is_assigned_to(m.user_id))
                .map(|m| (m.user_id, m.display_name()))
                .collect(),
            PickKind::Unassign => task
                .assignments
                .iter()
                .map(|a| (a.assigned_to, a.display_name()))
                .collect(),
        };
        if options.is_empty() {
            let message = match kind {
                PickKind::Assign => "No trip members left to assign",
                PickKind::Unassign => "Nobody is assigned to this task",
            };
            self.inbox.notify(Notification::error(message));
            return;
        }
        let mut state = ListState::default();
        state.select(Some(0));
        self.picker = Some(Picker {
            kind,
            options,
            state,
        });
        self.input_mode = InputMode::Picking;
    }

    async fn handle_picker_key(&mut self, key: KeyEvent) {
        let Some(picker) = self.picker.as_mut() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        let len = picker.options.len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let i = picker.state.selected().map_or(0, |i| (i + 1) % len);
                picker.state.select(Some(i));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let i = picker
                    .state
                    .selected()
                    .map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
                picker.state.select(Some(i));
            }
            KeyCode::Enter => {
                let choice = picker
                    .state
                    .selected()
                    .and_then(|i| picker.options.get(i))
                    .map(|(id, _)| *id);
                let kind = picker.kind;
                self.picker = None;
                self.input_mode = InputMode::Normal;
                if let (Some(user_id), Some(i)) = (choice, self.selected_index()) {
                    let card = &mut self.cards[i];
                    let _ = match kind {
                        PickKind::Assign => card.assign(&self.backend, user_id, &mut self.inbox).await,
                        PickKind::Unassign => {
                            card.unassign(&self.backend, user_id, &mut self.inbox).await
                        }
                    };
                    self.after_mutation().await;
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.picker = None;
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }
}
