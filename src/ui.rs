use crate::api::ChecklistBackend;
use crate::app::{App, EditField, InputMode, PickKind};
use crate::card::{CardMode, TaskCard, TaskDraft};
use crate::feedback::Level;
use crate::models::{Priority, Task, User};
use crate::permission::Capability;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

// Share of a terminal dimension, computed wide enough not to overflow
fn percent_of(length: u16, percent: u16) -> u16 {
    (u32::from(length) * u32::from(percent) / 100) as u16
}

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(action),
    ]
}

fn get_legend(input_mode: &InputMode, card_mode: Option<&CardMode>) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match (card_mode, input_mode) {
        (Some(CardMode::Editing(_)), _) => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" ←/→ ", ": Change Value "),
            key_hint(" Enter ", ": Save "),
            key_hint(" Esc ", ": Cancel "),
        ],
        (Some(CardMode::ConfirmingDelete), _) => vec![
            key_hint(" y ", ": Delete "),
            key_hint(" n ", ": Keep "),
        ],
        (_, InputMode::Normal) => vec![
            key_hint(" q ", ": Quit "),
            key_hint(" j/k ", ": Move "),
            key_hint(" Space ", ": Toggle Done "),
            key_hint(" a ", ": Add "),
            key_hint(" e ", ": Edit "),
            key_hint(" d ", ": Delete "),
            key_hint(" s ", ": Assign "),
            key_hint(" u ", ": Unassign "),
            key_hint(" r ", ": Refresh "),
            key_hint(" t ", ": Hide/Show Done "),
        ],
        (_, InputMode::Adding) => vec![
            key_hint(" i ", ": Insert "),
            key_hint(" Enter ", ": Submit "),
            key_hint(" Esc ", ": Cancel "),
        ],
        (_, InputMode::Insert) => vec![
            key_hint(" Enter ", ": Submit "),
            key_hint(" Esc ", ": Stop Typing "),
        ],
        (_, InputMode::Picking) => vec![
            key_hint(" j/k ", ": Move "),
            key_hint(" Enter ", ": Choose "),
            key_hint(" Esc ", ": Cancel "),
        ],
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Gray,
        Priority::Medium => Color::Blue,
        Priority::High => Color::Yellow,
        Priority::Urgent => Color::Red,
    }
}

fn task_row(card: &TaskCard, actor: Option<&User>) -> ListItem<'static> {
    let task = card.task();
    let marker = if card.display_completed() {
        "[x] "
    } else {
        "[ ] "
    };
    let marker_style = match card.capability(actor) {
        Capability::Interactive => Style::default().fg(Color::Green),
        Capability::ReadOnly => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
    };
    let title_style = if card.display_completed() {
        Style::default().add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(marker, marker_style),
        Span::styled(
            format!("{:<7}", task.priority.as_str()),
            Style::default().fg(priority_color(task.priority)),
        ),
        Span::styled(task.title.clone(), title_style),
    ];
    if task.is_assigned() {
        let names: Vec<String> = task.assignments.iter().map(|a| a.display_name()).collect();
        spans.push(Span::styled(
            format!("  @{}", names.join(", @")),
            Style::default().fg(Color::Cyan),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(text, Style::default().add_modifier(Modifier::BOLD))
}

fn detail_lines(card: &TaskCard, actor: Option<&User>) -> Vec<Line<'static>> {
    let task: &Task = card.task();
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(vec![label("Title: "), Span::raw(task.title.clone())]));
    lines.push(Line::from(vec![
        label("Priority: "),
        Span::styled(
            task.priority.to_string(),
            Style::default().fg(priority_color(task.priority)),
        ),
    ]));
    lines.push(Line::from(vec![
        label("Category: "),
        Span::raw(task.category.to_string()),
    ]));

    let status = if card.display_completed() {
        "Done"
    } else {
        "Open"
    };
    let access = match card.capability(actor) {
        Capability::Interactive => "",
        Capability::ReadOnly => " (read only)",
    };
    lines.push(Line::from(vec![
        label("Status: "),
        Span::raw(format!("{}{}", status, access)),
    ]));

    lines.push(Line::from(vec![label("Assigned to: ")]));
    if task.is_assigned() {
        for assignment in &task.assignments {
            let mut text = format!("  - {}", assignment.display_name());
            if let Some(notes) = &assignment.notes {
                text.push_str(&format!(" ({})", notes));
            }
            lines.push(Line::from(Span::raw(text)));
        }
    } else {
        lines.push(Line::from(Span::raw("  Anyone on the trip")));
    }

    // completion history only means something for shared tasks
    if !task.is_assigned() && !task.completions.is_empty() {
        lines.push(Line::from(vec![label("Completed by: ")]));
        for completion in &task.completions {
            let who = completion
                .completed_by_username
                .clone()
                .unwrap_or_else(|| format!("User #{}", completion.completed_by));
            let when = completion
                .completed_at
                .map(|at| at.format(" on %Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            lines.push(Line::from(Span::raw(format!("  - {}{}", who, when))));
        }
    }

    if let Some(creator) = &task.created_by {
        lines.push(Line::from(vec![
            label("Created by: "),
            Span::raw(creator.username.clone()),
        ]));
    }
    if let Some(created_at) = task.created_at {
        lines.push(Line::from(vec![
            label("Created: "),
            Span::raw(created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]));
    }

    lines.push(Line::from(vec![label("Description: ")]));
    match &task.description {
        Some(desc) if !desc.trim().is_empty() => {
            for line in desc.lines() {
                lines.push(Line::from(Span::raw(line.to_string())));
            }
        }
        _ => lines.push(Line::from(Span::raw("No description".to_string()))),
    }
    lines
}

fn render_edit_form(f: &mut Frame, draft: &TaskDraft, active: EditField, area: Rect) {
    let popup_area = centered_rect_absolute(percent_of(area.width, 60), 12, area);
    let field_style = |field: EditField| {
        if field == active {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Title: ", field_style(EditField::Title)),
            Span::raw(draft.title.clone()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Description: ", field_style(EditField::Description)),
            Span::raw(draft.description.clone()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Priority: ", field_style(EditField::Priority)),
            Span::raw(format!("< {} >", draft.priority)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Category: ", field_style(EditField::Category)),
            Span::raw(format!("< {} >", draft.category)),
        ]),
    ];

    let form = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Edit Task (Enter to Save)")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(form, popup_area);
}

fn render_confirm_delete(f: &mut Frame, task: &Task, area: Rect) {
    let popup_area = centered_rect_absolute(percent_of(area.width, 50), 5, area);
    let text = Paragraph::new(vec![
        Line::from(format!("Delete \"{}\"?", task.title)),
        Line::from("This cannot be undone. (y/n)"),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Red)),
    );
    f.render_widget(Clear, popup_area);
    f.render_widget(text, popup_area);
}

fn render_add_popup(f: &mut Frame, title: &str, insert: bool, area: Rect) {
    let popup_width = percent_of(area.width, 60).saturating_sub(2);
    let lines_required = calculate_wrapped_lines(title, popup_width);
    let required_height = std::cmp::max(lines_required as u16, 1);
    let popup_height = std::cmp::min(required_height + 2, area.height.saturating_sub(2));
    let popup_area = centered_rect_absolute(popup_width + 2, popup_height, area);

    let heading = if insert {
        "New Task: title !priority #category"
    } else {
        "New Task (i to type, Enter to Submit)"
    };
    let input = Paragraph::new(title.to_string())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(heading)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw<C: ChecklistBackend>(f: &mut Frame, app: &mut App<C>) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(size);
    let body_chunk = chunks[0];
    let footer_chunk = chunks[1];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(body_chunk);

    let list_title = match (&app.current_user, app.hide_completed) {
        (Some(user), false) => format!("Trip #{} Checklist ({})", app.trip_id, user.username),
        (Some(user), true) => format!("Trip #{} Open Tasks ({})", app.trip_id, user.username),
        (None, _) => format!("Trip #{} Checklist (not logged in)", app.trip_id),
    };

    let visible = app.visible();
    let actor = app.current_user.as_ref();

    // Left panel: checklist
    let tasks_widget = if !visible.is_empty() {
        let rows: Vec<ListItem> = visible
            .iter()
            .map(|&i| task_row(&app.cards[i], actor))
            .collect();
        List::new(rows)
            .block(Block::default().borders(Borders::ALL).title(list_title))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ")
    } else {
        List::new(vec![ListItem::new("No tasks on this checklist")])
            .block(Block::default().borders(Borders::ALL).title(list_title))
    };
    f.render_stateful_widget(tasks_widget, columns[0], &mut app.state);

    // Right panel: details
    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");
    let selected = app.selected_index().map(|i| &app.cards[i]);
    let paragraph = match selected {
        Some(card) => Paragraph::new(detail_lines(card, app.current_user.as_ref())),
        None => Paragraph::new("Select a task to see its details"),
    };
    f.render_widget(
        paragraph.block(detail_block).wrap(Wrap { trim: true }),
        columns[1],
    );

    let card_mode = selected.map(|card| card.mode());
    match card_mode {
        Some(CardMode::Editing(draft)) => {
            render_edit_form(f, draft, app.active_field, body_chunk)
        }
        Some(CardMode::ConfirmingDelete) => {
            if let Some(card) = selected {
                render_confirm_delete(f, card.task(), body_chunk)
            }
        }
        _ => match app.input_mode {
            InputMode::Adding | InputMode::Insert => render_add_popup(
                f,
                &app.new_task_title,
                app.input_mode == InputMode::Insert,
                body_chunk,
            ),
            InputMode::Picking => {
                if let Some(picker) = app.picker.as_mut() {
                    let title = match picker.kind {
                        PickKind::Assign => "Assign Member",
                        PickKind::Unassign => "Unassign Member",
                    };
                    let height = (picker.options.len() as u16 + 2).min(body_chunk.height);
                    let popup_area =
                        centered_rect_absolute(percent_of(body_chunk.width, 40), height, body_chunk);
                    let items: Vec<ListItem> = picker
                        .options
                        .iter()
                        .map(|(_, name)| ListItem::new(name.clone()))
                        .collect();
                    let list = List::new(items)
                        .block(
                            Block::default()
                                .title(title)
                                .borders(Borders::ALL)
                                .style(Style::default().fg(Color::Cyan)),
                        )
                        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                        .highlight_symbol(">> ");
                    f.render_widget(Clear, popup_area);
                    f.render_stateful_widget(list, popup_area, &mut picker.state);
                }
            }
            InputMode::Normal => {}
        },
    }

    // Footer: latest notification above the legend
    let footer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(footer_chunk);

    if let Some(toast) = app.inbox.latest() {
        let color = match toast.level {
            Level::Success => Color::Green,
            Level::Error => Color::Red,
        };
        f.render_widget(
            Paragraph::new(toast.message.clone()).style(Style::default().fg(color)),
            footer[0],
        );
    }

    let legend = Paragraph::new(get_legend(&app.input_mode, card_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, footer[1]);
}

pub async fn run_app<B: Backend, C: ChecklistBackend>(
    terminal: &mut Terminal<B>,
    mut app: App<C>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = app.handle_input(key).await?;
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}

fn calculate_wrapped_lines(text: &str, max_width: u16) -> usize {
    let max_width = max_width.max(1);
    let mut line_count = 0;
    for line in text.lines() {
        let line_width = line.chars().count() as u16;
        line_count += line_width.div_ceil(max_width) as usize;
    }
    line_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::tests::task_with_assignees;
    use ratatui::backend::TestBackend;

    fn row_text(item_line: &Line) -> String {
        item_line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrapped_lines() {
        assert_eq!(calculate_wrapped_lines("", 10), 0);
        assert_eq!(calculate_wrapped_lines("abcdefghij", 10), 1);
        assert_eq!(calculate_wrapped_lines("abcdefghijk", 10), 2);
        assert_eq!(calculate_wrapped_lines("abc\nde", 10), 2);
    }

    #[test]
    fn test_percent_of_wide_terminals() {
        assert_eq!(percent_of(100, 60), 60);
        assert_eq!(percent_of(2000, 60), 1200);
        assert_eq!(percent_of(u16::MAX, 50), u16::MAX / 2);
    }

    #[test]
    fn test_draw_popups_on_wide_terminal() {
        let backend = crate::card::tests::FakeBackend::default();
        let mut app = App::new(backend, 5);
        app.cards = vec![TaskCard::new(task_with_assignees(1, &[]))];
        app.state.select(Some(0));
        app.cards[0].begin_edit();

        let mut terminal = Terminal::new(TestBackend::new(2000, 30)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Edit Task (Enter to Save)"));
    }

    #[test]
    fn test_detail_lines_mark_read_only_tasks() {
        let card = TaskCard::new(task_with_assignees(2, &[7]));
        let viewer = User {
            id: 9,
            username: "viewer".to_string(),
            email: String::new(),
        };
        let lines: Vec<String> = detail_lines(&card, Some(&viewer))
            .iter()
            .map(row_text)
            .collect();

        assert!(lines.contains(&"Status: Open (read only)".to_string()));
        assert!(lines.contains(&"  - User #7".to_string()));
    }

    #[test]
    fn test_draw_renders_checklist() {
        let backend = crate::card::tests::FakeBackend::default();
        let mut app = App::new(backend, 5);
        app.cards = vec![TaskCard::new(task_with_assignees(1, &[]))];
        app.state.select(Some(0));

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Trip #5 Checklist (not logged in)"));
        assert!(content.contains("[ ] medium Task 1"));
    }
}
