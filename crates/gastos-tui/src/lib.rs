// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use gastos_app::{AppCommand, AppMode, AppState, FormKind, Item, ItemDraft, ItemId};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const UNIT_SUFFIX: &str = "kg/u";
const CHEVRON_EXPANDED: &str = "▾";
const CHEVRON_COLLAPSED: &str = "▸";
const FORM_FIELD_LABELS: [&str; 3] = ["producto", "cantidad", "precio"];

/// Seam between the UI and the item store. `gastos-cli` implements it over
/// the real store; tests substitute an in-memory fake.
pub trait AppRuntime {
    fn list_items(&mut self) -> Result<Vec<Item>>;
    fn add_item(&mut self, draft: &ItemDraft) -> Result<ItemId>;
    /// Copies the matching item into the edit slot and returns the copy, or
    /// `None` when no item matches.
    fn begin_edit(&mut self, id: ItemId) -> Result<Option<Item>>;
    /// Applies the draft to the edit slot and commits. Returns `false` when
    /// no edit was in progress (the list stays untouched).
    fn commit_edit(&mut self, draft: &ItemDraft) -> Result<bool>;
    fn cancel_edit(&mut self) -> Result<()>;
    fn delete_item(&mut self, id: ItemId) -> Result<()>;
    fn toggle_expanded(&mut self, id: ItemId) -> Result<()>;
    fn toggle_expand_all(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormUiState {
    kind: FormKind,
    field_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    items: Vec<Item>,
    cursor: usize,
    /// The persistent "new item" draft; survives opening and closing the
    /// add form so half-typed entries are not lost.
    draft: ItemDraft,
    /// Scratch fields for the item being edited; disjoint from `draft`.
    edit_draft: ItemDraft,
    form: Option<FormUiState>,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(state: &mut AppState, view_data: &ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn refresh_view_data<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    view_data.items = runtime.list_items()?;
    clamp_cursor(view_data);
    Ok(())
}

fn clamp_cursor(view_data: &mut ViewData) {
    if view_data.items.is_empty() {
        view_data.cursor = 0;
    } else if view_data.cursor >= view_data.items.len() {
        view_data.cursor = view_data.items.len() - 1;
    }
}

fn item_under_cursor(view_data: &ViewData) -> Option<&Item> {
    view_data.items.get(view_data.cursor)
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode {
        AppMode::Form(kind) => {
            handle_form_key(state, runtime, view_data, internal_tx, kind, key);
        }
        AppMode::Nav => {
            handle_nav_key(state, runtime, view_data, internal_tx, key);
        }
    }
    false
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if !view_data.items.is_empty() {
                view_data.cursor = (view_data.cursor + 1).min(view_data.items.len() - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
        }
        KeyCode::Char('g') => {
            view_data.cursor = 0;
        }
        KeyCode::Char('G') => {
            if !view_data.items.is_empty() {
                view_data.cursor = view_data.items.len() - 1;
            }
        }
        KeyCode::Char('a') => {
            state.dispatch(AppCommand::OpenForm(FormKind::Add));
            view_data.form = Some(FormUiState {
                kind: FormKind::Add,
                field_index: 0,
            });
        }
        KeyCode::Char('e') => {
            let Some(id) = item_under_cursor(view_data).map(|item| item.id) else {
                emit_status(state, view_data, internal_tx, "nothing to edit");
                return;
            };
            match runtime.begin_edit(id) {
                Ok(Some(selected)) => {
                    view_data.edit_draft = ItemDraft::from_item(&selected);
                    state.dispatch(AppCommand::OpenForm(FormKind::Edit));
                    view_data.form = Some(FormUiState {
                        kind: FormKind::Edit,
                        field_index: 0,
                    });
                }
                Ok(None) => {
                    emit_status(state, view_data, internal_tx, "item not found");
                }
                Err(error) => {
                    emit_status(state, view_data, internal_tx, format!("edit failed: {error}"));
                }
            }
        }
        KeyCode::Char('d') => {
            let Some(item) = item_under_cursor(view_data) else {
                emit_status(state, view_data, internal_tx, "nothing to delete");
                return;
            };
            let (id, name) = (item.id, item.name.clone());
            if let Err(error) = runtime.delete_item(id) {
                emit_status(state, view_data, internal_tx, format!("delete failed: {error}"));
                return;
            }
            if let Err(error) = refresh_view_data(runtime, view_data) {
                emit_status(state, view_data, internal_tx, format!("reload failed: {error}"));
                return;
            }
            emit_status(state, view_data, internal_tx, format!("deleted {name}"));
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            let Some(id) = item_under_cursor(view_data).map(|item| item.id) else {
                return;
            };
            if let Err(error) = runtime.toggle_expanded(id) {
                emit_status(state, view_data, internal_tx, format!("toggle failed: {error}"));
                return;
            }
            if let Err(error) = refresh_view_data(runtime, view_data) {
                emit_status(state, view_data, internal_tx, format!("reload failed: {error}"));
            }
        }
        KeyCode::Char('E') => {
            if let Err(error) = runtime.toggle_expand_all() {
                emit_status(state, view_data, internal_tx, format!("toggle failed: {error}"));
                return;
            }
            if let Err(error) = refresh_view_data(runtime, view_data) {
                emit_status(state, view_data, internal_tx, format!("reload failed: {error}"));
                return;
            }
            let label = if view_data.items.iter().all(|item| item.expanded) {
                "todos expandidos"
            } else {
                "todos comprimidos"
            };
            emit_status(state, view_data, internal_tx, label);
        }
        KeyCode::Char('?') => {
            view_data.help_visible = true;
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FormKind,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            if kind == FormKind::Edit
                && let Err(error) = runtime.cancel_edit()
            {
                emit_status(state, view_data, internal_tx, format!("cancel failed: {error}"));
            }
            view_data.form = None;
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Tab | KeyCode::Down => move_form_field(view_data, 1),
        KeyCode::BackTab | KeyCode::Up => move_form_field(view_data, -1),
        KeyCode::Enter => submit_form(state, runtime, view_data, internal_tx, kind),
        KeyCode::Backspace => {
            let field_index = view_data.form.map_or(0, |form| form.field_index);
            form_field_mut(view_data, kind, field_index).pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let field_index = view_data.form.map_or(0, |form| form.field_index);
            form_field_mut(view_data, kind, field_index).push(c);
        }
        _ => {}
    }
}

fn move_form_field(view_data: &mut ViewData, delta: isize) {
    let Some(mut form) = view_data.form else {
        return;
    };
    let len = FORM_FIELD_LABELS.len() as isize;
    form.field_index = (form.field_index as isize + delta).rem_euclid(len) as usize;
    view_data.form = Some(form);
}

fn active_draft(view_data: &ViewData, kind: FormKind) -> &ItemDraft {
    match kind {
        FormKind::Add => &view_data.draft,
        FormKind::Edit => &view_data.edit_draft,
    }
}

fn form_field_mut(view_data: &mut ViewData, kind: FormKind, field_index: usize) -> &mut String {
    let draft = match kind {
        FormKind::Add => &mut view_data.draft,
        FormKind::Edit => &mut view_data.edit_draft,
    };
    match field_index {
        0 => &mut draft.name,
        1 => &mut draft.quantity,
        _ => &mut draft.price,
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FormKind,
) {
    let outcome = match kind {
        FormKind::Add => runtime
            .add_item(&view_data.draft.clone())
            .map(|_| "item agregado"),
        FormKind::Edit => match runtime.commit_edit(&view_data.edit_draft.clone()) {
            Ok(true) => Ok("item actualizado"),
            Ok(false) => Ok("no item selected"),
            Err(error) => Err(error),
        },
    };

    match outcome {
        Ok(message) => {
            if kind == FormKind::Add {
                view_data.draft = ItemDraft::blank();
            } else {
                view_data.edit_draft = ItemDraft::blank();
            }
            view_data.form = None;
            state.dispatch(AppCommand::ExitToNav);
            if let Err(error) = refresh_view_data(runtime, view_data) {
                emit_status(state, view_data, internal_tx, format!("reload failed: {error}"));
                return;
            }
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("save failed: {error}"));
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(view_data))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title("control de gastos")
                .borders(Borders::ALL),
        );
    frame.render_widget(header, layout[0]);

    render_item_table(frame, layout[1], view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let (AppMode::Form(kind), Some(form)) = (state.mode, view_data.form) {
        let area = centered_rect(52, 38, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(form_overlay_text(view_data, kind, form.field_index)).block(
            Block::default()
                .title(kind.label())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_item_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let header = Row::new([
        Cell::from(""),
        Cell::from("producto"),
        Cell::from("total"),
        Cell::from("%"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view_data
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| item_row(item, &view_data.items, index == view_data.cursor))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn item_row<'a>(item: &Item, items: &[Item], selected: bool) -> Row<'a> {
    let chevron = if item.expanded {
        CHEVRON_EXPANDED
    } else {
        CHEVRON_COLLAPSED
    };

    let name = if item.expanded {
        format!("{}\n  {}", item.name, expanded_detail(item))
    } else {
        item.name.clone()
    };

    let row = Row::new([
        Cell::from(chevron.to_owned()),
        Cell::from(name),
        Cell::from(format!("${}", gastos_app::line_total(item))),
        Cell::from(gastos_app::percentage(item.price * item.quantity, items)),
    ]);
    let row = if item.expanded { row.height(2) } else { row };

    if selected {
        row.style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        row
    }
}

/// Detail line for an expanded card. Zero amounts show as `-`, the unset
/// convention.
fn expanded_detail(item: &Item) -> String {
    format!(
        "cantidad: {} {UNIT_SUFFIX} · precio: ${}",
        format_amount(item.quantity),
        format_amount(item.price),
    )
}

fn format_amount(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "-".to_owned();
    }
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn header_text(view_data: &ViewData) -> String {
    format!(
        "{} items · total: ${}",
        view_data.items.len(),
        gastos_app::format_total(&view_data.items),
    )
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(status) = &state.status_line {
        return status.clone();
    }
    match state.mode {
        AppMode::Form(_) => "tab: next field · enter: save · esc: cancel".to_owned(),
        AppMode::Nav if view_data.items.is_empty() => {
            "a: add your first item · ?: help".to_owned()
        }
        AppMode::Nav => "a: add · e: edit · d: delete · space: expand · ?: help".to_owned(),
    }
}

fn form_overlay_text(view_data: &ViewData, kind: FormKind, field_index: usize) -> String {
    let draft = active_draft(view_data, kind);
    let values = [&draft.name, &draft.quantity, &draft.price];
    let mut lines: Vec<String> = FORM_FIELD_LABELS
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (label, value))| {
            let marker = if index == field_index { ">" } else { " " };
            format!("{marker} {label:<9} {value}")
        })
        .collect();
    lines.push(String::new());
    lines.push("enter: save · tab: next · esc: cancel".to_owned());
    lines.join("\n")
}

fn help_overlay_text() -> String {
    [
        "j/k, arrows  move",
        "g/G          first/last item",
        "a            add item",
        "e            edit item",
        "d            delete item",
        "space/enter  expand/collapse",
        "E            expand/collapse all",
        "?            this help",
        "ctrl-q       quit",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
