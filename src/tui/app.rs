//! Main application logic for the calendar interface.
//!
//! A single scrolling feed of day cells, each listing the day's resolved
//! occurrences with their computed colours. Keyboard bindings cover the
//! same mutations the CLI exposes: completion toggles, in-day reordering,
//! rescheduling to neighbouring days, creation, and deletion.

use chrono::{Duration, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::color::day_styles;
use crate::error::Result;
use crate::feed::{DayFeed, JumpDirection};
use crate::occurrence::{occurrences_on_day, Occurrence, Role};
use crate::ordering;
use crate::store::{NewTask, Store};
use crate::task::{Task, TaskPatch};
use crate::tui::colors::{DAY_HEADER, SELECTION_BG, STATUS, TODAY_ACCENT};
use crate::tui::input::InputField;

/// Interaction mode: browsing the feed, typing a new task title, or
/// confirming a deletion.
enum Mode {
    Browse,
    NewTask(InputField),
    ConfirmDelete(u64),
}

/// State for the scrolling calendar.
pub struct CalendarApp {
    store: Store,
    snapshot: Vec<Task>,
    today: NaiveDate,
    feed: DayFeed,
    viewport_top: usize,
    days_visible: usize,
    selected_day: usize,
    selected_occurrence: usize,
    mode: Mode,
    status_message: String,
    should_quit: bool,
}

impl CalendarApp {
    pub fn new(store: Store) -> Self {
        let today = Local::now().date_naive();
        let feed = DayFeed::new(today);
        let selected_day = feed.index_of(today).unwrap_or(0);
        let snapshot = store.snapshot();
        CalendarApp {
            store,
            snapshot,
            today,
            feed,
            viewport_top: selected_day,
            days_visible: 1,
            selected_day,
            selected_occurrence: 0,
            mode: Mode::Browse,
            status_message: String::new(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Re-read the store snapshot after a write, the way a live
    /// subscription would push a fresh one, and clamp the selection.
    fn refresh(&mut self) {
        self.snapshot = self.store.snapshot();
        let count = self.selected_occurrences().len();
        if self.selected_occurrence >= count {
            self.selected_occurrence = count.saturating_sub(1);
        }
    }

    fn selected_date(&self) -> NaiveDate {
        self.feed
            .date_at(self.selected_day)
            .unwrap_or(self.today)
    }

    fn selected_occurrences(&self) -> Vec<Occurrence<'_>> {
        occurrences_on_day(&self.snapshot, self.selected_date())
    }

    fn selected_task(&self) -> Option<(u64, Role)> {
        self.selected_occurrences()
            .get(self.selected_occurrence)
            .map(|o| (o.task.id, o.role))
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::NewTask(_) => self.handle_new_task_key(key),
            Mode::ConfirmDelete(_) => self.handle_confirm_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        self.status_message.clear();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::PageDown | KeyCode::Char('J') => self.select_day(1),
            KeyCode::PageUp | KeyCode::Char('K') => self.select_day(-1),
            KeyCode::Char('t') => self.jump_to_today(),
            KeyCode::Char('g') => {
                self.selected_day = 0;
                self.selected_occurrence = 0;
            }
            KeyCode::Char('G') => {
                self.selected_day = self.feed.len() - 1;
                self.selected_occurrence = 0;
            }
            KeyCode::Char(' ') => self.report(Self::toggle_selected),
            KeyCode::Char(']') => self.report(|app| app.reorder_selected(1)),
            KeyCode::Char('[') => self.report(|app| app.reorder_selected(-1)),
            KeyCode::Char('>') => self.report(|app| app.move_selected(1)),
            KeyCode::Char('<') => self.report(|app| app.move_selected(-1)),
            KeyCode::Char('n') => self.mode = Mode::NewTask(InputField::new()),
            KeyCode::Char('d') => {
                if let Some((id, _)) = self.selected_task() {
                    self.mode = Mode::ConfirmDelete(id);
                }
            }
            _ => {}
        }
        self.ensure_selection_visible();
        self.maybe_extend_feed();
    }

    fn handle_new_task_key(&mut self, key: KeyEvent) {
        let Mode::NewTask(ref mut input) = self.mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => {
                let title = input.take();
                self.mode = Mode::Browse;
                self.report(|app| app.create_task(title));
            }
            KeyCode::Backspace => input.handle_backspace(),
            KeyCode::Left => input.move_cursor_left(),
            KeyCode::Right => input.move_cursor_right(),
            KeyCode::Char(c) => input.handle_char(c),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Mode::ConfirmDelete(id) = self.mode else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.report(|app| {
                    app.store.delete_task(id)?;
                    app.refresh();
                    app.status_message = format!("Deleted task {id}");
                    Ok(())
                });
            }
            KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::Browse,
            _ => {}
        }
    }

    /// Run a mutation and surface any failure on the status line; the
    /// next snapshot read reconciles whatever state the write reached.
    fn report(&mut self, op: impl FnOnce(&mut Self) -> Result<()>) {
        if let Err(e) = op(self) {
            self.status_message = e.to_string();
        }
    }

    fn select_next(&mut self) {
        let count = self.selected_occurrences().len();
        if self.selected_occurrence + 1 < count {
            self.selected_occurrence += 1;
        } else {
            self.select_day(1);
        }
    }

    fn select_prev(&mut self) {
        if self.selected_occurrence > 0 {
            self.selected_occurrence -= 1;
        } else {
            self.select_day(-1);
        }
    }

    fn select_day(&mut self, delta: i64) {
        let last = self.feed.len() - 1;
        let next = self.selected_day as i64 + delta;
        self.selected_day = next.clamp(0, last as i64) as usize;
        self.selected_occurrence = 0;
    }

    fn jump_to_today(&mut self) {
        if let Some(index) = self.feed.index_of(self.today) {
            self.selected_day = index;
            self.selected_occurrence = 0;
            self.viewport_top = index;
        }
    }

    fn ensure_selection_visible(&mut self) {
        if self.selected_day < self.viewport_top {
            self.viewport_top = self.selected_day;
        } else if self.selected_day >= self.viewport_top + self.days_visible {
            self.viewport_top = self.selected_day + 1 - self.days_visible.max(1);
        }
    }

    /// Grow the feed when the viewport nears its end. The single-flight
    /// guard in the feed absorbs repeated triggers from one event burst;
    /// the append itself completes synchronously on this thread.
    fn maybe_extend_feed(&mut self) {
        let shown = self.viewport_top + self.days_visible;
        let rows_below = self.feed.len().saturating_sub(shown);
        if self.feed.on_scroll(rows_below) {
            self.feed.complete_append();
        }
    }

    fn toggle_selected(&mut self) -> Result<()> {
        let day = self.selected_date();
        let (id, due, done) = {
            let occurrences = self.selected_occurrences();
            let Some(occ) = occurrences.get(self.selected_occurrence) else {
                return Ok(());
            };
            (occ.task.id, occ.task.due_date, !occ.completed_on(day))
        };
        let mut patch = TaskPatch::default();
        if day == due {
            patch.completed = Some(done);
        } else {
            patch.daily_completed.insert(day, done);
        }
        self.store.update_task(id, &patch)?;
        self.refresh();
        Ok(())
    }

    fn reorder_selected(&mut self, delta: i64) -> Result<()> {
        let day = self.selected_date();
        let Some((id, _)) = self.selected_task() else {
            return Ok(());
        };
        let Some(task) = self.snapshot.iter().find(|t| t.id == id) else {
            return Ok(());
        };
        if task.due_date != day {
            self.status_message = "Only due-day items can be reordered here".into();
            return Ok(());
        }
        let list = ordering::day_list(&self.snapshot, day);
        let Some(from) = list.iter().position(|t| t.id == id) else {
            return Ok(());
        };
        // Drop-slot arithmetic: landing one below means dropping after
        // the next item (index from + 2); one above drops at from - 1.
        let to = if delta > 0 {
            if from + 1 >= list.len() {
                return Ok(());
            }
            from + 2
        } else {
            if from == 0 {
                return Ok(());
            }
            from - 1
        };
        let batch = ordering::reorder_within_day(&self.snapshot, id, from, to)?;
        self.store.apply_order_batch(&batch)?;
        self.refresh();
        let pos = self
            .selected_occurrences()
            .iter()
            .position(|o| o.task.id == id);
        if let Some(pos) = pos {
            self.selected_occurrence = pos;
        }
        Ok(())
    }

    fn move_selected(&mut self, delta_days: i64) -> Result<()> {
        let day = self.selected_date();
        let Some((id, _)) = self.selected_task() else {
            return Ok(());
        };
        let Some(task) = self.snapshot.iter().find(|t| t.id == id) else {
            return Ok(());
        };
        if task.due_date != day {
            self.status_message = "Previews move with their anchor task".into();
            return Ok(());
        }
        let target = day + Duration::days(delta_days);
        let batch = ordering::drop_on_day(&self.snapshot, id, target)?;
        self.store.apply_order_batch(&batch)?;
        self.refresh();
        Ok(())
    }

    fn create_task(&mut self, title: String) -> Result<()> {
        // Empty titles never reach the store; the create is simply not
        // issued.
        if title.trim().is_empty() {
            return Ok(());
        }
        let due = self.selected_date();
        let id = self.store.create_task(NewTask {
            title,
            notes: None,
            due_date: due,
            start_date: None,
            repeat_weekly: false,
            repeat_until: None,
        })?;
        self.refresh();
        if let Some(index) = self.feed.reveal(due) {
            self.selected_day = index;
            self.ensure_selection_visible();
        }
        self.status_message = format!("Added task {id}");
        Ok(())
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());

        let height = chunks[0].height as usize;
        let mut lines: Vec<Line> = Vec::new();
        let mut days_rendered = 0;
        let mut day_index = self.viewport_top;
        while lines.len() < height {
            let Some(date) = self.feed.date_at(day_index) else {
                break;
            };
            let occurrences = occurrences_on_day(&self.snapshot, date);
            let needed = 1 + occurrences.len().max(1);
            if !lines.is_empty() && lines.len() + needed > height {
                break;
            }
            self.render_day(&mut lines, date, &occurrences, day_index);
            days_rendered += 1;
            day_index += 1;
        }
        self.days_visible = days_rendered.max(1);
        frame.render_widget(Paragraph::new(lines), chunks[0]);
        frame.render_widget(self.status_line(), chunks[1]);
    }

    fn render_day(
        &self,
        lines: &mut Vec<Line>,
        date: NaiveDate,
        occurrences: &[Occurrence<'_>],
        day_index: usize,
    ) {
        let header_style = if date == self.today {
            Style::default().fg(TODAY_ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DAY_HEADER)
        };
        let marker = if date == self.today { "  <- today" } else { "" };
        lines.push(Line::styled(
            format!("-- {}{marker}", date.format("%a %d %b %Y")),
            header_style,
        ));

        if occurrences.is_empty() {
            lines.push(Line::styled("     (no tasks)", Style::default().fg(DAY_HEADER)));
            return;
        }

        let styles = day_styles(occurrences, date);
        for (i, (occ, style)) in occurrences.iter().zip(&styles).enumerate() {
            let selected = day_index == self.selected_day && i == self.selected_occurrence;
            let check = if occ.completed_on(date) { "x" } else { " " };
            let role = match occ.role {
                Role::DueDay => "",
                Role::LeadUp => "  (preview)",
                Role::RepeatOccurrence => "  (weekly)",
            };
            let mut text_style = Style::default().fg(style.border()).bg(style.background());
            if selected {
                text_style = text_style.bg(SELECTION_BG).add_modifier(Modifier::BOLD);
            }
            // Previews below 60% opacity dim instead of recolouring; the
            // terminal has no real alpha channel.
            if style.fade < 60 {
                text_style = text_style.add_modifier(Modifier::DIM);
            }
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled(format!("[{check}] {}{role}", occ.task.title), text_style),
            ]));
        }
    }

    fn status_line(&self) -> Paragraph<'_> {
        let text = match &self.mode {
            Mode::NewTask(input) => format!("New task on {}: {}_", self.selected_date(), input.value),
            Mode::ConfirmDelete(id) => format!("Delete task {id}? (y/n)"),
            Mode::Browse => {
                let today = match self.feed.today_indicator(
                    self.today,
                    self.viewport_top,
                    self.days_visible,
                ) {
                    Some(JumpDirection::Up) => "[t ^ today]  ",
                    Some(JumpDirection::Down) => "[t v today]  ",
                    None => "",
                };
                if self.status_message.is_empty() {
                    format!(
                        "{today}j/k select  J/K day  space done  [/] reorder  </> move  n new  d delete  q quit"
                    )
                } else {
                    format!("{today}{}", self.status_message)
                }
            }
        };
        Paragraph::new(Line::styled(text, Style::default().fg(STATUS)))
    }
}
