//! Roadmap board interface.
//!
//! Stages run down the board and the eight quarters across it, each cell
//! listing the items scheduled there. Items can be moved between cells for
//! what-if planning; moves only change the in-memory dataset and a reload
//! from disk discards them.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::cmd::truncate;
use crate::fields::{Priority, Quarter, QuarterSlot, Stage};
use crate::priority::score;
use crate::schedule::{ItemSource, ScheduledItem};
use crate::store::RoadmapStore;
use crate::tui::colors::{priority_color, stage_color, CURRENT_QUARTER};

const STAGES: usize = Stage::ALL.len();
const QUARTERS: usize = Quarter::ALL.len();
/// Width of the stage label column.
const LABEL_WIDTH: u16 = 16;

/// Main board application state
pub struct BoardApp {
    store: RoadmapStore,
    /// Visible items per cell, indexed `stage * QUARTERS + quarter`.
    cells: Vec<Vec<ScheduledItem>>,
    selected_stage: usize,
    selected_quarter: usize,
    selected_card: usize,
    scroll_offset: usize, // For the selected cell only
    status_message: String,
    show_detail: bool,
    filter_active: bool,
    filter_text: String,
    priority_filter: Option<Priority>,
    /// Company view; `None` shows every company.
    company_filter: Option<String>,
    current_quarter: Option<Quarter>,
    overrides: usize,
}

impl BoardApp {
    pub fn new(store: RoadmapStore) -> Self {
        let current_quarter = Quarter::containing(Local::now().date_naive());
        let mut app = BoardApp {
            store,
            cells: vec![Vec::new(); STAGES * QUARTERS],
            selected_stage: 0,
            selected_quarter: current_quarter.map_or(0, Quarter::index),
            selected_card: 0,
            scroll_offset: 0,
            status_message: String::new(),
            show_detail: false,
            filter_active: false,
            filter_text: String::new(),
            priority_filter: None,
            company_filter: None,
            current_quarter,
            overrides: 0,
        };
        app.update_cells();
        app
    }

    fn cell(&self, stage: usize, quarter: usize) -> &[ScheduledItem] {
        &self.cells[stage * QUARTERS + quarter]
    }

    fn selected_cell(&self) -> &[ScheduledItem] {
        self.cell(self.selected_stage, self.selected_quarter)
    }

    fn selected_item(&self) -> Option<&ScheduledItem> {
        self.selected_cell().get(self.selected_card)
    }

    fn visible_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Rebuild the grid from the dataset and apply the filters.
    fn update_cells(&mut self) {
        let grid = self.store.dataset().schedule();
        let needle = self.filter_text.to_lowercase();

        self.cells = vec![Vec::new(); STAGES * QUARTERS];
        for item in grid.items() {
            if self.priority_filter.is_some_and(|p| p != item.priority) {
                continue;
            }
            if self.company_filter.as_deref().is_some_and(|c| !item.belongs_to(c)) {
                continue;
            }
            if !needle.is_empty()
                && !item.title.to_lowercase().contains(&needle)
                && !item.owner.to_lowercase().contains(&needle)
            {
                continue;
            }
            self.cells[item.stage.index() * QUARTERS + item.quarter.index()].push(item.clone());
        }
        // Stable: equal tiers keep schedule order.
        for cell in &mut self.cells {
            cell.sort_by_key(|i| i.priority);
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.selected_cell().len();
        if len == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= len {
            self.selected_card = len - 1;
        }
    }

    /// Select the cell and card holding `source`, if it is visible.
    fn select_source(&mut self, source: ItemSource) {
        for (index, cell) in self.cells.iter().enumerate() {
            if let Some(card) = cell.iter().position(|i| i.source == source) {
                self.selected_stage = index / QUARTERS;
                self.selected_quarter = index % QUARTERS;
                self.selected_card = card;
                self.scroll_offset = 0;
                return;
            }
        }
        self.clamp_selection();
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn select_quarter(&mut self, quarter: usize) {
        self.selected_quarter = quarter;
        self.selected_card = 0;
        self.scroll_offset = 0;
    }

    fn select_stage(&mut self, stage: usize, last_card: bool) {
        self.selected_stage = stage;
        self.selected_card = if last_card {
            self.selected_cell().len().saturating_sub(1)
        } else {
            0
        };
        self.scroll_offset = 0;
    }

    /// Move the selected item one quarter earlier or later.
    fn move_quarter(&mut self, later: bool) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        let target = if later { item.quarter.next() } else { item.quarter.prev() };
        let Some(quarter) = target else {
            self.set_status_message("Already at the edge of the roadmap".to_string());
            return;
        };
        if self.store.dataset_mut().set_quarter(item.source, quarter) {
            self.after_move(item.source, format!("Moved '{}' to {}", item.title, quarter.label()));
        }
    }

    /// Move the selected item one stage back or forward.
    fn move_stage(&mut self, forward: bool) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        let target = if forward { item.stage.next() } else { item.stage.prev() };
        let Some(stage) = target else {
            self.set_status_message("No further stage in that direction".to_string());
            return;
        };
        if self.store.dataset_mut().set_stage(item.source, stage) {
            self.after_move(item.source, format!("Moved '{}' to {}", item.title, stage.label()));
        }
    }

    fn after_move(&mut self, source: ItemSource, msg: String) {
        self.overrides += 1;
        self.update_cells();
        self.select_source(source);
        self.set_status_message(msg);
    }

    fn cycle_priority_filter(&mut self) {
        // None -> P0 -> P1 -> P2 -> P3 -> None
        self.priority_filter = match self.priority_filter {
            None => Some(Priority::ALL[0]),
            Some(p) => Priority::ALL
                .iter()
                .position(|&x| x == p)
                .and_then(|i| Priority::ALL.get(i + 1))
                .copied(),
        };
        self.update_cells();
        let msg = match self.priority_filter {
            Some(p) => format!("Showing {} only ({} items)", p.label(), self.visible_count()),
            None => "Showing all priorities".to_string(),
        };
        self.set_status_message(msg);
    }

    fn cycle_company_filter(&mut self) {
        // All -> first company -> ... -> last company -> All
        let companies = self.store.dataset().companies.clone();
        self.company_filter = match &self.company_filter {
            None => companies.first().cloned(),
            Some(current) => companies
                .iter()
                .position(|c| c == current)
                .and_then(|i| companies.get(i + 1))
                .cloned(),
        };
        self.update_cells();
        let msg = match &self.company_filter {
            Some(c) => format!("Company: {} ({} items)", c, self.visible_count()),
            None => "Showing all companies".to_string(),
        };
        self.set_status_message(msg);
    }

    fn reload(&mut self) {
        let companies = &self.store.reload().companies;
        if self.company_filter.as_ref().is_some_and(|c| !companies.contains(c)) {
            self.company_filter = None;
        }
        self.overrides = 0;
        self.update_cells();
        let skipped = self.store.cached().map_or(0, |d| d.skipped.len());
        self.set_status_message(format!(
            "Reloaded: {} items, {} skipped rows",
            self.visible_count(),
            skipped
        ));
    }

    /// Handle one key press. Returns true when the board should close.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }

        if self.filter_active {
            match key.code {
                KeyCode::Esc => {
                    self.filter_active = false;
                    self.filter_text.clear();
                    self.update_cells();
                    self.clear_status_message();
                }
                KeyCode::Enter => {
                    self.filter_active = false;
                    if self.filter_text.is_empty() {
                        self.set_status_message("Filter cleared".to_string());
                    } else {
                        self.set_status_message(format!(
                            "Filter: '{}' ({} items shown)",
                            self.filter_text,
                            self.visible_count()
                        ));
                    }
                }
                KeyCode::Backspace => {
                    if self.filter_text.pop().is_some() {
                        self.update_cells();
                    }
                }
                KeyCode::Char(c) => {
                    self.filter_text.push(c);
                    self.update_cells();
                }
                _ => {}
            }
            return false;
        }

        self.clear_status_message();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => return true,
            KeyCode::Esc => {
                if self.show_detail {
                    self.show_detail = false;
                } else {
                    return true;
                }
            }
            KeyCode::Enter => self.show_detail = !self.show_detail,

            // Item moves (check before plain navigation)
            KeyCode::Left if ctrl => self.move_quarter(false),
            KeyCode::Right if ctrl => self.move_quarter(true),
            KeyCode::Up if ctrl => self.move_stage(false),
            KeyCode::Down if ctrl => self.move_stage(true),

            KeyCode::Left => {
                if self.selected_quarter > 0 {
                    self.select_quarter(self.selected_quarter - 1);
                }
            }
            KeyCode::Right => {
                if self.selected_quarter + 1 < QUARTERS {
                    self.select_quarter(self.selected_quarter + 1);
                }
            }
            // Up/Down walk the cell, then spill into the neighbouring stage row
            KeyCode::Up => {
                if self.selected_card > 0 {
                    self.selected_card -= 1;
                } else if self.selected_stage > 0 {
                    self.select_stage(self.selected_stage - 1, true);
                }
            }
            KeyCode::Down => {
                if self.selected_card + 1 < self.selected_cell().len() {
                    self.selected_card += 1;
                } else if self.selected_stage + 1 < STAGES {
                    self.select_stage(self.selected_stage + 1, false);
                }
            }

            KeyCode::Char('/') => {
                self.filter_active = true;
                self.set_status_message("Filter: Type to search title/owner, Enter to apply, Esc to cancel".to_string());
            }
            KeyCode::Char('p') => self.cycle_priority_filter(),
            KeyCode::Char('c') => self.cycle_company_filter(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('h') => {
                self.set_status_message(
                    "Help: Arrows: Select | Ctrl+Left/Right: Quarter | Ctrl+Up/Down: Stage | Enter: Details | /: Filter | c: Company | p: Priority | r: Reload | Esc: Exit"
                        .to_string(),
                );
            }
            _ => {}
        }
        false
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(self.handle_key(key));
            }
        }
        Ok(false)
    }

    /// Split a row into the label column and the eight quarter columns.
    fn columns(area: Rect) -> Vec<Rect> {
        let mut constraints = vec![Constraint::Length(LABEL_WIDTH)];
        constraints.extend((0..QUARTERS).map(|_| Constraint::Ratio(1, QUARTERS as u32)));
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area)
            .to_vec()
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(1), // Year banner
                Constraint::Length(1), // Quarter labels
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_banner(f, chunks[1], chunks[2]);
        self.render_board(f, chunks[3]);
        self.render_status_bar(f, chunks[4]);

        if self.show_detail {
            self.render_detail_popup(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let source = match self.store.cached() {
            Some(ds) => match (&ds.roadmap_source, &ds.pipeline_source) {
                (None, None) => "no sources loaded".to_string(),
                (roadmap, pipeline) => format!(
                    "Roadmap: {}  Pipeline: {}",
                    roadmap.as_ref().map_or("-".to_string(), |p| p.display().to_string()),
                    pipeline.as_ref().map_or("-".to_string(), |p| p.display().to_string()),
                ),
            },
            None => String::new(),
        };

        let view = self.company_filter.as_deref().unwrap_or("All Companies");
        let header_text = vec![Line::from(vec![
            Span::styled("AI ADOPTION ROADMAP", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" - "),
            Span::styled(view.to_string(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(source, Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
        ])];

        let header = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_banner(&self, f: &mut Frame, years: Rect, quarters: Rect) {
        let year_cols = Self::columns(years);
        for (i, year) in [Quarter::ALL[0].year(), Quarter::ALL[4].year()].iter().enumerate() {
            let first = year_cols[1 + i * 4];
            let last = year_cols[4 + i * 4];
            let span = Rect::new(first.x, first.y, last.x + last.width - first.x, first.height);
            let bg = if i == 0 { Color::DarkGray } else { Color::Gray };
            let banner = Paragraph::new(year.to_string())
                .style(Style::default().bg(bg).fg(Color::Black).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center);
            f.render_widget(banner, span);
        }

        let quarter_cols = Self::columns(quarters);
        for (q, quarter) in Quarter::ALL.iter().enumerate() {
            let style = if Some(*quarter) == self.current_quarter {
                Style::default().fg(CURRENT_QUARTER).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let label = if Some(*quarter) == self.current_quarter {
                format!("Q{} (now)", quarter.number())
            } else {
                format!("Q{}", quarter.number())
            };
            f.render_widget(
                Paragraph::new(label).style(style).alignment(Alignment::Center),
                quarter_cols[1 + q],
            );
        }
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints((0..STAGES).map(|_| Constraint::Ratio(1, STAGES as u32)))
            .split(area);

        for (s, stage) in Stage::ALL.iter().enumerate() {
            let cols = Self::columns(rows[s]);
            let count: usize = (0..QUARTERS).map(|q| self.cell(s, q).len()).sum();
            let label = Paragraph::new(vec![
                Line::from(stage.label()),
                Line::from(format!("{count} items")),
            ])
            .style(Style::default().bg(stage_color(*stage)).fg(Color::White).add_modifier(Modifier::BOLD))
            .wrap(Wrap { trim: true });
            f.render_widget(label, cols[0]);

            for q in 0..QUARTERS {
                self.render_cell(f, cols[1 + q], s, q);
            }
        }
    }

    fn render_cell(&mut self, f: &mut Frame, area: Rect, stage: usize, quarter: usize) {
        let is_selected = stage == self.selected_stage && quarter == self.selected_quarter;
        let is_current = Some(Quarter::ALL[quarter]) == self.current_quarter;

        let border_style = if is_selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if is_current {
            Style::default().fg(CURRENT_QUARTER)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default().borders(Borders::ALL).border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let total = self.cell(stage, quarter).len();
        let height = inner.height as usize;
        if total == 0 || height == 0 {
            return;
        }
        // Reserve the last line for the overflow indicator when needed.
        let capacity = if total > height { height.saturating_sub(1).max(1) } else { height };

        let offset = if is_selected {
            if self.selected_card < self.scroll_offset {
                self.scroll_offset = self.selected_card;
            } else if self.selected_card >= self.scroll_offset + capacity {
                self.scroll_offset = self.selected_card + 1 - capacity;
            }
            self.scroll_offset
        } else {
            0
        };

        let width = inner.width as usize;
        let items = self.cell(stage, quarter);
        let mut lines: Vec<Line> = items
            .iter()
            .enumerate()
            .skip(offset)
            .take(capacity)
            .map(|(i, item)| card_line(item, is_selected && i == self.selected_card, width))
            .collect();

        let remaining = total - offset - lines.len();
        if remaining > 0 && lines.len() < height {
            lines.push(Line::styled(format!("▼ +{remaining} more"), Style::default().fg(Color::Cyan)));
        }
        f.render_widget(Paragraph::new(lines), inner);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if self.filter_active {
            format!("Filter: {} | Type to search, Enter to apply, Esc to cancel", self.filter_text)
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let priority_indicator = self
                .priority_filter
                .map(|p| format!(" [{} only]", p.label()))
                .unwrap_or_default();
            let filter_indicator = if self.filter_text.is_empty() {
                String::new()
            } else {
                format!(" [Filter: {}]", self.filter_text)
            };
            let override_indicator = if self.overrides > 0 {
                format!(" [{} unsaved moves]", self.overrides)
            } else {
                String::new()
            };
            format!(
                "Items: {}{}{}{} | Ctrl+arrows: Move | Enter: Details | /: Filter | c: Company | p: Priority | r: Reload | h: Help",
                self.visible_count(),
                priority_indicator,
                filter_indicator,
                override_indicator
            )
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn detail_lines(&self, item: &ScheduledItem) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(vec![Span::styled(
                format!("{} #{}: {}", item.source.label(), item.source.number(), item.title),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(format!("Priority:     {}", item.priority.label())),
            Line::from(format!("Stage:        {}", item.stage.label())),
            Line::from(format!("Quarter:      {}", item.quarter.label())),
        ];
        let Some(ds) = self.store.cached() else {
            return lines;
        };
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

        match item.source {
            ItemSource::Task(i) => {
                if let Some(task) = ds.task(i) {
                    lines.extend([
                        Line::from(format!("Company:      {}", task.company)),
                        Line::from(format!("Area:         {}", task.area)),
                        Line::from(format!("Score:        {}", score(&task.description, task.benefit.as_deref()))),
                        Line::from(""),
                        Line::from("Description:"),
                        Line::from(task.description.clone()),
                        Line::from(""),
                        Line::from("Benefit:"),
                        Line::from(opt(&task.benefit)),
                    ]);
                }
            }
            ItemSource::Tool(id) => {
                if let Some(req) = ds.tool_request(id) {
                    let target = match req.target_quarter {
                        QuarterSlot::Assigned(q) => q.label().to_string(),
                        QuarterSlot::NotAssigned => format!("{} (allocated {})", QuarterSlot::NotAssigned, item.quarter.label()),
                    };
                    lines.extend([
                        Line::from(format!("Target:       {target}")),
                        Line::from(format!("Department:   {}", req.department)),
                        Line::from(format!("Stakeholder:  {}", opt(&req.stakeholder))),
                        Line::from(format!("Tool:         {}", opt(&req.tool))),
                        Line::from(format!("Budget:       {}", opt(&req.budget))),
                        Line::from(format!("Status:       {}", opt(&req.status))),
                        Line::from(format!("Phase:        {}", req.phase)),
                        Line::from(format!("Reviewed by:  {}", opt(&req.reviewed_by))),
                        Line::from(format!("Score:        {}", opt(&req.score))),
                        Line::from(""),
                        Line::from("Notes:"),
                        Line::from(opt(&req.notes)),
                    ]);
                }
            }
        }
        lines
    }

    fn render_detail_popup(&self, f: &mut Frame) {
        let Some(item) = self.selected_item() else {
            return;
        };

        let popup_area = centered_rect(70, 70, f.area());
        f.render_widget(Clear, popup_area);

        let popup_block = Block::default()
            .borders(Borders::ALL)
            .title("Details (Press Enter to close)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(priority_color(item.priority)).add_modifier(Modifier::BOLD));

        let popup = Paragraph::new(self.detail_lines(item))
            .block(popup_block)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// A rectangle covering `percent_x` by `percent_y` of `area`, centred.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// One card: tier tag and title, cut to the cell width.
fn card_line(item: &ScheduledItem, selected: bool, width: usize) -> Line<'static> {
    let mut style = Style::default().fg(priority_color(item.priority));
    if item.priority == Priority::P0 {
        style = style.add_modifier(Modifier::BOLD);
    }
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    let text = format!("{} {}", item.priority.label(), item.title);
    Line::styled(truncate(&text, width), style)
}
