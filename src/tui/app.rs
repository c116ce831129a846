use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use indexmap::IndexMap;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::model::{Config, Project, SortKey, Tag, Task, TimeEntry, ViewMode};
use crate::ops::dates::format_minutes;
use crate::ops::filter::{self, Filters};
use crate::ops::flatten::{self, FlatRow};
use crate::ops::loader::LoadedData;
use crate::store::Store;
use crate::util::unicode::{next_grapheme_boundary, prev_grapheme_boundary, word_boundary_left};

use super::input;
use super::render;
use super::theme::Theme;
use super::undo::UndoStack;
use super::worker::{Message, Mutation, Outcome, Request, Worker};

/// Which list a selector popup chooses from, and what choosing does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// Move targets to a project
    Project,
    /// Toggle tags on targets
    Tag,
    /// Toggle dependencies of one task
    Dependency,
    ProjectFilter,
    TagFilter,
    /// Reparent one task
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorItem {
    pub id: String,
    pub label: String,
    /// `#RRGGBB`, for projects and tags
    pub color: Option<String>,
}

/// One visible row of a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorEntry<'a> {
    /// The non-candidate option ("All Projects" and friends)
    Sentinel(&'static str),
    Item(&'a SelectorItem),
}

/// Popup list with incremental type-to-filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub kind: SelectorKind,
    /// Task ids the choice applies to. Empty for the filter selectors.
    pub targets: Vec<String>,
    pub items: Vec<SelectorItem>,
    pub sentinel: Option<&'static str>,
    pub query: String,
    pub cursor: usize,
}

impl Selector {
    pub fn new(
        kind: SelectorKind,
        targets: Vec<String>,
        items: Vec<SelectorItem>,
        sentinel: Option<&'static str>,
    ) -> Self {
        Selector {
            kind,
            targets,
            items,
            sentinel,
            query: String::new(),
            cursor: 0,
        }
    }

    /// The sentinel (only while the query is empty) followed by the items
    /// whose label contains the query, case-insensitively.
    pub fn entries(&self) -> Vec<SelectorEntry<'_>> {
        let mut out = Vec::with_capacity(self.items.len() + 1);
        if self.query.is_empty()
            && let Some(label) = self.sentinel
        {
            out.push(SelectorEntry::Sentinel(label));
        }
        let query = self.query.to_lowercase();
        out.extend(
            self.items
                .iter()
                .filter(|item| item.label.to_lowercase().contains(&query))
                .map(SelectorEntry::Item),
        );
        out
    }

    pub fn current(&self) -> Option<SelectorEntry<'_>> {
        self.entries().into_iter().nth(self.cursor)
    }

    /// Move the cursor, wrapping at both ends.
    pub fn move_by(&mut self, delta: isize) {
        let len = self.entries().len() as isize;
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    /// Append to the query if `c` is one of the accepted characters.
    pub fn push_query(&mut self, c: char) -> bool {
        if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') {
            self.query.push(c);
            self.cursor = 0;
            true
        } else {
            false
        }
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.cursor = 0;
    }

    /// Toggle selectors stay open after Enter; the rest apply and close.
    pub fn stays_open(&self) -> bool {
        matches!(
            self.kind,
            SelectorKind::Tag | SelectorKind::Dependency | SelectorKind::TagFilter
        )
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            SelectorKind::Project => "Move to project",
            SelectorKind::Tag => "Toggle tags",
            SelectorKind::Dependency => "Depends on",
            SelectorKind::ProjectFilter => "Filter by project",
            SelectorKind::TagFilter => "Filter by tags",
            SelectorKind::Parent => "Set parent",
        }
    }
}

/// Current interaction mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Browsing, optionally with a selector popup open
    Normal(Option<Selector>),
    Add,
    AddSubtask {
        parent_id: String,
    },
    Edit {
        task_id: String,
    },
    Search,
    Command,
    ConfirmDelete {
        ids: Vec<String>,
    },
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Normal(None)
    }
}

impl Mode {
    /// True whenever keys go somewhere other than the normal keymap
    pub fn is_input_mode(&self) -> bool {
        !matches!(self, Mode::Normal(None))
    }

    pub fn selector(&self) -> Option<&Selector> {
        match self {
            Mode::Normal(sel) => sel.as_ref(),
            _ => None,
        }
    }
}

/// Single-line text buffer with a grapheme-aware byte cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub text: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = prev_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = next_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn delete_word_left(&mut self) {
        let start = word_boundary_left(&self.text, self.cursor);
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    pub fn left(&mut self) {
        if let Some(prev) = prev_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = next_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }
}

/// List view state. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Index into `App::rows`
    pub cursor: usize,
    pub scroll_offset: usize,
    pub selected: HashSet<String>,
    /// Parents showing their subtasks inline
    pub expanded: HashSet<String>,
    pub view_mode: ViewMode,
    pub sort: SortKey,
    pub filters: Filters,
    pub wrap: bool,
    /// Task whose priority changed locally; the list resorts once the cursor
    /// leaves it
    pub resort_pending: Option<String>,
}

/// Main application state
pub struct App {
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    pub config: Config,
    /// Where `:theme` persists its choice
    pub config_path: Option<PathBuf>,
    /// Enriched top-level tasks, replaced wholesale on every load
    pub all_tasks: Vec<Task>,
    pub projects: IndexMap<String, Project>,
    pub tags: IndexMap<String, Tag>,
    pub blocked: HashSet<String>,
    /// Filtered, sorted, flattened view of `all_tasks`
    pub rows: Vec<FlatRow>,
    pub view: ViewState,
    /// Text buffer for add, edit, search and command modes
    pub input: TextInput,
    /// Committed filter text, restored when a search is cancelled
    pub search_restore: String,
    /// Highlighted command suggestion
    pub command_suggestion: usize,
    pub undo_stack: UndoStack,
    pub status: Option<String>,
    pub show_help: bool,
    pub help_scroll: usize,
    pub active_timer: Option<TimeEntry>,
    /// Task to put the cursor on after the next load
    pub focus_after_load: Option<String>,
    /// Requests waiting to be handed to the store worker
    pub outbox: Vec<Request>,
    /// Rows available to the list, updated by the renderer
    pub list_height: usize,
}

impl App {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        let theme = Theme::from_config(&config);
        let view = ViewState {
            view_mode: config.default_view,
            wrap: config.wrap,
            ..Default::default()
        };
        App {
            mode: Mode::default(),
            should_quit: false,
            theme,
            config,
            config_path,
            all_tasks: Vec::new(),
            projects: IndexMap::new(),
            tags: IndexMap::new(),
            blocked: HashSet::new(),
            rows: Vec::new(),
            view,
            input: TextInput::default(),
            search_restore: String::new(),
            command_suggestion: 0,
            undo_stack: UndoStack::new(),
            status: None,
            show_help: false,
            help_scroll: 0,
            active_timer: None,
            focus_after_load: None,
            outbox: vec![Request::Reload, Request::LoadTimer],
            list_height: 20,
        }
    }

    pub fn request(&mut self, request: Request) {
        self.outbox.push(request);
    }

    /// Queue a store write that reloads on success.
    pub fn mutate(&mut self, mutation: Mutation) {
        self.request(Request::Mutate {
            mutation,
            reload: true,
        });
    }

    /// Queue a store write that leaves the list alone on success.
    pub fn mutate_quietly(&mut self, mutation: Mutation) {
        self.request(Request::Mutate {
            mutation,
            reload: false,
        });
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    /// Re-derive `rows` from `all_tasks` and the view state.
    pub fn refresh(&mut self) {
        let now = chrono::Utc::now();
        let mut visible = filter::filter_tasks(
            &self.all_tasks,
            self.view.view_mode,
            &self.view.filters,
            &self.projects,
            now,
        );
        filter::sort_visible(&self.all_tasks, &mut visible, self.view.sort);
        self.rows = flatten::flatten(&self.all_tasks, &visible, &self.view.expanded);

        self.view.cursor = self.view.cursor.min(self.rows.len().saturating_sub(1));
        self.ensure_cursor_visible();
    }

    pub fn cursor_row(&self) -> Option<FlatRow> {
        self.rows.get(self.view.cursor).copied()
    }

    pub fn cursor_task(&self) -> Option<&Task> {
        self.rows.get(self.view.cursor)?.task(&self.all_tasks)
    }

    pub fn row_task(&self, row: &FlatRow) -> Option<&Task> {
        row.task(&self.all_tasks)
    }

    /// Row index showing task `id`, if it is visible.
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.task(&self.all_tasks).is_some_and(|t| t.id == id))
    }

    /// Find a loaded task, top-level or subtask.
    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.all_tasks.iter().find_map(|t| {
            if t.id == id {
                Some(t)
            } else {
                t.subtasks.iter().find(|s| s.id == id)
            }
        })
    }

    pub fn find_task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.all_tasks.iter_mut().find_map(|t| {
            if t.id == id {
                Some(t)
            } else {
                t.subtasks.iter_mut().find(|s| s.id == id)
            }
        })
    }

    /// Tasks an action applies to: the selection in list order, else the
    /// task under the cursor.
    pub fn target_ids(&self) -> Vec<String> {
        let selected = &self.view.selected;
        if selected.is_empty() {
            return self
                .cursor_task()
                .map(|t| vec![t.id.clone()])
                .unwrap_or_default();
        }

        let mut ids: Vec<String> = self
            .rows
            .iter()
            .filter_map(|r| r.task(&self.all_tasks))
            .filter(|t| selected.contains(&t.id))
            .map(|t| t.id.clone())
            .collect();
        // Selected tasks that are filtered out or collapsed still count
        for task in self
            .all_tasks
            .iter()
            .flat_map(|t| std::iter::once(t).chain(t.subtasks.iter()))
        {
            if selected.contains(&task.id) && !ids.contains(&task.id) {
                ids.push(task.id.clone());
            }
        }
        ids
    }

    /// Move the cursor, resolving a pending resort if the row being left is
    /// the reprioritized task.
    pub fn move_cursor(&mut self, new: usize) {
        let new = new.min(self.rows.len().saturating_sub(1));
        let old = self.view.cursor;
        if new != old {
            let leaving_pending = match (&self.view.resort_pending, self.cursor_task()) {
                (Some(pending), Some(task)) => *pending == task.id,
                _ => false,
            };
            if leaving_pending {
                self.view.resort_pending = None;
                // The reload reorders rows; stay on the row being entered
                self.focus_after_load = self
                    .rows
                    .get(new)
                    .and_then(|r| self.row_task(r))
                    .map(|t| t.id.clone());
                self.request(Request::Reload);
            }
        }
        self.view.cursor = new;
        self.ensure_cursor_visible();
    }

    pub fn move_cursor_by(&mut self, delta: isize) {
        let target = (self.view.cursor as isize + delta).max(0) as usize;
        self.move_cursor(target);
    }

    pub fn half_page(&self) -> usize {
        (self.list_height / 2).max(1)
    }

    pub fn ensure_cursor_visible(&mut self) {
        let height = self.list_height.max(1);
        if self.view.cursor < self.view.scroll_offset {
            self.view.scroll_offset = self.view.cursor;
        } else if self.view.cursor >= self.view.scroll_offset + height {
            self.view.scroll_offset = self.view.cursor + 1 - height;
        }
    }

    /// Case-insensitive highlight pattern for the active text filter
    pub fn search_re(&self) -> Option<Regex> {
        let text = &self.view.filters.text;
        if text.is_empty() {
            return None;
        }
        Regex::new(&format!("(?i){}", regex::escape(text))).ok()
    }

    pub fn handle_message(&mut self, msg: Message) {
        match msg {
            Message::Loaded(Ok(data)) => self.apply_loaded(data),
            Message::Loaded(Err(e)) => self.set_status(format!("Error: {}", e)),
            Message::Mutated {
                result: Ok(outcome),
                reload,
            } => {
                self.apply_outcome(outcome);
                if reload {
                    self.request(Request::Reload);
                }
            }
            Message::Mutated { result: Err(e), .. } => {
                // Local state may be ahead of the store; converge back
                self.set_status(format!("Error: {}", e));
                self.request(Request::Reload);
            }
            Message::Timer(Ok(entry)) => self.active_timer = entry,
            Message::Timer(Err(e)) => self.set_status(format!("Error: {}", e)),
            // Redraw only
            Message::Tick => {}
        }
    }

    fn apply_loaded(&mut self, data: LoadedData) {
        self.all_tasks = data.tasks;
        self.projects = data.projects;
        self.tags = data.tags;
        self.blocked = data.blocked;

        let known: HashSet<&str> = self
            .all_tasks
            .iter()
            .flat_map(|t| std::iter::once(t).chain(t.subtasks.iter()))
            .map(|t| t.id.as_str())
            .collect();
        self.view.selected.retain(|id| known.contains(id.as_str()));
        self.view.expanded.retain(|id| known.contains(id.as_str()));
        if self
            .view
            .resort_pending
            .as_ref()
            .is_some_and(|id| !known.contains(id.as_str()))
        {
            self.view.resort_pending = None;
        }

        self.refresh();
        if let Some(id) = self.focus_after_load.take()
            && let Some(row) = self.row_of(&id)
        {
            self.view.cursor = row;
            self.ensure_cursor_visible();
        }
        debug!(rows = self.rows.len(), "list refreshed");
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Written => {}
            Outcome::Deleted {
                ids,
                links,
                entries,
            } => {
                if entries.iter().any(|e| e.is_running()) {
                    self.active_timer = None;
                }
                self.undo_stack.record_deleted_relations(&ids, links, entries);
            }
            Outcome::ProjectCreated(project) => {
                self.set_status(format!("Created project: {}", project.name));
            }
            Outcome::TagCreated(tag) => {
                self.set_status(format!("Created tag: {}", tag.display_name()));
            }
            Outcome::TimerStarted(entry) => {
                let title = self
                    .find_task(&entry.task_id)
                    .map(|t| t.title.clone())
                    .unwrap_or_default();
                self.set_status(format!("Tracking: {}", title));
                self.active_timer = Some(entry);
            }
            Outcome::TimerStopped(Some(entry)) => {
                self.active_timer = None;
                let minutes = entry.duration.unwrap_or(0);
                self.set_status(format!("Stopped tracking: {}", format_minutes(minutes)));
            }
            Outcome::TimerStopped(None) => {
                self.active_timer = None;
                self.set_status("No active timer");
            }
            Outcome::TimeLogged(entry) => {
                let minutes = entry.duration.unwrap_or(0);
                self.set_status(format!("Logged {}", format_minutes(minutes)));
            }
        }
    }
}

/// Run the TUI application against the database at `db_path`.
pub fn run(
    config: Config,
    config_path: Option<PathBuf>,
    db_path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&db_path)?;
    let worker = Worker::spawn(store)?;
    info!(db = %db_path.display(), "starting tui");

    let mut app = App::new(config, config_path);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &worker);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    worker: &Worker,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_tick = Instant::now();
    loop {
        for request in app.take_requests() {
            if !worker.send(request) {
                warn!("store worker is gone");
                return Err("store worker stopped unexpectedly".into());
            }
        }

        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        for msg in worker.poll() {
            app.handle_message(msg);
        }

        // Stopwatch heartbeat, only while a timer runs
        if app.active_timer.is_some() && last_tick.elapsed() >= Duration::from_secs(1) {
            last_tick = Instant::now();
            app.handle_message(Message::Tick);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::tui::worker::execute;

    /// A fresh app backed by an in-memory store, with the initial load done.
    pub fn app_with_store() -> (App, Store) {
        let store = Store::open_in_memory().unwrap();
        let mut app = App::new(Config::default(), None);
        pump(&mut app, &store);
        (app, store)
    }

    /// Run every queued request synchronously until the outbox is empty.
    pub fn pump(app: &mut App, store: &Store) {
        for _ in 0..100 {
            let requests = app.take_requests();
            if requests.is_empty() {
                return;
            }
            for request in requests {
                let msg = execute(store, request);
                app.handle_message(msg);
            }
        }
        panic!("requests kept coming");
    }

    pub fn titles(app: &App) -> Vec<String> {
        app.rows
            .iter()
            .map(|r| app.row_task(r).unwrap().title.clone())
            .collect()
    }

    /// Insert a top-level task into the store and return it.
    pub fn seed(store: &Store, title: &str, priority: crate::model::Priority) -> Task {
        let mut task = Task::new(title, chrono::Utc::now());
        task.project_id = Some(crate::model::INBOX_ID.into());
        task.priority = priority;
        store.insert_task(&task).unwrap();
        task
    }

    pub fn seed_subtask(store: &Store, parent: &Task, title: &str) -> Task {
        let mut task = Task::new(title, chrono::Utc::now());
        task.parent_id = Some(parent.id.clone());
        task.project_id = parent.project_id.clone();
        store.insert_task(&task).unwrap();
        task
    }
}
