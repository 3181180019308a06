use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::{debug, info, warn};

use crate::comments::{self, CommentTree, Toggle};
use crate::config::Config;
use crate::data::ItemSource;
use crate::feed::{Applied, FeedSession, PageRequest};
use crate::hackernews::{Category, FetchError, Item, ItemKind, Updates};
use crate::polls::PollBoard;
use crate::sidebar::{self, SidebarList};
use crate::throttle::Throttle;
use crate::update::{Notification, Poller, BANNER_MESSAGE};
use crate::view::{
    self, Row, COLOR_ACCENT, COLOR_ERROR, COLOR_SUCCESS, COLOR_TEXT_PRIMARY, COLOR_TEXT_SECONDARY,
};

enum AsyncResponse {
    Page {
        request: PageRequest,
        result: Result<Vec<Item>, FetchError>,
    },
    Comments {
        generation: u64,
        id: i64,
        result: Result<Vec<Item>, FetchError>,
    },
    PollOption {
        generation: u64,
        id: i64,
        result: Result<Item, FetchError>,
    },
    Sidebar {
        lists: Vec<SidebarList>,
    },
    Updates {
        generation: u64,
        snapshot: Result<Updates, FetchError>,
        items: Result<Vec<Item>, FetchError>,
    },
}

pub struct Options {
    pub source: Arc<dyn ItemSource>,
    pub config: Config,
    pub category: Category,
    pub status_message: String,
}

pub struct Model {
    source: Arc<dyn ItemSource>,
    session: FeedSession,
    tree: CommentTree,
    polls: PollBoard,
    poller: Poller,
    notification: Option<Notification>,
    sidebar: Vec<SidebarList>,
    rows: Vec<Row>,
    selected: usize,
    feed_scroll: usize,
    status_message: String,
    status_is_error: bool,
    pending_page: Option<PageRequest>,
    exhausted: bool,
    update_in_flight: bool,
    scroll_throttle: Throttle,
    update_timer: Throttle,
    load_threshold: usize,
    sidebar_size: usize,
    banner_duration: Duration,
    max_shown: usize,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    needs_redraw: bool,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let now = Instant::now();
        let (response_tx, response_rx) = unbounded();
        let cfg = &opts.config;
        let mut model = Self {
            source: opts.source,
            session: FeedSession::new(opts.category, cfg.feed.page_size),
            tree: CommentTree::new(),
            polls: PollBoard::new(),
            poller: Poller::new(cfg.updates.cooldown, cfg.updates.max_shown, now),
            notification: None,
            sidebar: Vec::new(),
            rows: Vec::new(),
            selected: 0,
            feed_scroll: 0,
            status_message: opts.status_message,
            status_is_error: false,
            pending_page: None,
            exhausted: false,
            update_in_flight: false,
            scroll_throttle: Throttle::new(cfg.ui.scroll_throttle),
            update_timer: Throttle::started(cfg.updates.interval, now),
            load_threshold: cfg.feed.load_threshold,
            sidebar_size: cfg.feed.sidebar_size,
            banner_duration: cfg.updates.banner_duration,
            max_shown: cfg.updates.max_shown,
            response_tx,
            response_rx,
            needs_redraw: true,
        };
        model.request_page();
        model.queue_sidebar();
        model
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let tick_rate = Duration::from_millis(120);
        let mut banner_visible = false;

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            let now = Instant::now();
            if !self.update_in_flight && self.update_timer.ready(now) {
                self.queue_update_check();
            }
            let visible = self
                .notification
                .as_ref()
                .map(|note| note.visible(now))
                .unwrap_or(false);
            if visible != banner_visible {
                banner_visible = visible;
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => self.set_error(format!("Error: {err}")),
                        }
                    }
                } else {
                    self.mark_dirty();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status_message = message.into();
        self.status_is_error = false;
        self.mark_dirty();
    }

    fn set_error<S: Into<String>>(&mut self, message: S) {
        self.status_message = message.into();
        self.status_is_error = true;
        self.mark_dirty();
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char(ch @ '1'..='6') => {
                let index = ch as usize - '1' as usize;
                self.switch_category(Category::FEED[index]);
            }
            KeyCode::Char('r') => self.switch_category(self.session.category()),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::Char('g') | KeyCode::Home => self.move_selection(i64::MIN / 2),
            KeyCode::Char('G') | KeyCode::End => self.move_selection(i64::MAX / 2),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('o') => self.open_selected()?,
            _ => {}
        }
        Ok(false)
    }

    fn move_selection(&mut self, delta: i64) {
        if self.rows.is_empty() {
            self.maybe_load_more();
            return;
        }
        let last = self.rows.len() as i64 - 1;
        let next = (self.selected as i64).saturating_add(delta).clamp(0, last);
        self.selected = next as usize;
        self.mark_dirty();
        self.maybe_load_more();
    }

    fn near_end(&self) -> bool {
        self.rows.len().saturating_sub(self.selected + 1) <= self.load_threshold
    }

    fn maybe_load_more(&mut self) {
        if self.pending_page.is_some() || self.exhausted || !self.near_end() {
            return;
        }
        if self.scroll_throttle.ready(Instant::now()) {
            self.request_page();
        }
    }

    fn switch_category(&mut self, category: Category) {
        self.session.switch_category(category);
        self.tree.clear();
        self.polls.clear();
        self.rows.clear();
        self.selected = 0;
        self.feed_scroll = 0;
        self.pending_page = None;
        self.exhausted = false;
        info!(category = ?category, "category selected");
        self.request_page();
    }

    fn request_page(&mut self) {
        let request = self.session.begin_page();
        self.pending_page = Some(request);
        self.set_status(format!(
            "Loading {} stories {}-{}...",
            request.category.display_name(),
            request.start + 1,
            request.start + request.len
        ));
        let source = self.source.clone();
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = source.page(request.category, request.start, request.len);
            let _ = tx.send(AsyncResponse::Page { request, result });
        });
    }

    fn queue_sidebar(&mut self) {
        let source = self.source.clone();
        let tx = self.response_tx.clone();
        let size = self.sidebar_size;
        thread::spawn(move || {
            let lists = sidebar::load_all(source.as_ref(), size);
            let _ = tx.send(AsyncResponse::Sidebar { lists });
        });
    }

    fn queue_update_check(&mut self) {
        self.update_in_flight = true;
        let generation = self.session.generation();
        let source = self.source.clone();
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let snapshot = source.updates();
            let items = match &snapshot {
                Ok(updates) if !updates.items.is_empty() => source.items(&updates.items),
                _ => Ok(Vec::new()),
            };
            let _ = tx.send(AsyncResponse::Updates {
                generation,
                snapshot,
                items,
            });
        });
    }

    fn queue_poll_options(&mut self, poll: &Item) {
        let generation = self.session.generation();
        for id in self.polls.track(poll) {
            let source = self.source.clone();
            let tx = self.response_tx.clone();
            thread::spawn(move || {
                let result = source.item(id);
                let _ = tx.send(AsyncResponse::PollOption {
                    generation,
                    id,
                    result,
                });
            });
        }
    }

    fn toggle_selected(&mut self) {
        let Some(row) = self.rows.get(self.selected) else {
            return;
        };
        let id = row.target.id();
        match self.tree.toggle(id) {
            Toggle::Fetch(id) => {
                let generation = self.session.generation();
                let source = self.source.clone();
                let tx = self.response_tx.clone();
                thread::spawn(move || {
                    let result = comments::load_children(source.as_ref(), id);
                    let _ = tx.send(AsyncResponse::Comments {
                        generation,
                        id,
                        result,
                    });
                });
                self.mark_dirty();
            }
            Toggle::Pending => self.set_status("Still loading..."),
            Toggle::Expanded | Toggle::Collapsed => self.mark_dirty(),
            Toggle::Ignored => {}
        }
    }

    fn open_selected(&mut self) -> Result<()> {
        let Some(row) = self.rows.get(self.selected) else {
            return Ok(());
        };
        let link = row.link.clone();
        webbrowser::open(&link)?;
        self.set_status(format!("Opened {link}"));
        Ok(())
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Page { request, result } => {
                if self.pending_page != Some(request) {
                    debug!(start = request.start, "discarding superseded page");
                    return;
                }
                self.pending_page = None;
                let items = match result {
                    Ok(items) => items,
                    Err(err) => {
                        warn!(error = %err, "page load failed");
                        self.set_error(format!("Failed to load posts: {err}"));
                        return;
                    }
                };
                if items.is_empty() {
                    self.exhausted = true;
                }
                match self.session.apply_page(request, items) {
                    Applied::Rendered(rendered) => {
                        for item in &rendered {
                            self.tree.track_story(item.clone());
                            if item.kind == ItemKind::Poll {
                                self.queue_poll_options(item);
                            }
                        }
                        debug!(count = rendered.len(), offset = self.session.offset(), "page applied");
                        let message = if self.exhausted {
                            format!("End of {} reached.", self.session.category().display_name())
                        } else {
                            format!(
                                "{}: {} stories loaded.",
                                self.session.category().display_name(),
                                self.session.posts().len()
                            )
                        };
                        self.set_status(message);
                    }
                    Applied::Stale => debug!("discarding stale page"),
                }
            }
            AsyncResponse::Comments {
                generation,
                id,
                result,
            } => {
                if !self.session.is_current(generation) {
                    debug!(id, "discarding stale comments");
                    return;
                }
                if let Err(err) = &result {
                    warn!(id, error = %err, "comment load failed");
                    self.set_error(format!("Failed to load comments: {err}"));
                }
                self.tree.finish_load(id, result);
            }
            AsyncResponse::PollOption {
                generation,
                id,
                result,
            } => {
                if !self.session.is_current(generation) {
                    return;
                }
                if let Err(err) = &result {
                    warn!(id, error = %err, "poll option load failed");
                }
                self.polls.resolve(id, result);
            }
            AsyncResponse::Sidebar { lists } => {
                self.sidebar = lists;
            }
            AsyncResponse::Updates {
                generation,
                snapshot,
                items,
            } => {
                self.update_in_flight = false;
                let snapshot = match snapshot {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        warn!(error = %err, "update check failed");
                        return;
                    }
                };
                // The banner only needs the snapshot, not the resolved items.
                let now = Instant::now();
                if self.poller.observe(&snapshot, now) {
                    self.notification =
                        Some(Notification::new(BANNER_MESSAGE, now, self.banner_duration));
                }
                if snapshot.is_empty() || !self.session.is_current(generation) {
                    return;
                }
                match items {
                    Ok(items) => {
                        self.poller.digest(items, &mut self.session);
                    }
                    Err(err) => warn!(error = %err, "update items failed to resolve"),
                }
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(frame.size());

        frame.render_widget(Paragraph::new(self.header_line()), layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
            .split(layout[1]);
        self.draw_feed(frame, body[0]);
        self.draw_side(frame, body[1]);

        let status_style = if self.status_is_error {
            Style::default().fg(COLOR_ERROR)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        let footer = Line::from(vec![
            Span::styled(self.status_message.clone(), status_style),
            Span::styled(
                "   1-6 category · j/k move · Enter comments · o open · r reload · q quit",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ),
        ]);
        frame.render_widget(Paragraph::new(footer), layout[2]);
    }

    fn header_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for (index, category) in Category::FEED.iter().enumerate() {
            let label = format!(" {} {} ", index + 1, category.display_name());
            let style = if *category == self.session.category() {
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(COLOR_TEXT_PRIMARY)
            };
            spans.push(Span::styled(label, style));
        }
        if let Some(note) = &self.notification {
            if note.visible(Instant::now()) {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    note.message().to_string(),
                    Style::default().fg(COLOR_SUCCESS).add_modifier(Modifier::BOLD),
                ));
            }
        }
        Line::from(spans)
    }

    fn draw_feed(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let inner_width = area.width.saturating_sub(4) as usize;
        let view_height = area.height.saturating_sub(2) as usize;
        self.rows = view::feed_rows(&self.session, &self.tree, &self.polls, inner_width);
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }

        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut selected_start = 0;
        let mut selected_height = 0;
        for (index, row) in self.rows.iter().enumerate() {
            let is_selected = index == self.selected;
            if is_selected {
                selected_start = lines.len();
                selected_height = row.height();
            }
            let marker = if is_selected { "▌ " } else { "  " };
            for line in &row.lines {
                let mut spans = vec![Span::styled(marker, Style::default().fg(COLOR_ACCENT))];
                spans.extend(line.spans.iter().cloned());
                lines.push(Line::from(spans));
            }
        }
        self.feed_scroll = scroll_to_fit(
            self.feed_scroll,
            selected_start,
            selected_height,
            view_height,
        );

        let title = format!(" {} ", self.session.category().display_name());
        let block = Block::default().borders(Borders::ALL).title(title);
        if lines.is_empty() {
            let placeholder = if self.pending_page.is_some() {
                "Loading..."
            } else {
                "Nothing to show."
            };
            frame.render_widget(Paragraph::new(placeholder).block(block), area);
            return;
        }
        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .scroll((self.feed_scroll.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_side(&self, frame: &mut Frame<'_>, area: Rect) {
        let updates_height = (self.max_shown as u16).saturating_add(2);
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(updates_height), Constraint::Min(3)])
            .split(area);

        let update_lines: Vec<Line<'static>> = if self.poller.entries().is_empty() {
            vec![Line::from(Span::styled(
                "No new activity yet.",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ))]
        } else {
            self.poller
                .entries()
                .iter()
                .map(|entry| Line::from(format!("• {}", entry.label)))
                .collect()
        };
        frame.render_widget(
            Paragraph::new(Text::from(update_lines))
                .block(Block::default().borders(Borders::ALL).title(" Live updates "))
                .wrap(Wrap { trim: true }),
            parts[0],
        );

        let mut lines: Vec<Line<'static>> = Vec::new();
        for list in &self.sidebar {
            lines.push(Line::from(Span::styled(
                list.category.display_name().to_string(),
                Style::default().fg(COLOR_ACCENT).add_modifier(Modifier::BOLD),
            )));
            if list.entries.is_empty() {
                lines.push(Line::from(Span::styled(
                    "  unavailable",
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                )));
            }
            for entry in &list.entries {
                lines.push(Line::from(format!("  {}", entry.title)));
            }
            lines.push(Line::from(""));
        }
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .block(Block::default().borders(Borders::ALL).title(" Stories "))
                .wrap(Wrap { trim: false }),
            parts[1],
        );
    }
}

/// New scroll offset keeping `[start, start + height)` inside the viewport.
fn scroll_to_fit(current: usize, start: usize, height: usize, view: usize) -> usize {
    if view == 0 {
        return start;
    }
    if start < current {
        return start;
    }
    let end = start + height;
    if end > current + view {
        return end.saturating_sub(view).min(start);
    }
    current
}
