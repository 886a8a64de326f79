use anyhow::Result;
use chatbot_core::{
    conversation::ViewStateStore,
    markdown::{self, Block as MdBlock},
    Command, ConversationView, Delivery, DisposeHandle, Extension, Sender, Settings, SurfaceId,
    Turn,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::commands::{self, CommandResult};
use crate::document::{Document, SharedDocument};
use crate::panel::{NoticeLevel, TuiNotifier, TuiSurfaceFactory, UiEvent};
use crate::theme::Theme;

// ── Single-prompt mode ──────────────────────────────────────────────────

/// Ask once and print the answer. Failures come back as the error string.
pub async fn run_single_prompt(settings: &Settings, prompt: &str) -> Result<()> {
    let transport = settings.build_transport();
    match transport.ask(prompt).await {
        Ok(answer) => {
            println!("{answer}");
            Ok(())
        }
        Err(message) => Err(anyhow::anyhow!(message)),
    }
}

// ── Interactive TUI ─────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Document,
}

/// The open conversation panel, as far as the UI is concerned.
struct PanelState {
    id: SurfaceId,
    dispose: DisposeHandle,
    view: ConversationView,
    scroll_offset: usize,
    /// Bottom-most offset as of the last draw.
    max_scroll: usize,
}

struct AppState {
    // Input
    input: String,
    cursor_pos: usize,
    input_history: Vec<String>,
    history_pos: Option<usize>,
    focus: Focus,

    // Document pane
    document: SharedDocument,
    doc_scroll: usize,

    // Conversation panel
    panel: Option<PanelState>,
    /// Set when transcripts survive the panel being closed.
    view_store: Option<ViewStateStore>,
    ui_rx: mpsc::UnboundedReceiver<UiEvent>,

    // Status
    status_text: String,
    status_level: NoticeLevel,
    /// Multi-line message shown in a popup until dismissed.
    popup: Option<String>,

    // Display
    should_quit: bool,
    theme: Theme,

    extension: Arc<Extension>,
}

impl AppState {
    fn new(
        settings: &Settings,
        theme_name: &str,
        document: SharedDocument,
        extension: Arc<Extension>,
        ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    ) -> Self {
        Self {
            input: String::new(),
            cursor_pos: 0,
            input_history: Vec::new(),
            history_pos: None,
            focus: Focus::Input,

            document,
            doc_scroll: 0,

            panel: None,
            view_store: settings
                .view
                .persist_history
                .then(ViewStateStore::new),
            ui_rx,

            status_text: "/open to start a conversation, /help for commands".into(),
            status_level: NoticeLevel::Info,
            popup: None,

            should_quit: false,
            theme: Theme::by_name(theme_name),

            extension,
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status_text = text.into();
        self.status_level = NoticeLevel::Info;
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status_text = text.into();
        self.status_level = NoticeLevel::Error;
    }

    fn new_view(&self) -> ConversationView {
        match self.view_store {
            Some(ref store) => ConversationView::with_store(store.clone()),
            None => ConversationView::new(),
        }
    }

    fn close_panel(&mut self) {
        if let Some(panel) = self.panel.take() {
            self.retire_panel(panel);
            self.set_status("Conversation panel closed");
        }
    }

    /// Dispose `panel` and give it every answer already posted to it, so a
    /// persisted transcript keeps completion order across a reopen.
    fn retire_panel(&mut self, mut panel: PanelState) {
        panel.dispose.dispose();

        // Posts happen under the session lock, so nothing for this surface
        // can arrive after the dispose above.
        let mut deferred = Vec::new();
        while let Ok(ui_event) = self.ui_rx.try_recv() {
            match ui_event {
                UiEvent::Answer { id, message } if id == panel.id => {
                    panel.view.receive(message);
                }
                other => deferred.push(other),
            }
        }
        drop(panel);

        for ui_event in deferred {
            handle_ui_event(self, ui_event);
        }
    }

    fn pump_ui_events(&mut self) {
        while let Ok(ui_event) = self.ui_rx.try_recv() {
            handle_ui_event(self, ui_event);
        }
    }

    /// Spawned so that slow commands (code generation) don't stall the UI.
    fn run_command(&self, command: Command) {
        let extension = self.extension.clone();
        tokio::spawn(async move { extension.execute(command).await });
    }

    fn push_history(&mut self, input: String) {
        if self.input_history.last() != Some(&input) {
            self.input_history.push(input);
        }
        self.history_pos = None;
    }

    fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            Some(0) => 0,
            Some(p) => p - 1,
            None => self.input_history.len() - 1,
        };
        self.history_pos = Some(pos);
        self.input = self.input_history[pos].clone();
        self.cursor_pos = self.input.chars().count();
    }

    fn history_next(&mut self) {
        match self.history_pos {
            Some(p) if p + 1 < self.input_history.len() => {
                self.history_pos = Some(p + 1);
                self.input = self.input_history[p + 1].clone();
            }
            _ => {
                self.history_pos = None;
                self.input.clear();
            }
        }
        self.cursor_pos = self.input.chars().count();
    }
}

pub async fn run_tui(settings: Settings, theme_name: &str, file: Option<PathBuf>) -> Result<()> {
    let document = match file {
        Some(path) => Document::open(path)?,
        None => Document::new(),
    };
    let document = SharedDocument::new(document);

    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let extension = Arc::new(Extension::activate(
        &settings,
        Arc::new(TuiSurfaceFactory::new(ui_tx.clone())),
        Arc::new(document.clone()),
        Arc::new(TuiNotifier::new(ui_tx)),
    ));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = AppState::new(&settings, theme_name, document, extension.clone(), ui_rx);
    let result = event_loop(&mut terminal, &mut state);

    extension.deactivate();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, state: &mut AppState) -> Result<()> {
    loop {
        // Draw
        terminal.draw(|f| draw_ui(f, state))?;

        // Process surface and notifier events (non-blocking)
        state.pump_ui_events();

        // Handle keyboard input with timeout
        if event::poll(std::time::Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                handle_key(state, key);
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

fn handle_ui_event(state: &mut AppState, event: UiEvent) {
    match event {
        UiEvent::SurfaceCreated { id, dispose } => {
            if let Some(old) = state.panel.take() {
                state.retire_panel(old);
            }
            let view = state.new_view();
            state.panel = Some(PanelState {
                id,
                dispose,
                view,
                scroll_offset: usize::MAX,
                max_scroll: 0,
            });
            state.focus = Focus::Input;
            state.set_status("Conversation panel open");
        }
        UiEvent::Answer { id, message } => {
            if let Some(panel) = state.panel.as_mut().filter(|p| p.id == id) {
                panel.view.receive(message);
                panel.scroll_offset = usize::MAX;
                return;
            }
            // Posted to a surface the UI never adopted; hand it back so it
            // is buffered instead of lost.
            tracing::debug!("Answer for closed surface {id}, re-routing");
            if let Delivery::Buffered = state.extension.session().deliver_answer(message.text) {
                let pending = state.extension.session().pending_len();
                state.set_status(format!("{pending} answer(s) waiting. /open to read"));
            }
        }
        UiEvent::Reveal { id } => {
            if state.panel.as_ref().is_some_and(|p| p.id == id) {
                state.focus = Focus::Input;
                state.set_status("Conversation panel focused");
            }
        }
        UiEvent::Notice { level, text } => {
            state.status_text = text;
            state.status_level = level;
        }
    }
}

// ── Drawing ─────────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
    // Main vertical layout: panes + input + status
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // document + panel
            Constraint::Length(3), // input
            Constraint::Length(1), // status
        ])
        .split(f.area());

    if state.panel.is_some() {
        let h_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);
        draw_document(f, h_chunks[0], state);
        draw_panel(f, h_chunks[1], state);
    } else {
        draw_document(f, main_chunks[0], state);
    }

    draw_input(f, main_chunks[1], state);
    draw_status_bar(f, main_chunks[2], state);

    if let Some(ref text) = state.popup {
        draw_popup(f, text, &state.theme);
    }
}

const GUTTER: usize = 5;

fn draw_document(f: &mut ratatui::Frame, area: Rect, state: &mut AppState) {
    // Typing runs lock the inserter before the document; never the reverse.
    let typing = state.extension.typing().is_running();
    let theme = &state.theme;
    let doc = state.document.lock();
    let visible_height = area.height.saturating_sub(2) as usize;
    let (cursor_line, cursor_col) = doc.cursor_line_col();

    // Keep the cursor line in view
    if cursor_line < state.doc_scroll {
        state.doc_scroll = cursor_line;
    } else if visible_height > 0 && cursor_line >= state.doc_scroll + visible_height {
        state.doc_scroll = cursor_line + 1 - visible_height;
    }

    let selection = doc.selection_range();
    let focused = state.focus == Focus::Document;
    let last = doc.len_lines().min(state.doc_scroll + visible_height);

    let mut lines = Vec::with_capacity(visible_height);
    for idx in state.doc_scroll..last {
        let text = doc.line(idx);
        let mut spans = vec![Span::styled(
            format!("{:>width$} ", idx + 1, width = GUTTER - 1),
            Style::default().fg(theme.muted),
        )];

        let base = if focused && idx == cursor_line {
            Style::default().fg(theme.fg).bg(theme.cursor_line_bg)
        } else {
            Style::default().fg(theme.fg)
        };

        let start = doc.line_start(idx);
        let len = text.chars().count();
        match selection {
            Some((s, e)) if s < start + len.max(1) && e > start => {
                let from = s.saturating_sub(start).min(len);
                let to = (e - start).min(len);
                let chars: Vec<char> = text.chars().collect();
                spans.push(Span::styled(chars[..from].iter().collect::<String>(), base));
                spans.push(Span::styled(
                    chars[from..to].iter().collect::<String>(),
                    base.bg(theme.selection_bg),
                ));
                spans.push(Span::styled(chars[to..].iter().collect::<String>(), base));
            }
            _ => spans.push(Span::styled(text, base)),
        }
        lines.push(Line::from(spans));
    }

    let mut title = format!(" {} ", doc.title());
    if typing {
        title.push_str("(typing...) ");
    }

    let border = if focused { theme.accent } else { theme.border };
    let pane = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(pane, area);

    if focused {
        let x = area.x + 1 + (GUTTER + cursor_col) as u16;
        let y = area.y + 1 + (cursor_line - state.doc_scroll) as u16;
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor_position((x.min(max_x), y));
    }
}

fn draw_panel(f: &mut ratatui::Frame, area: Rect, state: &mut AppState) {
    let theme = &state.theme;
    let Some(panel) = state.panel.as_mut() else {
        return;
    };

    let chat_lines = build_chat_lines(panel.view.turns(), theme);
    let total_lines = chat_lines.len();

    // Calculate visible height (area height - 2 for borders)
    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);

    // Resolve scroll_to_bottom, then clamp
    if panel.scroll_offset == usize::MAX || panel.scroll_offset > max_scroll {
        panel.scroll_offset = max_scroll;
    }
    panel.max_scroll = max_scroll;

    let pending = state.extension.session().pending_len();
    let title = if pending > 0 {
        format!(" Chatbot ({pending} pending) ")
    } else {
        " Chatbot ".to_string()
    };

    let chat = Paragraph::new(Text::from(chat_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(theme.border)),
        )
        .wrap(Wrap { trim: false })
        .scroll((panel.scroll_offset as u16, 0));
    f.render_widget(chat, area);

    if total_lines > visible_height {
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(panel.scroll_offset);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("^"))
                .end_symbol(Some("v")),
            area,
            &mut scrollbar_state,
        );
    }
}

fn build_chat_lines(turns: &[Turn], theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if turns.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Ask a question and press Enter.",
            Style::default().fg(theme.muted),
        )));
    }
    for turn in turns {
        match turn.sender {
            Sender::User => lines.extend(render_user_lines(&turn.text, theme)),
            Sender::Bot => lines.extend(render_bot_lines(&turn.text, theme)),
        }
        lines.push(Line::raw(""));
    }
    lines
}

fn render_user_lines(text: &str, theme: &Theme) -> Vec<Line<'static>> {
    let prefix = "You > ";
    let indent = " ".repeat(prefix.len());
    text.lines()
        .enumerate()
        .map(|(i, raw)| {
            let lead = if i == 0 {
                Span::styled(
                    prefix,
                    Style::default()
                        .fg(theme.user_color)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(indent.clone())
            };
            Line::from(vec![
                lead,
                Span::styled(raw.to_string(), Style::default().fg(theme.user_color)),
            ])
        })
        .collect()
}

/// Bot turns go through the markdown renderer; code blocks are numbered so
/// `/copy n` can refer to them.
fn render_bot_lines(text: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        "Bot >",
        Style::default()
            .fg(theme.bot_color)
            .add_modifier(Modifier::BOLD),
    ))];
    let body = Style::default().fg(theme.fg);
    let mut code_index = 0;

    for block in markdown::render(text) {
        match block {
            MdBlock::Heading { level, text } => lines.push(Line::from(Span::styled(
                format!("  {} {text}", "#".repeat(level as usize)),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))),
            MdBlock::Paragraph(text) => {
                for raw in text.lines() {
                    lines.push(Line::from(Span::styled(format!("  {raw}"), body)));
                }
            }
            MdBlock::ListItem {
                depth,
                ordinal,
                text,
            } => {
                let bullet = match ordinal {
                    Some(n) => format!("{n}."),
                    None => "•".to_string(),
                };
                let indent = "  ".repeat(depth + 1);
                for (i, raw) in text.lines().enumerate() {
                    let lead = if i == 0 {
                        format!("{indent}{bullet} ")
                    } else {
                        " ".repeat(indent.len() + bullet.chars().count() + 1)
                    };
                    lines.push(Line::from(vec![
                        Span::styled(lead, Style::default().fg(theme.accent)),
                        Span::styled(raw.to_string(), body),
                    ]));
                }
            }
            MdBlock::Code(code) => {
                code_index += 1;
                let label = code.language.as_deref().unwrap_or("code");
                lines.push(Line::from(Span::styled(
                    format!("  ┌─ [{code_index}] {label}"),
                    Style::default().fg(theme.muted),
                )));
                for raw in code.code.lines() {
                    lines.push(Line::from(vec![
                        Span::styled("  │ ", Style::default().fg(theme.muted)),
                        Span::styled(raw.to_string(), Style::default().fg(theme.code_fg)),
                    ]));
                }
                lines.push(Line::from(Span::styled(
                    "  └─",
                    Style::default().fg(theme.muted),
                )));
            }
            MdBlock::Rule => lines.push(Line::from(Span::styled(
                "  ────────────────",
                Style::default().fg(theme.muted),
            ))),
        }
    }
    lines
}

fn draw_input(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let focused = state.focus == Focus::Input;

    let title = if !focused {
        " Input  Tab to return "
    } else if state.input.starts_with('/') {
        " Command "
    } else if state.panel.is_some() {
        " Message  Esc closes the panel "
    } else {
        " Input  /help for commands "
    };

    let border = if state.input.starts_with('/') {
        theme.accent
    } else {
        theme.border
    };
    let input_style = if focused {
        Style::default().fg(theme.fg)
    } else {
        Style::default().fg(theme.muted)
    };

    let input = Paragraph::new(state.input.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        )
        .style(input_style);
    f.render_widget(input, area);

    if focused && state.popup.is_none() {
        let cursor_x = area.x + state.cursor_pos as u16 + 1;
        // Clamp cursor to area width
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor_position((cursor_x.min(max_x), area.y + 1));
    }
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let session = state.extension.session();
    let typing = state.extension.typing();

    let panel_str = if session.is_open() { "panel" } else { "no panel" };
    let typing_str = format!(
        "template {}/{}",
        typing.index(),
        typing.template().chars().count()
    );
    let status_color = match state.status_level {
        NoticeLevel::Info => theme.muted,
        NoticeLevel::Error => theme.error,
    };

    let status_spans = vec![
        Span::styled(
            " chatbot ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("| {panel_str} "), Style::default().fg(theme.accent)),
        Span::styled(format!("| {typing_str} "), Style::default().fg(theme.muted)),
        Span::styled("| ", Style::default().fg(theme.muted)),
        Span::styled(state.status_text.clone(), Style::default().fg(status_color)),
    ];
    f.render_widget(Paragraph::new(Line::from(status_spans)), area);
}

fn draw_popup(f: &mut ratatui::Frame, text: &str, theme: &Theme) {
    let area = centered_rect(70, 80, f.area());
    f.render_widget(Clear, area);
    let popup = Paragraph::new(text.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Esc to close ")
                .border_style(Style::default().fg(theme.accent)),
        )
        .style(Style::default().fg(theme.fg))
        .wrap(Wrap { trim: false });
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

// ── Keys ────────────────────────────────────────────────────────────────

fn handle_key(state: &mut AppState, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                state.should_quit = true;
                return;
            }
            KeyCode::Char('s') => {
                save_document(state);
                return;
            }
            _ => {}
        }
    }

    if state.popup.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            state.popup = None;
        }
        return;
    }

    if key.code == KeyCode::Tab {
        state.focus = match state.focus {
            Focus::Input => Focus::Document,
            Focus::Document => Focus::Input,
        };
        return;
    }

    match key.code {
        KeyCode::PageUp => {
            if let Some(panel) = state.panel.as_mut() {
                panel.scroll_offset = panel.scroll_offset.min(panel.max_scroll).saturating_sub(10);
            }
            return;
        }
        KeyCode::PageDown => {
            if let Some(panel) = state.panel.as_mut() {
                panel.scroll_offset = panel.scroll_offset.saturating_add(10);
            }
            return;
        }
        _ => {}
    }

    match state.focus {
        Focus::Input => handle_input_key(state, key),
        Focus::Document => handle_document_key(state, key),
    }
}

fn handle_document_key(state: &mut AppState, key: KeyEvent) {
    let extend = key.modifiers.contains(KeyModifiers::SHIFT);
    let mut doc = state.document.lock();
    match key.code {
        KeyCode::Esc => state.focus = Focus::Input,
        KeyCode::Char(c) => doc.type_char(c),
        KeyCode::Enter => doc.type_char('\n'),
        KeyCode::Backspace => doc.backspace(),
        KeyCode::Delete => doc.delete(),
        KeyCode::Left => doc.move_left(extend),
        KeyCode::Right => doc.move_right(extend),
        KeyCode::Up => doc.move_up(extend),
        KeyCode::Down => doc.move_down(extend),
        KeyCode::Home => doc.move_home(extend),
        KeyCode::End => doc.move_end(extend),
        _ => {}
    }
}

fn handle_input_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let input = std::mem::take(&mut state.input);
            state.cursor_pos = 0;
            let input = input.trim().to_string();
            if input.is_empty() {
                return;
            }
            state.push_history(input.clone());

            match commands::handle_command(&input) {
                CommandResult::NotACommand => submit_chat(state, &input),
                result => handle_command_result(state, result),
            }
        }
        KeyCode::Esc => {
            if state.input.is_empty() {
                state.close_panel();
            } else {
                state.input.clear();
                state.cursor_pos = 0;
            }
        }
        KeyCode::Char(c) => {
            let at = byte_index(&state.input, state.cursor_pos);
            state.input.insert(at, c);
            state.cursor_pos += 1;
        }
        KeyCode::Backspace => {
            if state.cursor_pos > 0 {
                state.cursor_pos -= 1;
                let at = byte_index(&state.input, state.cursor_pos);
                state.input.remove(at);
            }
        }
        KeyCode::Delete => {
            if state.cursor_pos < state.input.chars().count() {
                let at = byte_index(&state.input, state.cursor_pos);
                state.input.remove(at);
            }
        }
        KeyCode::Left => state.cursor_pos = state.cursor_pos.saturating_sub(1),
        KeyCode::Right => {
            state.cursor_pos = (state.cursor_pos + 1).min(state.input.chars().count());
        }
        KeyCode::Home => state.cursor_pos = 0,
        KeyCode::End => state.cursor_pos = state.input.chars().count(),
        KeyCode::Up => state.history_prev(),
        KeyCode::Down => state.history_next(),
        _ => {}
    }
}

fn byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn submit_chat(state: &mut AppState, text: &str) {
    let Some(panel) = state.panel.as_mut() else {
        state.set_error("The conversation panel is closed. /open to start one");
        return;
    };
    let Some(submission) = panel.view.submit(text) else {
        return;
    };
    panel.scroll_offset = usize::MAX;

    if let Err(e) = state
        .extension
        .session()
        .submit_user_text(&submission.text)
    {
        state.set_error(e.to_string());
    }
}

fn handle_command_result(state: &mut AppState, result: CommandResult) {
    match result {
        CommandResult::Message(text) => {
            if text.contains('\n') {
                state.popup = Some(text);
            } else {
                state.set_status(text);
            }
        }
        CommandResult::Quit => state.should_quit = true,
        CommandResult::Run(command) => state.run_command(command),
        CommandResult::RunId(id) => {
            let extension = state.extension.clone();
            tokio::spawn(async move { extension.execute_id(&id).await });
        }
        CommandResult::ClosePanel => {
            if state.panel.is_some() {
                state.close_panel();
            } else {
                state.set_status("The conversation panel is not open");
            }
        }
        CommandResult::ClearHistory => {
            if let Some(ref store) = state.view_store {
                if let Err(e) = store.clear() {
                    state.set_error(format!("Could not clear the transcript: {e}"));
                    return;
                }
            }
            let view = state.new_view();
            if let Some(panel) = state.panel.as_mut() {
                panel.view = view;
                panel.scroll_offset = usize::MAX;
            }
            state.set_status("Transcript cleared");
        }
        CommandResult::Copy(n) => copy_code_block(state, n),
        CommandResult::SaveDocument => save_document(state),
        CommandResult::SelectLines(from, to) => {
            state.document.lock().select_lines(from, to);
            state.set_status(format!("Selected lines {from}-{to}"));
        }
        CommandResult::ThemeChanged(name) => {
            if Theme::all_names().contains(&name.as_str()) {
                state.theme = Theme::by_name(&name);
                state.set_status(format!("Theme: {name}"));
            } else {
                state.set_error(format!("Unknown theme: {name}"));
            }
        }
        CommandResult::NotACommand => {}
    }
}

fn save_document(state: &mut AppState) {
    let saved = state.document.lock().save();
    match saved {
        Ok(path) => state.set_status(format!("Saved {}", path.display())),
        Err(e) => state.set_error(format!("Save failed: {e}")),
    }
}

fn copy_code_block(state: &mut AppState, n: Option<usize>) {
    let Some(answer) = state
        .panel
        .as_ref()
        .and_then(|p| p.view.last_bot_turn())
        .map(|t| t.text.clone())
    else {
        state.set_error("No answer to copy from");
        return;
    };

    let blocks = markdown::code_blocks(&answer);
    let index = n.unwrap_or(blocks.len());
    let Some(block) = index.checked_sub(1).and_then(|i| blocks.get(i)) else {
        state.set_error(format!(
            "No code block {index} in the last answer ({} found)",
            blocks.len()
        ));
        return;
    };

    match arboard::Clipboard::new().and_then(|mut c| c.set_text(block.code.clone())) {
        Ok(()) => state.set_status(format!("Copied code block {index}")),
        Err(e) => state.set_error(format!("Clipboard unavailable: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbot_core::constants::prompts::ERROR_PREFIX;
    use tempfile::TempDir;

    fn theme() -> Theme {
        Theme::dark()
    }

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_bot_lines_number_code_blocks() {
        let lines = render_bot_lines("Intro\n\n```python\nx = 1\n```\n\n```\ny\n```", &theme());
        let text = plain(&lines);
        assert_eq!(text[0], "Bot >");
        assert!(text.contains(&"  Intro".to_string()));
        assert!(text.contains(&"  ┌─ [1] python".to_string()));
        assert!(text.contains(&"  │ x = 1".to_string()));
        assert!(text.contains(&"  ┌─ [2] code".to_string()));
    }

    #[test]
    fn test_user_lines_keep_prefix_on_first_line_only() {
        let text = plain(&render_user_lines("a\nb", &theme()));
        assert_eq!(text, vec!["You > a".to_string(), "      b".to_string()]);
    }

    #[test]
    fn test_empty_transcript_has_hint() {
        let lines = build_chat_lines(&[], &theme());
        assert_eq!(lines.len(), 1);
    }

    fn app_with_store(dir: &TempDir) -> AppState {
        let mut settings = Settings::default();
        settings.view.persist_history = false;
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let document = SharedDocument::new(Document::new());
        let extension = Arc::new(Extension::activate(
            &settings,
            Arc::new(TuiSurfaceFactory::new(ui_tx.clone())),
            Arc::new(document.clone()),
            Arc::new(TuiNotifier::new(ui_tx)),
        ));
        let mut state = AppState::new(&settings, "dark", document, extension, ui_rx);
        state.view_store = Some(ViewStateStore::with_path(dir.path().join("state.json")));
        state
    }

    fn bot_texts(state: &AppState) -> Vec<String> {
        let panel = state.panel.as_ref().unwrap();
        panel
            .view
            .turns()
            .iter()
            .filter(|t| t.is_bot())
            .map(|t| t.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_answers_keep_completion_order_across_close() {
        let dir = TempDir::new().unwrap();
        let mut state = app_with_store(&dir);
        let extension = state.extension.clone();

        extension.session().open().unwrap();
        state.pump_ui_events();
        assert!(state.panel.is_some());

        // Posted to the panel but not yet drawn when it is closed.
        assert_eq!(extension.session().deliver_answer("A"), Delivery::Shown);
        state.close_panel();
        assert!(state.panel.is_none());

        assert_eq!(extension.session().deliver_answer("B"), Delivery::Buffered);
        state.pump_ui_events();

        extension.session().open().unwrap();
        state.pump_ui_events();

        assert_eq!(bot_texts(&state), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(extension.session().pending_len(), 0);
    }

    #[tokio::test]
    async fn test_replacing_panel_keeps_its_posted_answers() {
        let dir = TempDir::new().unwrap();
        let mut state = app_with_store(&dir);
        let extension = state.extension.clone();

        extension.session().open().unwrap();
        state.pump_ui_events();
        extension.session().deliver_answer("A");
        // The host drops the surface; the UI only learns of it on reopen.
        assert!(extension.session().close());
        extension.session().open().unwrap();
        state.pump_ui_events();

        assert_eq!(state.panel.as_ref().unwrap().id, 2);
        assert_eq!(bot_texts(&state), vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn test_single_prompt_failure_is_returned() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut settings = Settings::default();
        settings.transport.url = format!("http://{}/ask", listener.local_addr().unwrap());
        drop(listener);

        let err = run_single_prompt(&settings, "hi").await.unwrap_err();
        assert!(err.to_string().starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_byte_index_handles_multibyte() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("héllo", 99), 6);
    }
}
