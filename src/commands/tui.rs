use std::io;
use std::time::{Duration, Instant};

use crossterm::cursor::Show;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::block::{Position, Title};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::app::Runtime;
use crate::chat::{ChatController, ChatState, Message, Sender};
use crate::errors::CliError;
use crate::tui::handlers::{drain_chat_events, handle_event, handle_tui_msg};
use crate::tui::render::{fragment_lines, plain_lines};
use crate::tui::types::{App, Mode, TuiMsg};

const INPUT_ROWS: u16 = 3;
const SPINNER_INTERVAL_MS: u64 = 120;
const TYPING_TEXT: &str = "System is typing...";
const EMPTY_HINT: &str = "Ask Gemini anything.";

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, CliError> {
        enable_raw_mode()
            .map_err(|e| CliError::Terminal(format!("Failed to enable raw mode: {e}")))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .map_err(|e| CliError::Terminal(format!("Failed to enter alternate screen: {e}")))?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableBracketedPaste, Show, LeaveAlternateScreen);
    }
}

pub async fn handle(runtime: &Runtime) -> Result<(), CliError> {
    if runtime.output.json {
        return Err(CliError::Usage(
            "`--json` is not supported for `gemchat tui`.".to_string(),
        ));
    }

    let gateway = runtime.gateway_config()?;
    let key_present = gateway.api_key.is_some();
    let model = gateway.model;
    let controller = ChatController::from_config(gateway)?;

    let guard = TerminalGuard::enter()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| CliError::Terminal(format!("Failed to init terminal: {e}")))?;
    terminal
        .clear()
        .map_err(|e| CliError::Terminal(format!("Failed to clear terminal: {e}")))?;

    let mut app = App::new(controller, key_present, model);
    let (tx, mut rx) = mpsc::unbounded_channel::<TuiMsg>();
    info!(model, key_present, "chat screen started");

    loop {
        drain_chat_events(&mut app);
        update_spinner(&mut app);
        terminal
            .draw(|f| ui(f, &app))
            .map_err(|e| CliError::Terminal(format!("Failed to draw: {e}")))?;

        if app.should_quit {
            break;
        }

        while let Ok(msg) = rx.try_recv() {
            handle_tui_msg(&mut app, msg);
        }

        let poll_ms = if app.controller.is_busy() { 50 } else { 120 };
        if crossterm::event::poll(Duration::from_millis(poll_ms))
            .map_err(|e| CliError::Terminal(format!("Event poll failed: {e}")))?
        {
            let event = crossterm::event::read()
                .map_err(|e| CliError::Terminal(format!("Event read failed: {e}")))?;
            handle_event(&tx, &mut app, event);
        }
    }

    info!(messages = app.controller.messages().len(), "chat screen closed");
    drop(guard);
    Ok(())
}

fn ui(f: &mut Frame<'_>, app: &App) {
    let size = f.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),              // header bar
            Constraint::Min(1),                 // messages
            Constraint::Length(INPUT_ROWS + 2), // input
            Constraint::Length(1),              // status
        ])
        .split(size);

    render_header(f, layout[0]);
    f.render_widget(render_chat(app, layout[1]), layout[1]);
    render_input(f, app, layout[2]);
    f.render_widget(render_status_bar(app), layout[3]);

    if app.mode == Mode::Help {
        let area = centered_rect(60, 50, size);
        f.render_widget(Clear, area);
        f.render_widget(render_help(), area);
    }
}

fn render_header(f: &mut Frame<'_>, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let base = Style::default().fg(c_ink()).bg(c_bar());
    let left = Paragraph::new(Line::from(vec![
        Span::styled(" ✎ ", base.add_modifier(Modifier::BOLD)),
        Span::styled("New chat (Ctrl+N)", base),
    ]))
    .style(base);

    // Log in never becomes available.
    let right = Paragraph::new(Line::from(vec![Span::styled(
        " Log In ",
        Style::default()
            .fg(c_muted())
            .bg(c_bar())
            .add_modifier(Modifier::DIM),
    )]))
    .style(base)
    .alignment(Alignment::Right);

    f.render_widget(left, cols[0]);
    f.render_widget(right, cols[1]);
}

fn render_chat(app: &App, area: Rect) -> Paragraph<'static> {
    let width = area.width.saturating_sub(2).max(1) as usize;
    let height = area.height.saturating_sub(2).max(1) as usize;

    let all_lines = build_chat_lines(
        app.controller.messages(),
        width,
        app.controller.state(),
        app.spinner_step,
    );
    let total = all_lines.len();
    let max_scroll = total.saturating_sub(height);
    let scroll = app.scroll_from_bottom.min(max_scroll);
    let top = max_scroll.saturating_sub(scroll);
    let end = (top + height).min(total);

    let visible = all_lines[top..end].to_vec();

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(c_muted()))
        .title(" Chat ");
    if scroll > 0 {
        block = block.title(
            Title::from(Line::from(Span::styled(
                format!(" ↓ {scroll} more "),
                Style::default().fg(c_muted()),
            )))
            .alignment(Alignment::Right)
            .position(Position::Bottom),
        );
    }

    if app.controller.is_empty() {
        let hint = Line::from(Span::styled(EMPTY_HINT, Style::default().fg(c_muted())))
            .alignment(Alignment::Center);
        return Paragraph::new(hint).block(block);
    }

    Paragraph::new(Text::from(visible)).block(block)
}

fn build_chat_lines(
    messages: &[Message],
    width: usize,
    state: ChatState,
    spinner_step: u64,
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let bubble = (width * 4 / 5).max(1);

    for msg in messages {
        match msg.sender {
            Sender::User => {
                out.push(
                    Line::from(Span::styled(
                        "You",
                        Style::default().fg(c_ok()).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
                for line in plain_lines(&msg.content, bubble, Style::default()) {
                    out.push(line.alignment(Alignment::Right));
                }
            }
            Sender::System => {
                out.push(Line::from(Span::styled(
                    "System",
                    Style::default().fg(c_accent()).add_modifier(Modifier::BOLD),
                )));
                out.extend(fragment_lines(&msg.content, width, Style::default()));
            }
            Sender::Error => {
                let style = Style::default().fg(Color::White).bg(c_error());
                for line in plain_lines(&msg.content, bubble, style) {
                    out.push(line.alignment(Alignment::Center));
                }
            }
        }
        out.push(Line::from(""));
    }

    if state == ChatState::Awaiting {
        out.push(
            Line::from(vec![
                Span::styled(
                    format!("{} ", typing_frame(spinner_step)),
                    Style::default().fg(c_accent()),
                ),
                Span::styled(
                    TYPING_TEXT,
                    Style::default().fg(c_muted()).add_modifier(Modifier::ITALIC),
                ),
            ])
            .alignment(Alignment::Center),
        );
    }
    out
}

fn render_input(f: &mut Frame<'_>, app: &App, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let rows = INPUT_ROWS as usize;
    let text = app.input_text();
    let lines: Vec<&str> = text.split('\n').collect();

    let (cursor_row, cursor_col) = cursor_position(&app.input, app.cursor);
    let first = cursor_row.saturating_sub(rows - 1);
    let visible: Vec<Line<'static>> = lines
        .iter()
        .skip(first)
        .take(rows)
        .map(|l| Line::from(l.to_string()))
        .collect();

    let enabled = app.can_send();
    let send_style = if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(c_accent())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(c_muted()).add_modifier(Modifier::DIM)
    };

    let placeholder = app.input.is_empty();
    let body = if placeholder {
        Text::from(Line::from(Span::styled(
            "Type your message...",
            Style::default().fg(c_muted()),
        )))
    } else {
        Text::from(visible)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if enabled { c_accent() } else { c_muted() }))
        .title(
            Title::from(Line::from(Span::styled(" ↑ Send ", send_style)))
                .alignment(Alignment::Right)
                .position(Position::Bottom),
        );

    f.render_widget(Paragraph::new(body).block(block), area);

    if app.mode == Mode::Chat && inner_width > 0 {
        let col = cursor_col.min(inner_width.saturating_sub(1)) as u16;
        let row = (cursor_row - first) as u16;
        f.set_cursor_position((area.x + 1 + col, area.y + 1 + row));
    }
}

/// Row and display column of the cursor inside the multi-line input.
fn cursor_position(input: &[char], cursor: usize) -> (usize, usize) {
    let before: String = input[..cursor.min(input.len())].iter().collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().unwrap_or("").width();
    (row, col)
}

fn render_status_bar(app: &App) -> Paragraph<'static> {
    let base = Style::default().fg(Color::White).bg(c_panel());
    let status_style = if app.key_present {
        base
    } else {
        base.fg(c_warn())
    };
    Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", app.status), status_style),
        Span::styled("|", base.add_modifier(Modifier::DIM)),
        Span::styled(format!(" model: {} ", app.model), base.fg(c_accent())),
        Span::styled("|", base.add_modifier(Modifier::DIM)),
        Span::styled(" F1 help  Esc quit ", base.fg(c_muted())),
    ]))
    .style(base)
}

fn render_help() -> Paragraph<'static> {
    let lines = vec![
        Line::from(Span::styled(
            "gemchat",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Enter: send message"),
        Line::from("Alt+Enter: new line"),
        Line::from("Ctrl+N: new chat (discards this one)"),
        Line::from("PgUp/PgDn: scroll messages"),
        Line::from("Esc / Ctrl+C: quit"),
        Line::from(""),
        Line::from("Each message is sent on its own; earlier turns are not included."),
    ];

    Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("Help (Esc to close)"),
        )
        .wrap(Wrap { trim: false })
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

fn update_spinner(app: &mut App) {
    if !app.controller.is_busy() {
        return;
    }
    let now = Instant::now();
    if now.duration_since(app.spinner_last) >= Duration::from_millis(SPINNER_INTERVAL_MS) {
        app.spinner_last = now;
        app.spinner_step = app.spinner_step.wrapping_add(1);
    }
}

fn typing_frame(step: u64) -> &'static str {
    const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    FRAMES[(step % FRAMES.len() as u64) as usize]
}

fn c_accent() -> Color {
    Color::Rgb(66, 133, 244)
}

fn c_ok() -> Color {
    Color::Rgb(22, 163, 74)
}

fn c_warn() -> Color {
    Color::Rgb(245, 158, 11)
}

fn c_error() -> Color {
    Color::Rgb(220, 38, 38)
}

fn c_muted() -> Color {
    Color::Rgb(100, 116, 139)
}

fn c_ink() -> Color {
    Color::Rgb(55, 55, 60)
}

fn c_bar() -> Color {
    Color::Rgb(250, 250, 247)
}

fn c_panel() -> Color {
    Color::Rgb(30, 30, 40)
}
