//! Terminal setup, event loop and drawing.

use crate::app::{EntryKind, Form, TuiApp};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::io;
use std::time::Duration;

/// Worker events are drained at this interval.
const TICK: Duration = Duration::from_millis(100);

const ACCENT: Color = Color::Rgb(120, 170, 255);
const DIM: Color = Color::Rgb(110, 110, 130);

/// Restores the terminal even when the loop bails out early.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        execute!(io::stdout(), LeaveAlternateScreen).ok();
    }
}

pub fn run(app: &mut TuiApp) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.draw(|frame| draw(frame, app))?;

    loop {
        let mut redraw = app.tick();

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        break;
                    }
                    redraw = true;
                }
                Event::Resize(_, _) => redraw = true,
                _ => {}
            }
        }

        if redraw {
            terminal.draw(|frame| draw(frame, app))?;
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame<'_>, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_log(frame, app, chunks[0]);
    draw_input(frame, app, chunks[1]);
    draw_status(frame, app, chunks[2]);

    if app.picker().is_some() {
        draw_picker(frame, app);
    }
    if let Some(form) = app.form() {
        draw_form(frame, form);
    }
}

fn draw_log(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();

    for entry in app.log() {
        let (label, style) = match entry.kind {
            EntryKind::User => ("You", Style::default().fg(Color::Green)),
            EntryKind::Reply => ("AI", Style::default().fg(ACCENT)),
            EntryKind::Analysis => ("Analysis", Style::default().fg(Color::Yellow)),
            EntryKind::System => ("", Style::default().fg(DIM)),
            EntryKind::Error => ("!", Style::default().fg(Color::Red)),
        };
        let text = if label.is_empty() {
            entry.text.clone()
        } else {
            format!("{label}: {}", entry.text)
        };
        for wrapped in wrap_text(&text, width) {
            lines.push(Line::from(Span::styled(wrapped, style)));
        }
        lines.push(Line::from(""));
    }

    let height = area.height.saturating_sub(2) as usize;
    let bottom = lines.len().saturating_sub(height);
    let offset = bottom.saturating_sub(app.scroll_back() as usize);

    let log = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT))
                .title(Span::styled(
                    " duet ",
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                )),
        )
        .scroll((offset.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(log, area);
}

fn draw_input(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let (title, style) = if app.is_busy() {
        (" Waiting for reply... ", Style::default().fg(DIM))
    } else {
        (" Message ", Style::default().fg(Color::White))
    };

    let input = Paragraph::new(app.input()).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(ACCENT))
            .title(title)
            .title_bottom(Line::from(vec![
                key_hint("Enter"),
                Span::styled("send  ", Style::default().fg(DIM)),
                key_hint("Ctrl+L"),
                Span::styled("clear  ", Style::default().fg(DIM)),
                key_hint("Ctrl+T"),
                Span::styled("voice on/off  ", Style::default().fg(DIM)),
                key_hint("F2"),
                Span::styled("pick voice  ", Style::default().fg(DIM)),
                key_hint("F3"),
                Span::styled("keys  ", Style::default().fg(DIM)),
                key_hint("F4"),
                Span::styled("preferences  ", Style::default().fg(DIM)),
                key_hint("Esc"),
                Span::styled("quit ", Style::default().fg(DIM)),
            ])),
    );
    frame.render_widget(input, area);

    if !app.is_busy() && app.picker().is_none() && app.form().is_none() {
        let inner_width = area.width.saturating_sub(2);
        let typed = app.input().chars().count().min(u16::MAX as usize) as u16;
        frame.set_cursor(area.x + 1 + typed.min(inner_width), area.y + 1);
    }
}

fn key_hint(key: &str) -> Span<'static> {
    Span::styled(
        format!(" {key} "),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )
}

fn draw_status(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let voice = match app.voice() {
        Some(voice) => voice.display_name().to_string(),
        None => "none".to_string(),
    };
    let speech = if app.speech_enabled() { "on" } else { "off" };
    let status = Line::from(vec![
        Span::styled(format!(" {} ", app.status()), Style::default().fg(Color::White)),
        Span::styled(
            format!(" | voice: {voice} | speech: {speech}"),
            Style::default().fg(DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

fn draw_picker(frame: &mut Frame<'_>, app: &TuiApp) {
    let Some(picker) = app.picker() else {
        return;
    };
    let area = centered(frame.size(), 70, 60);

    let items: Vec<ListItem> = picker
        .voices
        .iter()
        .map(|voice| {
            ListItem::new(format!(
                "{} - {}",
                voice.display_name(),
                voice.sample_preview(50)
            ))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Voices (Enter pick, Esc skip) "),
        )
        .highlight_style(Style::default().bg(ACCENT).fg(Color::Black))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(picker.selected));
    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_form(frame: &mut Frame<'_>, form: &Form) {
    let screen = frame.size();
    // Label, value and a spacer per field, plus the borders.
    let wanted = form.fields.len() as u16 * 3 + 1;
    let area = centered_rows(screen, 70, wanted);
    let inner_width = area.width.saturating_sub(4) as usize;

    let mut lines = Vec::new();
    for (index, field) in form.fields.iter().enumerate() {
        let focused = index == form.focused;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DIM)
        };
        lines.push(Line::from(Span::styled(field.label, label_style)));
        lines.push(Line::from(vec![
            Span::styled(if focused { "> " } else { "  " }, label_style),
            Span::raw(tail(&display_value(field.value.as_str(), field.masked), inner_width)),
        ]));
        lines.push(Line::from(""));
    }

    let popup = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Yellow))
            .title(form.title())
            .title_bottom(Line::from(vec![
                key_hint("Tab"),
                Span::styled("next  ", Style::default().fg(DIM)),
                key_hint("Enter"),
                Span::styled("next/save  ", Style::default().fg(DIM)),
                key_hint("Esc"),
                Span::styled("cancel ", Style::default().fg(DIM)),
            ])),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);

    if let Some(field) = form.fields.get(form.focused) {
        let typed = field.value.chars().count().min(inner_width) as u16;
        let row = area.y + 2 + form.focused as u16 * 3;
        if row < area.y + area.height.saturating_sub(1) {
            frame.set_cursor(area.x + 3 + typed, row);
        }
    }
}

fn display_value(value: &str, masked: bool) -> String {
    if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    }
}

/// The last `width` characters, so the end being typed stays visible.
fn tail(text: &str, width: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(width)).collect()
}

fn centered_rows(area: Rect, percent_x: u16, rows: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = rows.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Hard-wraps `text` to `width` characters per line, keeping explicit newlines.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for raw in text.lines() {
        let chars: Vec<char> = raw.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            lines.push(chunk.iter().collect());
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("xy", 0), vec!["x", "y"]);
    }

    #[test]
    fn test_masked_values_and_tail() {
        assert_eq!(display_value("sk-123", true), "******");
        assert_eq!(display_value("nurse", false), "nurse");
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 5), "ab");
    }

    #[test]
    fn test_centered_rows_clamps_height() {
        let outer = Rect::new(0, 0, 100, 10);
        assert_eq!(centered_rows(outer, 70, 13), Rect::new(15, 0, 70, 10));
        assert_eq!(centered_rows(outer, 70, 4), Rect::new(15, 3, 70, 4));
    }

    #[test]
    fn test_centered_fits() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered(outer, 70, 60);
        assert_eq!(inner, Rect::new(15, 8, 70, 24));
    }
}
