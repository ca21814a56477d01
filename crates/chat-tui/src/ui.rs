use chat_core::{CreatedBy, Message};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, NoticeLevel};

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const HINT: &str = "Enter send · Esc clear · PgUp/PgDn scroll · Ctrl-C quit";

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    let (chat_area, input_area, status_area) = (chunks[0], chunks[1], chunks[2]);

    draw_history(f, app, chat_area);
    draw_input(f, app, input_area);
    draw_status(f, app, status_area);

    if app.is_loading() {
        draw_loading(f, app, chat_area);
    }
}

fn draw_history(f: &mut Frame, app: &mut App, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines = history_lines(app.thread.messages(), inner_width);
    let offset = app.scroll.settle(lines.len(), inner_height);
    // Only the visible window goes to the widget; its row counters are u16.
    let visible: Vec<Line> = lines.into_iter().skip(offset).take(inner_height).collect();

    let history = Paragraph::new(visible)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(match app.scroll.is_following() {
                    true => format!("Chat · {}", app.endpoint),
                    false => format!("Chat · {} (scrolled)", app.endpoint),
                }),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(history, area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let scroll = app.input.visual_scroll(width);

    let input = Paragraph::new(app.input.value())
        .style(match app.is_loading() {
            true => Style::default().fg(Color::DarkGray),
            false => Style::default().fg(Color::Yellow),
        })
        .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX)))
        .block(Block::default().borders(Borders::ALL).title("Input"));

    f.render_widget(input, area);

    if !app.is_loading() {
        let column = app.input.visual_cursor().saturating_sub(scroll);
        f.set_cursor(
            area.x + 1 + u16::try_from(column).unwrap_or(u16::MAX),
            area.y + 1,
        );
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let status = match &app.notice {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            Paragraph::new(notice.text.as_str()).style(Style::default().fg(color))
        }
        None => Paragraph::new(HINT).style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(status, area);
}

fn draw_loading(f: &mut Frame, app: &App, area: Rect) {
    let frame = SPINNER[app.ticks % SPINNER.len()];
    let popup = centered(area, 28, 3);

    let spinner = Paragraph::new(format!("{frame} waiting for answer"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(Clear, popup);
    f.render_widget(spinner, popup);
}

/// Renders the thread into pre-wrapped lines so the total height is known
/// before scrolling.
pub fn history_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (i, m) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }

        let (label, color, alignment) = match m.created_by {
            CreatedBy::User => ("You", Color::Yellow, Alignment::Right),
            CreatedBy::ChatBot => ("Bot", Color::Cyan, Alignment::Left),
        };

        lines.push(
            Line::from(vec![
                Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(" · {}", m.timestamp_label()),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
            .alignment(alignment),
        );

        for row in wrap_text(&m.content, width) {
            lines.push(Line::from(row).alignment(alignment));
        }
    }

    lines
}

/// Hard-wraps `text` at `width` terminal columns, keeping explicit line
/// breaks. An empty text still occupies one row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for line in text.split('\n') {
        let mut row = String::new();
        let mut used = 0;
        for c in line.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(c);
            used += w;
        }
        rows.push(row);
    }

    rows
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chat_core::{ChatResponse, ChatTransport, Controller, TransportError};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Duration;

    struct Silent;

    #[async_trait]
    impl ChatTransport for Silent {
        async fn send(&self, _question: &str) -> Result<ChatResponse, TransportError> {
            Err(TransportError::Timeout(Duration::from_secs(1)))
        }
    }

    fn screen(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn wraps_long_lines_and_keeps_breaks() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("ab\n\ncd", 4), vec!["ab", "", "cd"]);
        assert_eq!(wrap_text("", 4), vec![""]);
        assert_eq!(wrap_text("héllo", 2), vec!["hé", "ll", "o"]);
    }

    #[test]
    fn wraps_wide_characters_by_columns() {
        assert_eq!(wrap_text("一二三", 4), vec!["一二", "三"]);
        assert_eq!(wrap_text("a一b", 2), vec!["a", "一", "b"]);
        // a double-width char never fits a single column but is still kept
        assert_eq!(wrap_text("一", 1), vec!["一"]);

        let text = "一二三四五六七八九十ABCDEFGHIJKLMNOP";
        let rows = wrap_text(text, 26);
        assert!(rows.iter().all(|r| r.chars().map(|c| c.width().unwrap_or(0)).sum::<usize>() <= 26));
        assert_eq!(rows.concat(), text);
    }

    #[test]
    fn history_has_header_and_body_per_message() {
        let messages = vec![Message::user("hello"), Message::chat_bot("hi there")];
        let lines = history_lines(&messages, 40);
        // header + body, separator, header + body
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
        assert_eq!(lines[4].alignment, Some(Alignment::Left));
    }

    #[test]
    fn renders_thread_and_loading_overlay() {
        let controller = Controller::new(Arc::new(Silent), Duration::from_secs(1));
        controller.submit_question("hello").unwrap();
        let mut app = App::new(controller, "http://localhost:8000/api/chat_bot/");
        app.sync();

        let text = screen(&mut app, 60, 16);
        assert!(text.contains("hello"));
        assert!(text.contains("waiting for answer"));
    }

    #[tokio::test]
    async fn newest_message_stays_in_view() {
        let controller = Controller::new(Arc::new(Silent), Duration::from_secs(1));
        for i in 0..12 {
            let _ = controller.ask(format!("question {i}")).await;
        }
        let mut app = App::new(controller, "local");
        app.sync();

        let text = screen(&mut app, 60, 12);
        assert!(text.contains("question 11"));
        assert!(!text.contains("question 0"));
    }

    #[tokio::test]
    async fn wide_text_is_wrapped_not_clipped() {
        let controller = Controller::new(Arc::new(Silent), Duration::from_secs(1));
        let _ = controller.ask("一二三四五六七八九十ABCDEFGHIJKLMNOP").await;
        let mut app = App::new(controller, "local");

        let text = screen(&mut app, 30, 14);
        assert!(text.contains("ABCDEF"));
        assert!(text.contains("GHIJKLMNOP"));
    }

    struct Verbose;

    #[async_trait]
    impl ChatTransport for Verbose {
        async fn send(&self, question: &str) -> Result<ChatResponse, TransportError> {
            let mut response = "row\n".repeat(70_000);
            response.push_str(&format!("END-{question}"));
            Ok(ChatResponse { response })
        }
    }

    #[tokio::test]
    async fn history_taller_than_u16_shows_newest_line() {
        let controller = Controller::new(Arc::new(Verbose), Duration::from_secs(5));
        controller.ask("q1").await.unwrap();
        let mut app = App::new(controller, "local");

        let text = screen(&mut app, 60, 14);
        assert!(text.contains("END-q1"));
        assert!(app.scroll.is_following());
    }
}
