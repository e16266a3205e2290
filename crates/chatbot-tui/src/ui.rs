use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use chatbot_core::{ChatMessage, ChatRole, ConnectionStatus};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use crate::app::App;

const SETTINGS_HEIGHT: u16 = 6;
const MIN_COMPOSER_ROWS: u16 = 2;
const MAX_COMPOSER_ROWS: u16 = 6;

/// Greedy word wrap by display width, so wide (CJK, emoji) characters
/// never overflow a row. Words wider than `width` are split.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width == 0 || line.width() <= width {
        return vec![line.to_string()];
    }

    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;

    for (i, word) in line.split(' ').enumerate() {
        // The space between two words is dropped when the row breaks there
        if i > 0 {
            if row_width > 0 && row_width + 1 + word.width() > width {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            } else {
                row.push(' ');
                row_width += 1;
            }
        }

        for c in word.chars() {
            let char_width = c.width().unwrap_or(0);
            if row_width > 0 && row_width + char_width > width {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(c);
            row_width += char_width;
        }
    }
    rows.push(row);
    rows
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let composer_rows = (app.input.split('\n').count() as u16).clamp(MIN_COMPOSER_ROWS, MAX_COMPOSER_ROWS);
    let settings_height = if app.show_settings { SETTINGS_HEIGHT } else { 0 };

    let [header_area, settings_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(settings_height),
        Constraint::Min(0),
        Constraint::Length(composer_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    if app.show_settings {
        render_settings(app, frame, settings_area);
    }
    render_transcript(app, frame, chat_area);
    render_composer(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if let Some(message) = &app.alert {
        render_alert(message, frame, area);
    }
}

fn status_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Error => Color::Red,
        ConnectionStatus::Checking => Color::Yellow,
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = app.session.status();

    let title = Line::from(vec![
        Span::styled(" Groq ChatBot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Powered by LLaMA 3", Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled("Backend: ", Style::default().fg(Color::Gray)),
        Span::styled(status.display_name(), Style::default().fg(status_color(status)).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_settings(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Settings ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [label_area, field_area, help_area, action_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new("Backend URL").style(Style::default().fg(Color::Gray)),
        label_area,
    );

    // Keep the cursor visible in a URL longer than the field
    let width = field_area.width as usize;
    let scroll_offset = if width > 0 && app.url_cursor >= width {
        app.url_cursor - width + 1
    } else {
        0
    };
    let visible_url: String = app.url_input.chars().skip(scroll_offset).take(width).collect();
    frame.render_widget(
        Paragraph::new(visible_url).style(Style::default().fg(Color::Cyan)),
        field_area,
    );

    frame.render_widget(
        Paragraph::new("Make sure your backend is running on this URL")
            .style(Style::default().fg(Color::DarkGray)),
        help_area,
    );

    let status = app.session.status();
    let action = Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::White).bold()),
        Span::raw(" test connection  "),
        Span::styled("Esc", Style::default().fg(Color::White).bold()),
        Span::raw(" close  "),
        Span::styled(status.display_name(), Style::default().fg(status_color(status))),
    ]);
    frame.render_widget(Paragraph::new(action), action_area);

    if app.alert.is_none() {
        let cursor_x = (app.url_cursor - scroll_offset) as u16;
        frame.set_cursor_position((field_area.x + cursor_x, field_area.y));
    }
}

fn empty_state_lines(status: ConnectionStatus) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::default(),
        Line::default(),
        Line::from(Span::styled(
            "Start a conversation!",
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Ask me anything and I'll help you out.",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if !status.is_connected() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "⚠️ Backend not connected. Check settings.",
            Style::default().fg(Color::Red),
        )));
    }

    lines.into_iter().map(|line| line.alignment(Alignment::Center)).collect()
}

fn message_lines(msg: &ChatMessage, width: usize, lines: &mut Vec<Line<'static>>) {
    let rows = msg.content.lines().flat_map(|line| wrap_line(line, width));

    match msg.role {
        ChatRole::User => {
            lines.push(
                Line::from(Span::styled(
                    "You",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Right),
            );
            for row in rows {
                lines.push(
                    Line::from(Span::styled(row, Style::default().fg(Color::Cyan)))
                        .alignment(Alignment::Right),
                );
            }
        }
        ChatRole::Assistant if msg.is_error => {
            lines.push(Line::from(Span::styled(
                "Assistant",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            for row in rows {
                lines.push(Line::from(Span::styled(row, Style::default().fg(Color::LightRed))));
            }
        }
        ChatRole::Assistant => {
            lines.push(Line::from(Span::styled(
                "Assistant",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            for row in rows {
                lines.push(Line::from(Span::raw(row)));
            }
        }
    }
    lines.push(Line::default());
}

/// The transcript as display rows, already wrapped to `width`
pub fn transcript_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let messages = app.session.messages();
    let loading = app.session.is_loading();

    if messages.is_empty() && !loading {
        return empty_state_lines(app.session.status());
    }

    let mut lines = Vec::new();
    for msg in messages {
        message_lines(msg, width, &mut lines);
    }

    if loading {
        lines.push(Line::from(Span::styled(
            "Assistant",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat ({}) ", app.session.messages().len()));
    let inner = block.inner(area);

    let lines = transcript_lines(app, inner.width as usize);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);

    app.chat_page = inner.height;
    app.max_chat_scroll = total.saturating_sub(inner.height);
    app.chat_scroll = if app.stick_to_bottom {
        app.max_chat_scroll
    } else {
        app.chat_scroll.min(app.max_chat_scroll)
    };

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Row and display column of a char cursor within multi-line text
fn cursor_row_col(text: &str, cursor: usize) -> (usize, usize) {
    let before: String = text.chars().take(cursor).collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map(|l| l.width()).unwrap_or(0);
    (row, col)
}

fn render_composer(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.session.is_loading();
    let focused = !loading && !app.show_settings && app.alert.is_none();

    let (border_color, title) = if loading {
        (Color::DarkGray, " Waiting for reply... ")
    } else if focused {
        (Color::Yellow, " Message ")
    } else {
        (Color::DarkGray, " Message ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);
    let inner = block.inner(area);

    if app.input.is_empty() {
        let placeholder = Paragraph::new("Type your message here...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        if focused {
            frame.set_cursor_position((inner.x, inner.y));
        }
        return;
    }

    let (row, col) = cursor_row_col(&app.input, app.input_cursor);
    let height = inner.height.max(1) as usize;
    let width = inner.width as usize;
    let v_scroll = row.saturating_sub(height - 1);
    let h_scroll = if width > 0 && col >= width { col - width + 1 } else { 0 };

    let text_color = if loading { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(text_color))
        .block(block)
        .scroll((v_scroll as u16, h_scroll as u16));

    frame.render_widget(input, area);

    if focused {
        frame.set_cursor_position((
            inner.x + (col - h_scroll) as u16,
            inner.y + (row - v_scroll) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.session.is_loading() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else if app.show_settings {
        (" SETTINGS ", Style::default().bg(Color::Magenta).fg(Color::White))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    // Mode hints first, then the global ones; whatever does not fit is dropped
    let mut hints: Vec<(&str, &str)> = if app.session.is_loading() {
        vec![(" Esc ", " cancel ")]
    } else if app.show_settings {
        vec![(" Enter ", " test "), (" Esc ", " close ")]
    } else {
        vec![(" Enter ", " send "), (" S-Enter ", " newline "), (" ^S ", " settings ")]
    };
    hints.extend([
        (" ^C ", " quit "),
        (" ^L ", " clear "),
        (" ^T ", " test "),
        (" PgUp/PgDn ", " scroll "),
    ]);

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    let mut used = mode_text.width() + 1;
    for (key, label) in hints {
        let hint_width = key.width() + label.width();
        if used + hint_width > area.width as usize {
            break;
        }
        used += hint_width;
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(label, label_style));
    }
    let footer_content = Line::from(spans);

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_alert(message: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 6.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice ");

    let text = Text::from(vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled(
            "Press any key to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let alert = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(alert, popup_area);
}
