//! Rendering
//!
//! Pure drawing code: takes the current [`App`] state and lays it out with
//! ratatui. Nothing here mutates state or talks to the backend; every string
//! it draws was formatted by `guide-core`.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use guide_core::{DreamCard, GalleryState, InterpretationBlock, MessageRole, TraumaLevel};

use crate::app::{App, ChatBubble, Tab};

/// Accent color for the REMinder brand
const ACCENT: Color = Color::Magenta;

/// Maximum symbol bar width in cells
const BAR_WIDTH: usize = 20;

/// Draw one frame
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    match app.tab {
        Tab::Journal => draw_journal(frame, app, chunks[1]),
        Tab::Visualizer => draw_visualizer(frame, app, chunks[1]),
    }
    draw_help(frame, app, chunks[2]);

    if app.chat_open() {
        draw_chat_overlay(frame, app, chunks[1]);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let tab_label = |tab: Tab, label: &str| {
        if app.tab == tab {
            Span::styled(
                format!(" {label} "),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(Color::DarkGray))
        }
    };

    let mut spans = vec![
        Span::styled(
            app.banner.clone(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        tab_label(Tab::Journal, "Journal"),
        tab_label(Tab::Visualizer, "Visualizer"),
    ];
    if let Some(status) = &app.status {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_help(frame: &mut Frame, app: &App, area: Rect) {
    let help = if app.chat_open() {
        "Enter send | Esc close chat | Ctrl+G chat | Ctrl+Q quit"
    } else if app.composing {
        "Ctrl+S save | Ctrl+R dictate | Tab switch field | Esc cancel"
    } else {
        match app.tab {
            Tab::Journal => {
                "Tab switch view | n new | r refresh | x delete | Enter expand | Ctrl+G chat | Ctrl+Q quit"
            }
            Tab::Visualizer => {
                "Tab switch view | Enter generate | Del remove image | Ctrl+L clear | Ctrl+G chat | Ctrl+Q quit"
            }
        }
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

// === Journal tab ===

fn draw_journal(frame: &mut Frame, app: &App, area: Rect) {
    if app.composing {
        draw_compose_form(frame, app, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let items: Vec<ListItem> = app
        .cards
        .iter()
        .map(|card| {
            let mut spans = vec![
                Span::styled(card.heading.clone(), Style::default().fg(ACCENT)),
                Span::raw(" "),
                Span::raw(card.title.clone()),
            ];
            if card.trauma_level == Some(TraumaLevel::Elevated) {
                spans.push(Span::styled(
                    " [Elevated]",
                    Style::default().fg(Color::Red),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = ListState::default();
    if !app.cards.is_empty() {
        state.select(Some(app.selected_card));
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Dreams"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let detail: Vec<Line> = match app.cards.get(app.selected_card) {
        Some(card) => card_lines(card, app.card_list.is_expanded(card.key)),
        None => vec![Line::from("No dreams yet. Press n to record one.")],
    };
    let paragraph = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title("Analysis"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, chunks[1]);
}

/// Format one card into display lines
fn card_lines(card: &DreamCard, expanded: bool) -> Vec<Line<'static>> {
    let label = |text: &str| Span::styled(text.to_string(), Style::default().fg(Color::DarkGray));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} {}", card.heading, card.title),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            label(&card.date),
        ]),
        Line::from(vec![
            label("Mood: "),
            Span::raw(card.mood_badge.clone()),
            Span::raw("  "),
            label("Trauma: "),
            Span::raw(card.trauma_score.clone()),
            trauma_badge(card),
        ]),
        Line::from(""),
    ];

    for line in textwrap::wrap(&card.content, 70) {
        lines.push(Line::from(line.into_owned()));
    }

    if !expanded {
        lines.push(Line::from(""));
        lines.push(Line::from(label("Enter to expand the full analysis")));
        return lines;
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Symbols",
        Style::default().fg(ACCENT),
    )));
    for bar in &card.symbols {
        lines.push(Line::from(symbol_bar_text(&bar.name, bar.width_pct, &bar.score_label)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Emotional Arc",
        Style::default().fg(ACCENT),
    )));
    lines.push(Line::from(format!(
        "{}  (shift {})",
        card.trajectory.join(" \u{2192} "),
        card.shift_intensity
    )));
    if let Some(description) = &card.arc_description {
        for line in textwrap::wrap(description, 70) {
            lines.push(Line::from(line.into_owned()));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Interpretation",
        Style::default().fg(ACCENT),
    )));
    for block in &card.interpretation {
        match block {
            InterpretationBlock::Text { content } => {
                for line in textwrap::wrap(content, 70) {
                    lines.push(Line::from(line.into_owned()));
                }
            }
            InterpretationBlock::List { items } => {
                for item in items {
                    lines.push(Line::from(format!("  \u{2022} {item}")));
                }
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        label("Confidence: "),
        Span::raw(format!(
            "overall {}, symbols {}",
            card.overall_confidence, card.symbol_confidence
        )),
    ]));
    lines.push(Line::from(label(&card.footer)));

    lines
}

fn trauma_badge(card: &DreamCard) -> Span<'static> {
    match card.trauma_level {
        Some(TraumaLevel::Elevated) => {
            Span::styled(" Elevated", Style::default().fg(Color::Red))
        }
        Some(TraumaLevel::Low) => Span::styled(" Low", Style::default().fg(Color::Green)),
        None => Span::raw(""),
    }
}

/// A name, a proportional bar, and the raw score
fn symbol_bar_text(name: &str, width_pct: f64, score: &str) -> String {
    let filled = ((width_pct / 100.0) * BAR_WIDTH as f64).round() as usize;
    let pad = 14usize.saturating_sub(name.width());
    format!(
        "  {name}{} {}{} {score}",
        " ".repeat(pad),
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
    )
}

fn draw_compose_form(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let focus_style = Style::default().fg(ACCENT);
    let blur_style = Style::default().fg(Color::DarkGray);

    let title = Paragraph::new(app.title_input.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Title")
            .border_style(if app.compose_title_focused {
                focus_style
            } else {
                blur_style
            }),
    );
    frame.render_widget(title, chunks[0]);

    let content = Paragraph::new(app.content_input.clone())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Dream")
                .border_style(if app.compose_title_focused {
                    blur_style
                } else {
                    focus_style
                }),
        );
    frame.render_widget(content, chunks[1]);
}

// === Visualizer tab ===

fn draw_visualizer(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let input = Paragraph::new(app.dream_input.clone())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Describe your dream"));
    frame.render_widget(input, chunks[0]);

    let status_line = if app.gallery.state() == GalleryState::Generating {
        Line::from(Span::styled(
            "Generating images...",
            Style::default().fg(ACCENT),
        ))
    } else if let Some(error) = app.gallery.error() {
        Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(status_line), chunks[1]);

    let items: Vec<ListItem> = app
        .gallery
        .images()
        .iter()
        .map(|url| ListItem::new(url.clone()))
        .collect();
    let mut state = ListState::default();
    if !app.gallery.images().is_empty() {
        state.select(Some(app.selected_image));
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Gallery"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, chunks[2], &mut state);
}

// === Chat overlay ===

fn draw_chat_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay = centered_rect(70, 80, area);
    frame.render_widget(Clear, overlay);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(overlay);

    let wrap_width = chunks[0].width.saturating_sub(6).max(20) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for bubble in &app.bubbles {
        lines.extend(bubble_lines(bubble, wrap_width));
    }
    if app.typing {
        lines.push(Line::from(Span::styled(
            "REMinder is thinking...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the latest lines in view
    let visible = chunks[0].height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(visible);
    let transcript: Vec<Line> = lines.into_iter().skip(skip).collect();

    let panel = Paragraph::new(transcript).block(
        Block::default()
            .borders(Borders::ALL)
            .title("DreamAnalyzer Guide")
            .border_style(Style::default().fg(ACCENT)),
    );
    frame.render_widget(panel, chunks[0]);

    let question_pending = app.guide.session().lock().pending_question().is_some();
    let input = Paragraph::new(app.chat_input.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(chat_input_title(question_pending)),
    );
    frame.render_widget(input, chunks[1]);
}

/// Chat input title, nudging when the guide is waiting on an answer
fn chat_input_title(question_pending: bool) -> &'static str {
    if question_pending {
        "Your answer (the guide asked a question)"
    } else {
        "Message"
    }
}

fn bubble_lines(bubble: &ChatBubble, width: usize) -> Vec<Line<'static>> {
    let (prefix, style) = if bubble.is_error {
        ("!", Style::default().fg(Color::Red))
    } else {
        match bubble.role {
            MessageRole::User => ("You:", Style::default().fg(Color::Cyan)),
            MessageRole::Bot => ("Guide:", Style::default().fg(ACCENT)),
            MessageRole::System => ("*", Style::default().fg(Color::DarkGray)),
        }
    };

    let mut lines = vec![Line::from(Span::styled(prefix.to_string(), style))];
    for wrapped in textwrap::wrap(&bubble.text, width) {
        lines.push(Line::from(format!("  {wrapped}")));
    }
    lines
}

/// Centered sub-rectangle by percentage
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_symbol_bar_fills_proportionally() {
        let full = symbol_bar_text("water", 100.0, "1.000");
        assert!(full.contains(&"\u{2588}".repeat(BAR_WIDTH)));
        assert!(!full.contains('\u{2591}'));

        let half = symbol_bar_text("door", 50.0, "0.500");
        assert!(half.contains(&"\u{2588}".repeat(BAR_WIDTH / 2)));
    }

    #[test]
    fn test_chat_input_title_reflects_pending_question() {
        assert_eq!(chat_input_title(false), "Message");
        assert_eq!(
            chat_input_title(true),
            "Your answer (the guide asked a question)"
        );
    }

    #[test]
    fn test_bubble_lines_wrap_and_prefix() {
        let bubble = ChatBubble {
            role: MessageRole::Bot,
            text: "a reply".to_string(),
            is_error: false,
        };
        let lines = bubble_lines(&bubble, 40);
        assert_eq!(lines.len(), 2);
    }
}
