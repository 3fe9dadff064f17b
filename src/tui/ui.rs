use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use unicode_truncate::UnicodeTruncateStr;

use crate::tracker::{ClickOutcome, IgnoreReason, TrackingState};

use super::app::{App, Playback, View};

/// Regions of the playback view. Shared by drawing and mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackLayout {
    pub header: Rect,
    /// Bordered box around the player
    pub container: Rect,
    /// Back button row drawn over the top of the container
    pub overlay: Rect,
    pub player: Rect,
    pub status: Rect,
    pub help: Rect,
}

pub fn playback_layout(area: Rect) -> PlaybackLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Player container
            Constraint::Length(3), // Tracking status
            Constraint::Length(1), // Help
        ])
        .split(area);

    let container = chunks[1];
    let inner = Block::default().borders(Borders::ALL).inner(container);
    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    PlaybackLayout {
        header: chunks[0],
        container,
        overlay: inner_chunks[0],
        player: inner_chunks[1],
        status: chunks[2],
        help: chunks[3],
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    match (&app.view, &app.playback) {
        (View::Watching, Some(playback)) => draw_playback(frame, playback),
        _ => draw_listing(frame, app),
    }
}

fn draw_listing(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search
            Constraint::Min(0),    // Cards
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    let title = Paragraph::new(format!(
        "CinemaHub | {} videos | {}",
        app.cards.len(),
        app.category_label()
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(title, chunks[0]);

    let search_style = if app.is_editing_search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let cursor = if app.is_editing_search { "_" } else { "" };
    let search = Paragraph::new(format!("{}{}", app.search_input, cursor))
        .style(search_style)
        .block(Block::default().borders(Borders::ALL).title("Search"));
    frame.render_widget(search, chunks[1]);

    let title_width = chunks[2].width.saturating_sub(40) as usize;
    let items: Vec<ListItem> = app
        .cards
        .iter()
        .enumerate()
        .map(|(i, card)| {
            let style = if i == app.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let (title, _) = card.video.title.unicode_truncate(title_width.max(10));
            let mut spans = vec![
                Span::styled(
                    format!("{:>8}", card.video.duration),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" | "),
                Span::raw(title.to_string()),
                Span::styled(
                    format!("  [{}]", card.video.category),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if let Some(badge) = &card.badge {
                spans.push(Span::styled(
                    format!("  ✓ watched, {}", badge.label()),
                    Style::default().fg(Color::Green),
                ));
            }

            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Videos"));
    frame.render_widget(list, chunks[2]);

    let status = if app.is_loading {
        Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow))
    } else if let Some(error) = &app.error {
        Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red))
    } else if let Some(status) = &app.status {
        Paragraph::new(status.as_str()).style(Style::default().fg(Color::Green))
    } else {
        Paragraph::new("")
    };
    frame.render_widget(status, chunks[3]);

    let help_text = if app.is_editing_search {
        "Enter: search | Esc: cancel"
    } else {
        "↑/↓: navigate | Enter: watch | /: search | c: category | r: refresh | s: stats | X: clear history | q: quit"
    };
    let help = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[4]);
}

fn draw_playback(frame: &mut Frame, playback: &Playback) {
    let layout = playback_layout(frame.area());
    let video = &playback.video.video;

    let header = Paragraph::new(format!(
        "{} | {} | {}",
        video.title, playback.video.category_name, video.duration
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .block(Block::default().borders(Borders::ALL).title(playback.path.as_str()));
    frame.render_widget(header, layout.header);

    frame.render_widget(
        Block::default().borders(Borders::ALL).title("Player"),
        layout.container,
    );

    let back = Paragraph::new(" ◀ Back ").style(Style::default().fg(Color::Black).bg(Color::Gray));
    frame.render_widget(back, layout.overlay);

    draw_player(frame, playback, layout.player);

    let (state_text, state_color) = match playback.timer.as_ref().map(|t| t.state()) {
        Some(TrackingState::Active) => ("tracking", Color::Green),
        Some(TrackingState::Paused) => ("paused", Color::Yellow),
        Some(TrackingState::TornDown) => ("finished", Color::DarkGray),
        None => ("unavailable", Color::Red),
    };
    let minutes = playback
        .timer
        .as_ref()
        .map(|t| t.minutes_watched())
        .unwrap_or(0.0);

    let mut spans = vec![
        Span::styled(state_text, Style::default().fg(state_color)),
        Span::raw(format!(" | {:.1} min watched", minutes)),
    ];
    if let Some(outcome) = playback.last_click {
        spans.push(Span::styled(
            format!(" | last click: {}", describe_click(outcome)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Watch time"));
    frame.render_widget(status, layout.status);

    let help = Paragraph::new("click player: pause/resume | Esc/q: back to videos")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, layout.help);
}

/// Stand-in for the embedded frame: what would load, plus a control bar
fn draw_player(frame: &mut Frame, playback: &Playback, area: Rect) {
    if area.height == 0 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let video = &playback.video.video;
    let body = Paragraph::new(vec![
        Line::from(Span::styled(
            video.video_url.as_str(),
            Style::default().fg(Color::Blue),
        )),
        Line::from(""),
        Line::from(video.description.as_str()),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(body, chunks[0]);

    let bar_width = chunks[1].width.saturating_sub(8) as usize;
    let controls = Paragraph::new(format!(" ▶ {} ⛶", "━".repeat(bar_width)))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(controls, chunks[1]);
}

fn describe_click(outcome: ClickOutcome) -> &'static str {
    match outcome {
        ClickOutcome::Paused => "paused",
        ClickOutcome::Resumed => "resumed",
        ClickOutcome::Ignored(IgnoreReason::Overlay) => "ignored (control)",
        ClickOutcome::Ignored(IgnoreReason::DoubleClick) => "ignored (double-click)",
        ClickOutcome::Ignored(IgnoreReason::ControlBar) => "ignored (player controls)",
        ClickOutcome::Ignored(IgnoreReason::Finished) => "ignored",
    }
}
