pub mod heatmap;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Gauge, Paragraph, Widget, Wrap},
};

use crate::{
    analytics::{MainsVerdict, QuestionStatus, DEFAULT_HEATMAP_COLUMNS},
    app::{App, AppState},
    clock::Clock,
    phases::{phase_hint, PhaseProgress},
    timer::Urgency,
    ui::heatmap::Heatmap,
    util::{format_secs, format_signed_time, format_time, format_time_with_ms},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl<C: Clock + Clone> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen::<C>(self.state).render(self, area, buf);

        if self.state.is_timer() && self.confirm_exit {
            render_confirm_exit(self.state, area, buf);
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub fn urgency_style(urgency: Urgency) -> Style {
    match urgency {
        Urgency::Default => bold(),
        Urgency::Warning => bold().fg(Color::Yellow),
        Urgency::Danger => bold().fg(Color::Red),
    }
}

pub fn status_color(status: QuestionStatus) -> Color {
    match status {
        QuestionStatus::Good => Color::Green,
        QuestionStatus::Warning => Color::Yellow,
        QuestionStatus::Danger => Color::Red,
    }
}

fn key_hint(key: &str, action: &str) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("[{key}]"), bold().fg(Color::Cyan)),
        Span::styled(format!(" {action}   "), dim()),
    ]
}

fn content_area(area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(0)])
        .split(area)[0]
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

pub(crate) fn render_prelims_timer<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let store = app.store();
    let prelims = store.prelims();
    let countdown = app.countdown();

    let mut title = match prelims.paper() {
        Some(paper) => format!("{paper} Paper"),
        None => "Prelims".to_string(),
    };
    if let Some(name) = store.name() {
        title.push_str(&format!("  ·  {name}"));
    }

    let question_line = if prelims.all_answered() {
        Line::from("All questions answered")
    } else {
        Line::from(vec![
            Span::raw("Question "),
            Span::styled(prelims.current_question().to_string(), bold()),
            Span::raw(format!(" / {}", prelims.total_questions())),
        ])
    };

    let ideal_ms = prelims.duration_ms() as f64 / prelims.total_questions() as f64;
    let last_lap_line = match app.last_lap() {
        Some(lap) => Line::from(vec![
            Span::styled(format!("Q{} took ", lap.question), dim()),
            Span::styled(
                format_time_with_ms(lap.time_ms),
                Style::default().fg(status_color(QuestionStatus::classify(lap.time_ms, ideal_ms))),
            ),
        ]),
        None => Line::styled(format!("Ideal pace {} per question", format_secs(ideal_ms)), dim()),
    };

    let action = if prelims.on_last_question() {
        "FINISH"
    } else {
        "LAP"
    };
    let mut hints = key_hint("Space", action);
    hints.extend(key_hint("Esc", "end session"));

    let lines = vec![
        Line::styled(title, bold()),
        Line::default(),
        Line::styled(format_time(countdown.remaining_ms()), urgency_style(countdown.urgency())),
        Line::styled("remaining", dim()),
        Line::default(),
        question_line,
        last_lap_line,
        Line::default(),
        Line::from(hints),
        Line::default(),
        Line::styled(
            "The timer keeps running until the session ends.",
            dim().add_modifier(Modifier::ITALIC),
        ),
    ];

    let inner = content_area(area);
    let top = inner.height.saturating_sub(lines.len() as u16) / 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(
            Rect {
                y: inner.y + top,
                height: inner.height - top,
                ..inner
            },
            buf,
        );
}

pub(crate) fn render_prelims_summary<C: Clock + Clone>(
    app: &App<C>,
    area: Rect,
    buf: &mut Buffer,
) {
    let store = app.store();
    let Some(stats) = store.prelims_stats() else {
        return;
    };

    let rows = stats
        .question_stats
        .len()
        .div_ceil(DEFAULT_HEATMAP_COLUMNS)
        .max(1) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(rows + 3),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .split(area);

    let mut heading = vec![Line::styled("Session Complete", bold().fg(Color::Green))];
    if let Some(name) = store.name() {
        heading.push(Line::styled(format!("Well done, {name}"), dim()));
    }
    heading.push(Line::from(format!(
        "{} of {} questions answered",
        stats.questions_answered, stats.total_questions
    )));
    Paragraph::new(heading)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let buffer_style = if stats.omr_buffer_ms >= 0 {
        bold().fg(Color::Green)
    } else {
        bold().fg(Color::Red)
    };
    let numbers = vec![
        Line::from(vec![
            Span::styled("Average per question  ", dim()),
            Span::styled(format_secs(stats.avg_time_ms), bold()),
            Span::styled(
                format!("  (ideal {})", format_secs(stats.ideal_time_per_question_ms)),
                dim(),
            ),
        ]),
        Line::from(vec![
            Span::styled("OMR buffer  ", dim()),
            Span::styled(format_signed_time(stats.omr_buffer_ms), buffer_style),
        ]),
        Line::from(vec![
            Span::styled("Time spent  ", dim()),
            Span::styled(format_time(stats.total_time_spent_ms), bold()),
        ]),
        Line::from(vec![
            Span::styled(
                format!("{} within ideal", stats.good_count),
                Style::default().fg(status_color(QuestionStatus::Good)),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{} slightly over", stats.warning_count),
                Style::default().fg(status_color(QuestionStatus::Warning)),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{} over time", stats.danger_count),
                Style::default().fg(status_color(QuestionStatus::Danger)),
            ),
        ]),
    ];
    Paragraph::new(numbers)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Heatmap::new(&stats, DEFAULT_HEATMAP_COLUMNS).render(chunks[2], buf);

    Paragraph::new(Line::styled(
        stats.insight.message(),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[3], buf);

    let mut hints = key_hint("r", "practise again");
    hints.extend(key_hint("q", "quit"));
    Paragraph::new(Line::from(hints))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}

pub(crate) fn render_mains_timer<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let store = app.store();
    let mains = store.mains();
    let countdown = app.countdown();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let kind = mains
        .kind()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "Mains".to_string());
    let mut title = format!("{kind}  ·  {} min", mains.duration_minutes());
    if let Some(name) = store.name() {
        title.push_str(&format!("  ·  {name}"));
    }
    Paragraph::new(Line::styled(title, bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(vec![
        Line::styled(format_time(countdown.remaining_ms()), urgency_style(countdown.urgency())),
        Line::styled(format!("{} elapsed", format_time(countdown.elapsed_ms())), dim()),
    ])
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let gauge_color = match countdown.urgency() {
        Urgency::Default => Color::Cyan,
        Urgency::Warning => Color::Yellow,
        Urgency::Danger => Color::Red,
    };
    Gauge::default()
        .block(Block::bordered())
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(countdown.progress())
        .label(format!("{:.0}%", countdown.progress() * 100.0))
        .render(chunks[2], buf);

    if let Some(phases) = app.phases() {
        let current = app.current_phase();
        let mut markers = Vec::new();
        for (index, phase) in phases.iter().enumerate() {
            let style = match PhaseProgress::of(index, current) {
                PhaseProgress::Past => Style::default().fg(Color::Green),
                PhaseProgress::Active => bold().fg(Color::Cyan),
                PhaseProgress::Upcoming => Style::default().fg(Color::DarkGray),
            };
            if index > 0 {
                markers.push(Span::styled("  ──  ", dim()));
            }
            markers.push(Span::styled(
                format!("● {} {}–{}m", phase.name, phase.start_min, phase.end_min),
                style,
            ));
        }
        Paragraph::new(vec![
            Line::from(markers),
            Line::default(),
            Line::styled(
                phase_hint(&phases, countdown.elapsed_ms()),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        ])
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    Paragraph::new(Line::from(key_hint("Enter", "finish answer")))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}

pub(crate) fn render_mains_end<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let store = app.store();
    let Some(outcome) = store.mains_outcome() else {
        return;
    };

    let verdict_style = match outcome.verdict {
        MainsVerdict::OnTime => bold().fg(Color::Green),
        MainsVerdict::Overrun => bold().fg(Color::Red),
        MainsVerdict::FinishedEarly => bold().fg(Color::Cyan),
    };
    let kind = store
        .mains()
        .kind()
        .map(|k| format!("{k} answer"))
        .unwrap_or_default();

    let mut hints = key_hint("r", "practise again");
    hints.extend(key_hint("q", "quit"));

    let lines = vec![
        Line::styled(outcome.verdict.title(), verdict_style),
        Line::styled(kind, dim()),
        Line::default(),
        Line::from(vec![
            Span::styled("Target  ", dim()),
            Span::styled(format_time(outcome.target_ms), bold()),
        ]),
        Line::from(vec![
            Span::styled("Actual  ", dim()),
            Span::styled(format_time(outcome.actual_ms), bold()),
        ]),
        Line::from(vec![
            Span::styled("Difference  ", dim()),
            Span::styled(format_signed_time(outcome.difference_ms), verdict_style),
        ]),
        Line::default(),
        Line::from(outcome.verdict.message()),
        Line::default(),
        Line::from(hints),
    ];

    let inner = content_area(area);
    let top = inner.height.saturating_sub(lines.len() as u16) / 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(
            Rect {
                y: inner.y + top,
                height: inner.height - top,
                ..inner
            },
            buf,
        );
}

fn render_confirm_exit(state: AppState, area: Rect, buf: &mut Buffer) {
    let question = match state {
        AppState::MainsTimer => "Finish this answer now?",
        _ => "End this session and see your summary?",
    };
    let mut hints = key_hint("y", "yes");
    hints.extend(key_hint("n", "keep going"));

    let popup = centered(area, 46, 5);
    Clear.render(popup, buf);
    Paragraph::new(vec![Line::styled(question, bold()), Line::default(), Line::from(hints)])
        .alignment(Alignment::Center)
        .block(Block::bordered().border_style(Style::default().fg(Color::Yellow)))
        .render(popup, buf);
}
