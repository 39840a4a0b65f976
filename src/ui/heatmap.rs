use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::analytics::{PrelimsStats, QuestionStatus};
use crate::ui::status_color;

const CELL_WIDTH: usize = 4;

/// Grid of question cells coloured by pacing status, with a legend row.
pub struct Heatmap<'a> {
    stats: &'a PrelimsStats,
    columns: usize,
}

impl<'a> Heatmap<'a> {
    pub fn new(stats: &'a PrelimsStats, columns: usize) -> Self {
        Self { stats, columns }
    }

    fn legend() -> Line<'static> {
        let mut spans = Vec::new();
        for status in [
            QuestionStatus::Good,
            QuestionStatus::Warning,
            QuestionStatus::Danger,
        ] {
            spans.push(Span::styled("■ ", Style::default().fg(status_color(status))));
            spans.push(Span::raw(format!("{}   ", status.legend())));
        }
        Line::from(spans)
    }
}

impl Widget for Heatmap<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines: Vec<Line> = self
            .stats
            .heatmap_rows(self.columns)
            .map(|row| {
                let cells = row.iter().flat_map(|q| {
                    [
                        Span::styled(
                            format!("{:^width$}", q.question_number, width = CELL_WIDTH),
                            Style::default()
                                .fg(Color::Black)
                                .bg(status_color(q.status)),
                        ),
                        Span::raw(" "),
                    ]
                });
                Line::from(cells.collect::<Vec<_>>())
            })
            .collect();

        if lines.is_empty() {
            lines.push(Line::styled(
                "No questions answered",
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::default());
        lines.push(Self::legend());

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
