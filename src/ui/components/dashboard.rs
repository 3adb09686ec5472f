use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use hamexam::session::ExamResult;
use hamexam::session::countdown::format_clock;

use crate::ui::theme::Theme;

/// Graded exam summary with a scrollable list of missed questions.
pub struct Dashboard<'a> {
    pub result: &'a ExamResult,
    pub scroll: usize,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(result: &'a ExamResult, scroll: usize, theme: &'a Theme) -> Self {
        Self {
            result,
            scroll,
            theme,
        }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let result = self.result;

        let block = Block::bordered()
            .title(format!(" Class {} Mock Exam ", result.category))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let (verdict, verdict_color) = if result.passed {
            ("PASSED", colors.success())
        } else {
            ("NOT PASSED", colors.error())
        };
        let title = Paragraph::new(Line::from(Span::styled(
            verdict,
            Style::default()
                .fg(verdict_color)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let score_line = Line::from(vec![
            Span::styled("  Score: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}/{}", result.correct, result.total),
                Style::default().fg(verdict_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  (pass mark {}, {:.0}%)", result.pass_mark, result.score_ratio() * 100.0),
                Style::default().fg(colors.text_dim()),
            ),
        ]);
        Paragraph::new(score_line).render(layout[1], buf);

        let time_line = Line::from(vec![
            Span::styled("  Time:  ", Style::default().fg(colors.fg())),
            Span::styled(format_clock(result.elapsed_secs), Style::default().fg(colors.fg())),
            Span::styled(
                format!("  finished {}", result.finished_at.format("%Y-%m-%d %H:%M UTC")),
                Style::default().fg(colors.text_dim()),
            ),
        ]);
        Paragraph::new(time_line).render(layout[2], buf);

        let wrong_header = if result.wrong.is_empty() {
            Span::styled("  No mistakes!", Style::default().fg(colors.success()))
        } else {
            Span::styled(
                format!("  {} missed, added to the wrong list:", result.wrong.len()),
                Style::default().fg(colors.warning()),
            )
        };
        Paragraph::new(Line::from(wrong_header)).render(layout[3], buf);

        let rows: Vec<Line> = result
            .wrong
            .iter()
            .skip(self.scroll)
            .map(|item| {
                Line::from(vec![
                    Span::styled(format!("  {:>3}. ", item.number), Style::default().fg(colors.text_dim())),
                    Span::styled(format!("{:<12}", item.id), Style::default().fg(colors.accent())),
                    Span::styled(" yours: ", Style::default().fg(colors.text_dim())),
                    Span::styled(format!("{:<10}", item.your_answer), Style::default().fg(colors.incorrect())),
                    Span::styled(" correct: ", Style::default().fg(colors.text_dim())),
                    Span::styled(item.correct_answer.as_str(), Style::default().fg(colors.correct())),
                ])
            })
            .collect();
        Paragraph::new(rows).render(layout[4], buf);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("  [Enter/q] Menu  ", Style::default().fg(colors.accent())),
            Span::styled("[r] New exam  ", Style::default().fg(colors.accent())),
            Span::styled("[j/k] Scroll", Style::default().fg(colors.accent())),
        ]));
        help.render(layout[5], buf);
    }
}
