use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use hamexam::session::Session;
use hamexam::session::countdown::format_clock;

use crate::ui::theme::Theme;

/// Sidebar with the timer (exams) and a grid of question numbers colored by
/// status.
pub struct AnswerSheet<'a> {
    session: &'a Session,
    now: Instant,
    theme: &'a Theme,
}

impl<'a> AnswerSheet<'a> {
    pub fn new(session: &'a Session, now: Instant, theme: &'a Theme) -> Self {
        Self {
            session,
            now,
            theme,
        }
    }
}

impl Widget for AnswerSheet<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let session = self.session;

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(4)])
            .split(area);

        let summary_block = Block::bordered()
            .title(format!(" {} ", session.mode().label()))
            .border_style(Style::default().fg(colors.accent()));
        let summary_inner = summary_block.inner(sections[0]);
        summary_block.render(sections[0], buf);

        let answered = session.answered_count();
        let mut lines = vec![Line::from(vec![
            Span::styled("Answered: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{answered}/{}", session.len()),
                Style::default().fg(colors.accent()),
            ),
        ])];
        match session.remaining_secs(self.now) {
            Some(secs) => {
                let clock_color = if secs <= 60 {
                    colors.error()
                } else if secs <= 300 {
                    colors.warning()
                } else {
                    colors.fg()
                };
                lines.push(Line::from(vec![
                    Span::styled("Time left: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format_clock(secs),
                        Style::default().fg(clock_color).add_modifier(Modifier::BOLD),
                    ),
                ]));
            }
            None => {
                let correct = (0..session.len())
                    .filter(|&i| session.verdict(i) == Some(true))
                    .count();
                lines.push(Line::from(vec![
                    Span::styled("Correct:  ", Style::default().fg(colors.fg())),
                    Span::styled(format!("{correct}"), Style::default().fg(colors.correct())),
                ]));
            }
        }
        Paragraph::new(lines).render(summary_inner, buf);

        let grid_block = Block::bordered()
            .title(" Sheet ")
            .border_style(Style::default().fg(colors.border()));
        let grid_inner = grid_block.inner(sections[1]);
        grid_block.render(sections[1], buf);

        let is_exam = session.mode().is_exam();
        let current = session.current_index();
        let cells: Vec<Span> = (0..session.len())
            .map(|i| {
                let color = match (session.answer(i).is_some(), is_exam, session.verdict(i)) {
                    (false, _, _) => colors.text_dim(),
                    (true, true, _) => colors.accent(),
                    (true, false, Some(true)) => colors.correct(),
                    (true, false, _) => colors.incorrect(),
                };
                let mut style = Style::default().fg(color);
                if i == current {
                    style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
                }
                Span::styled(format!("{:>3} ", i + 1), style)
            })
            .collect();

        // Keep the current number visible on long sessions
        let per_row = (grid_inner.width / 4).max(1) as usize;
        let rows_visible = grid_inner.height.max(1) as usize;
        let current_row = current / per_row;
        let first_row = current_row.saturating_sub(rows_visible.saturating_sub(1));
        let start = (first_row * per_row).min(cells.len());

        Paragraph::new(Line::from(cells[start..].to_vec()))
            .wrap(Wrap { trim: false })
            .render(grid_inner, buf);
    }
}
