use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use hamexam::bank::markup::{self, Segment};
use hamexam::engine::grading;
use hamexam::session::Session;

use crate::ui::theme::Theme;

pub struct QuestionView<'a> {
    session: &'a Session,
    favorite: bool,
    wrong: bool,
    theme: &'a Theme,
}

impl<'a> QuestionView<'a> {
    pub fn new(session: &'a Session, favorite: bool, wrong: bool, theme: &'a Theme) -> Self {
        Self {
            session,
            favorite,
            wrong,
            theme,
        }
    }
}

impl Widget for QuestionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let session = self.session;
        let index = session.current_index();
        let question = session.current_question();
        let answer = session.answer(index);

        let block = Block::bordered()
            .title(format!(" Question {} of {} ", index + 1, session.len()))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let kind = if question.is_multi() {
            "Multiple choice: select every correct option"
        } else {
            "Single choice"
        };
        let mut meta = vec![
            Span::styled(
                format!(" {} ", question.id),
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
            ),
            Span::styled(kind, Style::default().fg(colors.text_dim())),
        ];
        if self.favorite {
            meta.push(Span::styled("  ★ favorite", Style::default().fg(colors.favorite())));
        }
        if self.wrong && !session.mode().is_exam() {
            meta.push(Span::styled("  in wrong list", Style::default().fg(colors.warning())));
        }

        let mut lines = vec![Line::from(meta), Line::from("")];

        let mut text_spans = vec![Span::raw(" ")];
        for segment in markup::segments(&question.question) {
            match segment {
                Segment::Text(text) => {
                    text_spans.push(Span::styled(text, Style::default().fg(colors.fg())))
                }
                Segment::Image(file) => text_spans.push(Span::styled(
                    format!("[image: {file}]"),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::ITALIC),
                )),
            }
        }
        lines.push(Line::from(text_spans));
        lines.push(Line::from(""));

        for (letter, option) in session.displayed_options() {
            let chosen = answer.is_some_and(|a| a.contains(&option.value));
            let marker = match (question.is_multi(), chosen) {
                (true, true) => "[x]",
                (true, false) => "[ ]",
                (false, true) => "(•)",
                (false, false) => "( )",
            };
            let style = if chosen {
                Style::default()
                    .fg(colors.option_selected())
                    .bg(colors.option_selected_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("{marker} {letter}. {}", markup::option_text(&option.text)),
                    style,
                ),
            ]));
        }

        if let (Some(verdict), Some(layout)) = (session.verdict(index), session.layout(index)) {
            lines.push(Line::from(""));
            let feedback = if verdict {
                Span::styled(
                    " ✔ Correct",
                    Style::default().fg(colors.correct()).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(
                    format!(
                        " ✘ Incorrect, recorded in the wrong list. Answer: {}",
                        grading::describe_correct(question, layout)
                    ),
                    Style::default().fg(colors.incorrect()).add_modifier(Modifier::BOLD),
                )
            };
            lines.push(Line::from(feedback));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
