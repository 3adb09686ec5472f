use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use hamexam::bank::markup;
use hamexam::engine::OptionLayout;
use hamexam::engine::grading;
use hamexam::engine::search::{MatchTier, SearchResults};

use crate::ui::theme::Theme;

fn tier_label(tier: Option<MatchTier>) -> &'static str {
    match tier {
        Some(MatchTier::ExactId) => "exact id",
        Some(MatchTier::IdSuffix) => "id number",
        Some(MatchTier::Substring) => "text",
        None => "no match",
    }
}

/// Search hits shown with options in bank order and the answer revealed.
pub struct SearchResultsView<'a> {
    results: &'a SearchResults,
    scroll: usize,
    theme: &'a Theme,
}

impl<'a> SearchResultsView<'a> {
    pub fn new(results: &'a SearchResults, scroll: usize, theme: &'a Theme) -> Self {
        Self {
            results,
            scroll,
            theme,
        }
    }
}

impl Widget for SearchResultsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(
                " Search \"{}\": {} hit(s) by {} ",
                self.results.keyword,
                self.results.hits.len(),
                tier_label(self.results.tier)
            ))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.results.hits.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "  Nothing matched. Try an id such as MC1-0001, a number, or a word.",
                Style::default().fg(colors.text_dim()),
            )))
            .render(inner, buf);
            return;
        }

        let mut lines = Vec::new();
        for hit in self.results.hits.iter().skip(self.scroll) {
            let question = &hit.question;
            let layout = OptionLayout::identity(question);
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" [{}] ", hit.category),
                    Style::default().fg(colors.header_fg()).bg(colors.header_bg()),
                ),
                Span::styled(
                    format!(" {}", question.id),
                    Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(Span::styled(
                format!("  {}", question.question),
                Style::default().fg(colors.fg()),
            )));
            for (letter, option) in layout.displayed(question) {
                let style = if question.answer.contains(option.value.as_str()) {
                    Style::default().fg(colors.correct())
                } else {
                    Style::default().fg(colors.text_dim())
                };
                lines.push(Line::from(Span::styled(
                    format!("    {letter}. {}", markup::option_text(&option.text)),
                    style,
                )));
            }
            lines.push(Line::from(Span::styled(
                format!("  Answer: {}", grading::describe_correct(question, &layout)),
                Style::default().fg(colors.correct()),
            )));
            lines.push(Line::from(""));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
