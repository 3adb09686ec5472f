use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Exam,
    Practice,
    Resume,
    WrongOnly,
    FavoriteOnly,
    PendingOnly,
    Search,
    ClearWrong,
}

pub struct MenuItem {
    pub key: char,
    pub label: &'static str,
    pub description: &'static str,
    pub action: MenuAction,
}

pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            items: vec![
                MenuItem {
                    key: '1',
                    label: "Mock Exam",
                    description: "Timed exam drawn at random from the bank",
                    action: MenuAction::Exam,
                },
                MenuItem {
                    key: '2',
                    label: "Practice",
                    description: "Work through the bank in the chosen order",
                    action: MenuAction::Practice,
                },
                MenuItem {
                    key: '3',
                    label: "Resume Practice",
                    description: "Continue where the last practice left off",
                    action: MenuAction::Resume,
                },
                MenuItem {
                    key: '4',
                    label: "Wrong-Answer Review",
                    description: "Only questions you have missed",
                    action: MenuAction::WrongOnly,
                },
                MenuItem {
                    key: '5',
                    label: "Favorites",
                    description: "Only questions you starred",
                    action: MenuAction::FavoriteOnly,
                },
                MenuItem {
                    key: '6',
                    label: "Unfinished Questions",
                    description: "Questions left unanswered in the saved practice",
                    action: MenuAction::PendingOnly,
                },
                MenuItem {
                    key: '/',
                    label: "Search",
                    description: "Find questions by id or text across all banks",
                    action: MenuAction::Search,
                },
                MenuItem {
                    key: 'x',
                    label: "Clear Wrong List",
                    description: "Forget recorded mistakes for this category",
                    action: MenuAction::ClearWrong,
                },
            ],
            selected: 0,
            theme,
        }
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn selected_action(&self) -> Option<MenuAction> {
        self.items.get(self.selected).map(|item| item.action)
    }

    pub fn action_for_key(&self, key: char) -> Option<MenuAction> {
        self.items.iter().find(|item| item.key == key).map(|item| item.action)
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "hamexam",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Amateur Radio Exam Trainer",
                Style::default().fg(colors.fg()),
            )),
        ];

        let title = Paragraph::new(title_lines).alignment(Alignment::Center);
        title.render(layout[0], buf);

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .map(|_| Constraint::Length(2))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in self.items.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_text = format!(" {indicator} [{}] {}", item.key, item.label);
            let desc_text = format!("       {}", item.description);

            let lines = vec![
                Line::from(Span::styled(
                    label_text,
                    Style::default()
                        .fg(if is_selected {
                            colors.accent()
                        } else {
                            colors.fg()
                        })
                        .add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                )),
                Line::from(Span::styled(desc_text, Style::default().fg(colors.text_dim()))),
            ];

            if let Some(row) = menu_layout.get(i) {
                Paragraph::new(lines).render(*row, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_wraps_both_ways() {
        let theme = Theme::default();
        let mut menu = Menu::new(&theme);
        menu.prev();
        assert_eq!(menu.selected_action(), Some(MenuAction::ClearWrong));
        menu.next();
        assert_eq!(menu.selected_action(), Some(MenuAction::Exam));
    }

    #[test]
    fn shortcut_keys_map_to_actions() {
        let theme = Theme::default();
        let menu = Menu::new(&theme);
        assert_eq!(menu.action_for_key('3'), Some(MenuAction::Resume));
        assert_eq!(menu.action_for_key('/'), Some(MenuAction::Search));
        assert_eq!(menu.action_for_key('9'), None);
    }
}
