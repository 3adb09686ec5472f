use std::sync::Arc;
use std::time::Instant;

use crossterm::event::KeyEvent;

use hamexam::bank::{Bank, BankLoader, BankSource, Category};
use hamexam::config::Config;
use hamexam::engine::search::{self, SearchResults};
use hamexam::session::{
    PracticeFilter, PracticeOrder, ResumeOutcome, SessionController, SessionError, SessionState,
};
use hamexam::store::{Collection, KvStore, ProgressStore};

use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Quiz,
    ExamResult,
    Search,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Goto,
    Search,
}

pub struct Prompt {
    pub kind: PromptKind,
    pub input: LineInput,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    SubmitExam,
    ClearWrong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub category: Category,
    pub order: PracticeOrder,
    pub loader: BankLoader<Box<dyn BankSource>>,
    pub controller: SessionController<Box<dyn KvStore>>,
    pub prompt: Option<Prompt>,
    pub confirm: Option<Confirm>,
    pub notice: Option<Notice>,
    pub search_results: Option<SearchResults>,
    pub scroll: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        source: Box<dyn BankSource>,
        kv: Box<dyn KvStore>,
        theme: &'static Theme,
    ) -> Self {
        let controller = SessionController::new(ProgressStore::new(kv), config.exam.clone());
        Self {
            screen: AppScreen::Menu,
            menu: Menu::new(theme),
            theme,
            order: config.practice_order(),
            config,
            category: Category::A,
            loader: BankLoader::new(source),
            controller,
            prompt: None,
            confirm: None,
            notice: None,
            search_results: None,
            scroll: 0,
            should_quit: false,
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notify(NoticeLevel::Info, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.notify(NoticeLevel::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notify(NoticeLevel::Error, text);
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
    }

    fn session_error(&mut self, err: SessionError) {
        match err {
            SessionError::EmptyFilterResult { .. } | SessionError::NoPendingSession { .. } => {
                self.info(err.to_string())
            }
            _ => self.error(err.to_string()),
        }
    }

    fn bank(&mut self) -> Option<Arc<Bank>> {
        match self.loader.load(self.category) {
            Ok(bank) => Some(bank),
            Err(e) => {
                self.error(format!("{e} (press the key again to retry)"));
                None
            }
        }
    }

    fn enter_quiz(&mut self) {
        self.screen = AppScreen::Quiz;
        self.prompt = None;
        self.confirm = None;
    }

    pub fn run_menu_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::Exam => self.start_exam(),
            MenuAction::Practice => self.start_practice(PracticeFilter::None),
            MenuAction::Resume => self.resume_practice(),
            MenuAction::WrongOnly => self.start_practice(PracticeFilter::WrongOnly),
            MenuAction::FavoriteOnly => self.start_practice(PracticeFilter::FavoriteOnly),
            MenuAction::PendingOnly => self.start_practice(PracticeFilter::PendingOnly),
            MenuAction::Search => self.open_prompt(PromptKind::Search),
            MenuAction::ClearWrong => self.confirm = Some(Confirm::ClearWrong),
        }
    }

    pub fn start_exam(&mut self) {
        let Some(bank) = self.bank() else { return };
        match self.controller.start_exam(&bank, Instant::now()) {
            Ok(()) => self.enter_quiz(),
            Err(e) => self.session_error(e),
        }
    }

    pub fn start_practice(&mut self, filter: PracticeFilter) {
        let Some(bank) = self.bank() else { return };
        match self
            .controller
            .start_practice(&bank, self.order, filter, Instant::now())
        {
            Ok(()) => self.enter_quiz(),
            Err(e) => self.session_error(e),
        }
    }

    pub fn resume_practice(&mut self) {
        let Some(bank) = self.bank() else { return };
        match self
            .controller
            .resume_practice(&bank, self.order, Instant::now())
        {
            Ok(ResumeOutcome::Resumed) => {
                self.enter_quiz();
                if let Some(session) = self.controller.session() {
                    let text = format!(
                        "Resumed at question {} ({} answered)",
                        session.current_index() + 1,
                        session.answered_count()
                    );
                    self.info(text);
                }
            }
            Ok(ResumeOutcome::Restarted { reason }) => {
                self.enter_quiz();
                self.warn(format!("{reason}; started a fresh practice"));
            }
            Err(e) => self.session_error(e),
        }
    }

    pub fn answer(&mut self, letter: char) {
        if let Err(e) = self.controller.answer_letter(letter) {
            self.session_error(e);
        }
    }

    pub fn next_question(&mut self) {
        if let Err(e) = self.controller.next() {
            self.session_error(e);
        }
    }

    pub fn prev_question(&mut self) {
        if let Err(e) = self.controller.prev() {
            self.session_error(e);
        }
    }

    pub fn toggle_favorite(&mut self) {
        match self.controller.toggle_favorite() {
            Ok(true) => self.info("Added to favorites"),
            Ok(false) => self.info("Removed from favorites"),
            Err(e) => self.session_error(e),
        }
    }

    pub fn remove_from_wrong(&mut self) {
        match self.controller.remove_current_from_wrong() {
            Ok(true) => self.info("Removed from the wrong list"),
            Ok(false) => self.info("This question is not in the wrong list"),
            Err(e) => self.session_error(e),
        }
    }

    /// Esc during a session: exams ask before submitting, practice just leaves.
    pub fn request_exit(&mut self) {
        let in_exam = self
            .controller
            .session()
            .is_some_and(|s| s.mode().is_exam());
        if in_exam {
            self.confirm = Some(Confirm::SubmitExam);
        } else {
            self.exit_session();
        }
    }

    pub fn exit_session(&mut self) {
        self.controller.exit();
        self.screen = AppScreen::Menu;
        self.prompt = None;
        self.confirm = None;
        self.scroll = 0;
    }

    pub fn submit_exam(&mut self) {
        self.confirm = None;
        match self.controller.submit(Instant::now()) {
            Ok(_) => {
                self.screen = AppScreen::ExamResult;
                self.scroll = 0;
            }
            Err(e) => self.session_error(e),
        }
    }

    pub fn retry_exam(&mut self) {
        self.exit_session();
        self.start_exam();
    }

    pub fn tick(&mut self, now: Instant) {
        if self.controller.tick(now) {
            self.screen = AppScreen::ExamResult;
            self.scroll = 0;
            self.prompt = None;
            self.confirm = None;
            self.warn("Time is up; the exam was submitted automatically");
        }
    }

    pub fn answer_confirm(&mut self, yes: bool) {
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        if !yes {
            return;
        }
        match confirm {
            Confirm::SubmitExam => self.submit_exam(),
            Confirm::ClearWrong => self.clear_wrong(),
        }
    }

    pub fn discard_exam(&mut self) {
        self.confirm = None;
        self.exit_session();
        self.info("Exam discarded");
    }

    fn clear_wrong(&mut self) {
        let category = self.category;
        match self
            .controller
            .store_mut()
            .clear_ids(Collection::Wrong, category)
        {
            Ok(()) => self.info(format!("Cleared the class {category} wrong list")),
            Err(e) => self.error(format!("Could not clear the wrong list: {e}")),
        }
    }

    pub fn cycle_category(&mut self) {
        self.category = self.category.next();
    }

    pub fn cycle_order(&mut self) {
        self.order = self.order.next();
    }

    pub fn open_prompt(&mut self, kind: PromptKind) {
        let input = match kind {
            PromptKind::Goto => LineInput::numeric(),
            PromptKind::Search => LineInput::new(""),
        };
        self.prompt = Some(Prompt { kind, input });
    }

    pub fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match prompt.input.handle(key) {
            InputResult::Continue => {}
            InputResult::Cancel => self.prompt = None,
            InputResult::Submit => {
                if let Some(prompt) = self.prompt.take() {
                    let value = prompt.input.value().to_string();
                    match prompt.kind {
                        PromptKind::Goto => self.goto_number(&value),
                        PromptKind::Search => self.run_search(&value),
                    }
                }
            }
        }
    }

    /// Jump to a 1-based question number typed by the user.
    pub fn goto_number(&mut self, value: &str) {
        let Ok(number) = value.trim().parse::<isize>() else {
            let len = self.controller.session().map_or(0, |s| s.len());
            self.info(format!("Enter a question number from 1 to {len}"));
            return;
        };
        if let Err(e) = self.controller.goto(number - 1) {
            self.session_error(e);
        }
    }

    pub fn run_search(&mut self, keyword: &str) {
        let mut banks = Vec::new();
        let mut failed = Vec::new();
        for category in Category::ALL {
            match self.loader.load(category) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!(%category, error = %e, "search skipping bank");
                    failed.push(category.as_str());
                }
            }
        }

        match search::search(&banks, keyword) {
            Ok(results) => {
                tracing::info!(hits = results.hits.len(), tier = ?results.tier, "search");
                self.search_results = Some(results);
                self.screen = AppScreen::Search;
                self.scroll = 0;
                if !failed.is_empty() {
                    self.warn(format!("Could not load class {}", failed.join(", ")));
                }
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    fn scroll_limit(&self) -> usize {
        match self.screen {
            AppScreen::ExamResult => self.controller.result().map_or(0, |r| r.wrong.len()),
            AppScreen::Search => self.search_results.as_ref().map_or(0, |r| r.hits.len()),
            _ => 0,
        }
    }

    pub fn scroll_down(&mut self) {
        if self.scroll + 1 < self.scroll_limit() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn back_to_menu(&mut self) {
        self.screen = AppScreen::Menu;
        self.scroll = 0;
    }

    /// Wrong count, favorite count and whether saved practice exists for the
    /// selected category and order.
    pub fn menu_status(&self) -> (usize, usize, bool) {
        let stats = self.controller.store().stats();
        (
            stats.count(Collection::Wrong, self.category),
            stats.count(Collection::Favorite, self.category),
            stats.has_pending(self.category, self.order),
        )
    }

    pub fn in_session(&self) -> bool {
        matches!(self.controller.state(), SessionState::Active(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use hamexam::bank::EmbeddedSource;
    use hamexam::store::MemoryKvStore;

    fn app() -> App {
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        App::new(
            Config::default(),
            Box::new(EmbeddedSource::default()),
            Box::new(MemoryKvStore::new()),
            theme,
        )
    }

    fn type_keys(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_prompt_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
        app.handle_prompt_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    }

    #[test]
    fn practice_from_menu_enters_quiz() {
        let mut app = app();
        app.run_menu_action(MenuAction::Practice);
        assert_eq!(app.screen, AppScreen::Quiz);
        assert!(app.in_session());
        assert!(app.menu_status().2);

        app.request_exit();
        assert_eq!(app.screen, AppScreen::Menu);
        assert!(!app.in_session());
    }

    #[test]
    fn empty_review_shows_notice_and_stays_on_menu() {
        let mut app = app();
        app.run_menu_action(MenuAction::FavoriteOnly);
        assert_eq!(app.screen, AppScreen::Menu);
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Info));
    }

    #[test]
    fn exam_exit_asks_before_submitting() {
        let mut app = app();
        app.start_exam();
        app.request_exit();
        assert_eq!(app.confirm, Some(Confirm::SubmitExam));
        app.answer_confirm(false);
        assert_eq!(app.screen, AppScreen::Quiz);

        app.request_exit();
        app.answer_confirm(true);
        assert_eq!(app.screen, AppScreen::ExamResult);
        assert!(app.controller.result().is_some());
    }

    #[test]
    fn goto_prompt_reports_range() {
        let mut app = app();
        app.start_practice(PracticeFilter::None);
        app.open_prompt(PromptKind::Goto);
        type_keys(&mut app, "2");
        assert_eq!(app.controller.session().map(|s| s.current_index()), Some(1));

        app.open_prompt(PromptKind::Goto);
        type_keys(&mut app, "9999");
        assert_eq!(app.controller.session().map(|s| s.current_index()), Some(1));
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[test]
    fn search_prompt_opens_results() {
        let mut app = app();
        app.open_prompt(PromptKind::Search);
        type_keys(&mut app, "MC1-0001");
        assert_eq!(app.screen, AppScreen::Search);
        let results = app.search_results.as_ref().unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].category, Category::A);
    }

    #[test]
    fn blank_search_is_rejected() {
        let mut app = app();
        app.run_search("   ");
        assert_eq!(app.screen, AppScreen::Menu);
        assert_eq!(app.notice.as_ref().map(|n| n.level), Some(NoticeLevel::Error));
    }
}
