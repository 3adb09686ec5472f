mod app;
mod event;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};
use tracing_subscriber::EnvFilter;

use hamexam::bank::{BankSource, DirSource, EmbeddedSource};
use hamexam::config::Config;
use hamexam::session::countdown::format_clock;
use hamexam::session::{SessionMode, SessionState};
use hamexam::store::{JsonStore, KvStore, MemoryKvStore};

use app::{App, AppScreen, Confirm, NoticeLevel, PromptKind};
use event::{AppEvent, EventHandler};
use ui::components::answer_sheet::AnswerSheet;
use ui::components::dashboard::Dashboard;
use ui::components::progress_bar::ProgressBar;
use ui::components::question_view::QuestionView;
use ui::components::search_results::SearchResultsView;
use ui::layout::{AppLayout, pack_hint_lines};
use ui::theme::Theme;

#[derive(Parser)]
#[command(name = "hamexam", version, about = "Terminal trainer for amateur radio license exams")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Read question banks from this directory")]
    bank_dir: Option<String>,

    #[arg(long, help = "Fetch question banks from this base URL")]
    bank_url: Option<String>,

    #[arg(long, help = "Directory for saved progress and logs")]
    data_dir: Option<String>,

    #[arg(long, help = "Keep progress in memory only")]
    ephemeral: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_default();
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.bank_dir {
        config.bank_dir = Some(dir);
    }
    if let Some(url) = cli.bank_url {
        config.bank_url = Some(url);
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    config.validate(&Theme::available_themes());

    init_logging(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), data_dir = %config.data_dir, "starting");

    let source = bank_source(&config);
    let (kv, store_warning) = kv_store(&config, cli.ephemeral);

    let theme = Theme::load(&config.theme).unwrap_or_default();
    let theme: &'static Theme = Box::leak(Box::new(theme));

    let mut app = App::new(config, source, kv, theme);
    if let Some(warning) = store_warning {
        app.warn(warning);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(250));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = ?err, "exiting on error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file under the data directory; the terminal belongs to the UI.
fn init_logging(config: &Config) {
    let dir = config.data_path();
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("hamexam.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// A URL wins over a directory; the bundled banks are the fallback.
fn bank_source(config: &Config) -> Box<dyn BankSource> {
    if let Some(source) = config.bank_url.as_deref().and_then(http_source) {
        return source;
    }
    match &config.bank_dir {
        Some(dir) => Box::new(DirSource::new(dir)),
        None => Box::new(EmbeddedSource),
    }
}

#[cfg(feature = "network")]
fn http_source(url: &str) -> Option<Box<dyn BankSource>> {
    Some(Box::new(hamexam::bank::HttpSource::new(url)))
}

#[cfg(not(feature = "network"))]
fn http_source(url: &str) -> Option<Box<dyn BankSource>> {
    tracing::warn!(%url, "built without network support; ignoring bank_url");
    None
}

fn kv_store(config: &Config, ephemeral: bool) -> (Box<dyn KvStore>, Option<String>) {
    if ephemeral {
        return (Box::new(MemoryKvStore::new()), None);
    }
    match JsonStore::with_base_dir(config.data_path()) {
        Ok(store) => (Box::new(store), None),
        Err(e) => {
            tracing::warn!(error = %e, "falling back to in-memory progress");
            (
                Box::new(MemoryKvStore::new()),
                Some(format!("Progress will not be saved: {e}")),
            )
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.tick(Instant::now()),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.prompt.is_some() {
        app.handle_prompt_key(key);
        return;
    }

    app.notice = None;

    if let Some(confirm) = app.confirm {
        match (confirm, key.code) {
            (_, KeyCode::Char('y')) => app.answer_confirm(true),
            (Confirm::SubmitExam, KeyCode::Char('d')) => app.discard_exam(),
            (_, KeyCode::Char('n')) | (_, KeyCode::Esc) => app.answer_confirm(false),
            _ => {}
        }
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::ExamResult => handle_result_key(app, key),
        AppScreen::Search => handle_search_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Tab | KeyCode::Char('c') => app.cycle_category(),
        KeyCode::Char('o') => app.cycle_order(),
        KeyCode::Enter => {
            if let Some(action) = app.menu.selected_action() {
                app.run_menu_action(action);
            }
        }
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for_key(ch) {
                app.run_menu_action(action);
            }
        }
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.request_exit(),
        KeyCode::Left | KeyCode::PageUp => app.prev_question(),
        KeyCode::Right | KeyCode::PageDown | KeyCode::Enter => app.next_question(),
        KeyCode::Char(':') => app.open_prompt(PromptKind::Goto),
        KeyCode::Char('*') => app.toggle_favorite(),
        KeyCode::Char('-') => app.remove_from_wrong(),
        KeyCode::Char(ch) if ch.is_ascii_alphabetic() => app.answer(ch),
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('q') | KeyCode::Esc => app.exit_session(),
        KeyCode::Char('r') => app.retry_exam(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.back_to_menu(),
        KeyCode::Char('/') => app.open_prompt(PromptKind::Search),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::Quiz => render_quiz(frame, app),
        AppScreen::ExamResult => render_result(frame, app),
        AppScreen::Search => render_search(frame, app),
    }

    if let Some(confirm) = app.confirm {
        render_confirm(frame, app, confirm);
    }
}

fn header_line<'a>(app: &App, title: &'a str, info: String) -> Paragraph<'a> {
    let colors = &app.theme.colors;
    Paragraph::new(Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()))
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    let (wrong, favorites, pending) = app.menu_status();
    let rule = app.controller.exam_rule(app.category);
    let header_info = format!(
        " Class {} | exam {} questions, {} min, pass {} | order: {} | wrong {wrong} | favorites {favorites}{}",
        app.category,
        rule.total,
        rule.time,
        rule.pass,
        app.order.label(),
        if pending { " | saved practice" } else { "" },
    );
    frame.render_widget(header_line(app, " hamexam ", header_info), layout[0]);

    let menu_area = ui::layout::centered_rect(50, 90, layout[1]);
    frame.render_widget(&app.menu, menu_area);

    render_footer(
        frame,
        app,
        layout[2],
        &[
            "[1-6] Start",
            "[c/Tab] Class",
            "[o] Order",
            "[/] Search",
            "[x] Clear wrong list",
            "[q] Quit",
        ],
    );
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let Some(session) = app.controller.session() else {
        return;
    };
    let now = Instant::now();

    let app_layout = AppLayout::new(area);
    let tier = app_layout.tier;

    let mode_info = match session.mode() {
        SessionMode::Exam => match session.remaining_secs(now) {
            Some(secs) => format!(" Class {} | {} left", session.category(), format_clock(secs)),
            None => format!(" Class {}", session.category()),
        },
        SessionMode::Practice { order, .. } => {
            format!(" Class {} | {}", session.category(), order.label())
        }
    };
    let title = format!(" {} ", session.mode().label());
    frame.render_widget(header_line(app, &title, mode_info), app_layout.header);

    let show_progress = tier.show_progress_bar(area.height);
    let mut constraints = vec![Constraint::Min(6)];
    if show_progress {
        constraints.push(Constraint::Length(3));
    }
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(app_layout.main);

    let view = QuestionView::new(
        session,
        app.controller.is_favorite(),
        app.controller.is_wrong(),
        app.theme,
    );
    frame.render_widget(view, main_layout[0]);

    if show_progress {
        let progress = ProgressBar::new(
            "Answered",
            session.answered_count(),
            session.len(),
            app.theme,
        );
        frame.render_widget(progress, main_layout[1]);
    }

    if let Some(sidebar) = app_layout.sidebar {
        frame.render_widget(AnswerSheet::new(session, now, app.theme), sidebar);
    }

    let hints: &[&str] = if session.mode().is_exam() {
        &["[A-Z] Answer", "[←/→] Prev/Next", "[:] Go to", "[Esc] Submit or quit"]
    } else {
        &[
            "[A-Z] Answer",
            "[←/→] Prev/Next",
            "[:] Go to",
            "[*] Favorite",
            "[-] Remove from wrong list",
            "[Esc] Menu",
        ]
    };
    render_footer(frame, app, app_layout.footer, hints);
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    if let SessionState::Graded(result) = app.controller.state() {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        let centered = ui::layout::centered_rect(70, 85, layout[0]);
        frame.render_widget(Dashboard::new(result, app.scroll, app.theme), centered);
        render_footer(frame, app, layout[1], &[]);
    }
}

fn render_search(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    if let Some(results) = &app.search_results {
        frame.render_widget(
            SearchResultsView::new(results, app.scroll, app.theme),
            layout[0],
        );
    }
    render_footer(
        frame,
        app,
        layout[1],
        &["[j/k] Scroll", "[/] New search", "[Esc] Menu"],
    );
}

/// Bottom rows: the open prompt, else the latest notice, else key hints.
fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;

    if let Some(prompt) = &app.prompt {
        let label = match prompt.kind {
            PromptKind::Goto => " Go to question: ",
            PromptKind::Search => " Search (id, number or text): ",
        };
        let (before, cursor, after) = prompt.input.render_parts();
        let cursor_text = cursor.map(String::from).unwrap_or_else(|| " ".to_string());
        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(colors.accent())),
            Span::styled(before, Style::default().fg(colors.fg())),
            Span::styled(
                cursor_text,
                Style::default().fg(colors.bg()).bg(colors.fg()),
            ),
            Span::styled(after, Style::default().fg(colors.fg())),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(notice) = &app.notice {
        let color = match notice.level {
            NoticeLevel::Info => colors.accent(),
            NoticeLevel::Warning => colors.warning(),
            NoticeLevel::Error => colors.error(),
        };
        let line = Line::from(Span::styled(
            format!(" {}", notice.text),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let lines: Vec<Line> = pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_dim()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_confirm(frame: &mut ratatui::Frame, app: &App, confirm: Confirm) {
    let colors = &app.theme.colors;
    let area = frame.area();

    let (title, body, keys) = match confirm {
        Confirm::SubmitExam => {
            let unanswered = app
                .controller
                .session()
                .map_or(0, |s| s.len() - s.answered_count());
            (
                " Finish exam ",
                format!("Submit now? {unanswered} question(s) unanswered."),
                "[y] Submit  [d] Discard  [n] Keep going",
            )
        }
        Confirm::ClearWrong => (
            " Clear wrong list ",
            format!("Forget every recorded mistake for class {}?", app.category),
            "[y] Clear  [n] Cancel",
        ),
    };

    let width = 56.min(area.width);
    let height = 6.min(area.height);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);

    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(colors.warning()))
        .style(Style::default().bg(colors.bg()));
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {body}"), Style::default().fg(colors.fg()))),
        Line::from(""),
        Line::from(Span::styled(format!(" {keys}"), Style::default().fg(colors.accent()))),
    ];
    frame.render_widget(Paragraph::new(text).block(block), popup);
}
