use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::{stdout, Write};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::JobsApi;
use crate::api_state::{ApiState, StatusMachine, Ticket};
use crate::credentials::{CredentialStore, Session};
use crate::error::{ApiError, FALLBACK_MESSAGE};
use crate::login::{self, LoginOutcome};
use crate::models::{JobDetails, JobSummary, Profile};
use crate::query::{EmploymentType, JobQuery, SALARY_RANGES};
use crate::router::{NavMode, Navigator, Route};
use crate::search::JobSearch;
use crate::views::{self, DetailView, JobsView, ProfileView};

enum Msg {
    Input(KeyEvent),
    Jobs {
        generation: u64,
        result: Result<Vec<JobSummary>, ApiError>,
    },
    Details {
        generation: u64,
        result: Result<JobDetails, ApiError>,
    },
    Profile {
        generation: u64,
        result: Result<Profile, ApiError>,
    },
}

#[derive(Default)]
struct LoginForm {
    username: String,
    password: String,
    on_password: bool,
    error: Option<String>,
    submitting: bool,
}

struct App {
    api: Arc<dyn JobsApi>,
    credentials: CredentialStore,
    nav: Navigator,
    /// Route whose fetches have been issued.
    mounted: Option<Route>,
    search: JobSearch,
    details: StatusMachine<String, JobDetails>,
    profile: StatusMachine<(), Profile>,
    login_form: LoginForm,
    search_draft: String,
    editing_search: bool,
    selected: usize,
    scroll_offset: u16,
    list_state: ListState,
    /// Shown in place of the key help until the next key press.
    status: Option<String>,
    tx: UnboundedSender<Msg>,
    quit: bool,
}

impl App {
    fn new(
        api: Arc<dyn JobsApi>,
        credentials: CredentialStore,
        start: Route,
        tx: UnboundedSender<Msg>,
    ) -> Self {
        Self {
            api,
            credentials,
            nav: Navigator::new(start),
            mounted: None,
            search: JobSearch::new(JobQuery::default()),
            details: StatusMachine::new(),
            profile: StatusMachine::new(),
            login_form: LoginForm::default(),
            search_draft: String::new(),
            editing_search: false,
            selected: 0,
            scroll_offset: 0,
            list_state: ListState::default(),
            status: None,
            tx,
            quit: false,
        }
    }

    /// Guard the current route and issue its fetches if it was just entered.
    fn resolve(&mut self) {
        login::on_mount(&self.credentials, &mut self.nav);
        self.nav.enforce(self.credentials.is_present());

        let current = self.nav.current().clone();
        if self.mounted.as_ref() != Some(&current) {
            self.mounted = Some(current.clone());
            self.mount(current);
        }
    }

    fn mount(&mut self, route: Route) {
        match route {
            Route::Jobs => {
                let ticket = self.search.load();
                self.spawn_jobs(ticket);
                let ticket = self.profile.begin(());
                self.spawn_profile(ticket);
            }
            Route::JobDetail(id) => {
                self.scroll_offset = 0;
                let ticket = self.details.begin(id);
                self.spawn_details(ticket);
            }
            Route::Home | Route::Login | Route::NotFound => {}
        }
    }

    fn go(&mut self, to: Route) {
        self.nav.navigate(to, NavMode::Push);
        self.resolve();
    }

    fn back(&mut self) {
        if self.nav.back() {
            self.resolve();
        }
    }

    /// The credential for a request; its absence sends us to login instead.
    fn session(&mut self) -> Option<Session> {
        let session = self.credentials.session();
        if session.is_none() {
            self.nav.enforce(false);
            self.mounted = Some(self.nav.current().clone());
        }
        session
    }

    fn spawn_jobs(&mut self, ticket: Ticket<JobQuery>) {
        let Some(session) = self.session() else { return };
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.jobs(&session, &ticket.request).await;
            let _ = tx.send(Msg::Jobs {
                generation: ticket.generation,
                result,
            });
        });
    }

    fn spawn_details(&mut self, ticket: Ticket<String>) {
        let Some(session) = self.session() else { return };
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.job_details(&session, &ticket.request).await;
            let _ = tx.send(Msg::Details {
                generation: ticket.generation,
                result,
            });
        });
    }

    fn spawn_profile(&mut self, ticket: Ticket<()>) {
        let Some(session) = self.session() else { return };
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.profile(&session).await;
            let _ = tx.send(Msg::Profile {
                generation: ticket.generation,
                result,
            });
        });
    }

    fn apply(&mut self, msg: Msg) {
        match msg {
            Msg::Input(_) => {}
            Msg::Jobs { generation, result } => {
                if self.search.complete(generation, result) {
                    self.selected = 0;
                    self.list_state.select(Some(0));
                }
            }
            Msg::Details { generation, result } => {
                self.details.complete(generation, result);
            }
            Msg::Profile { generation, result } => {
                self.profile.complete(generation, result);
            }
        }
    }

    async fn finish_login(&mut self) {
        let outcome = login::submit(
            self.api.as_ref(),
            &mut self.credentials,
            &mut self.nav,
            &self.login_form.username,
            &self.login_form.password,
        )
        .await;
        self.login_form.submitting = false;

        match outcome {
            Ok(LoginOutcome::LoggedIn) => {
                self.login_form = LoginForm::default();
                self.resolve();
            }
            Ok(LoginOutcome::Rejected(message)) => {
                self.login_form.error = Some(message);
            }
            Err(e) => {
                tracing::error!("could not store credential: {e:#}");
                self.login_form.error = Some(format!("Could not save session: {e}"));
            }
        }
    }

    fn logout(&mut self) {
        if let Err(e) = login::logout(&mut self.credentials, &mut self.nav) {
            tracing::error!("could not clear credential: {e:#}");
            self.status = Some(format!("Logout failed: {e}"));
            return;
        }
        self.resolve();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }
        self.status = None;

        match self.nav.current().clone() {
            Route::Login => self.login_key(key),
            Route::Home => match key.code {
                KeyCode::Enter | KeyCode::Char('f') => self.go(Route::Jobs),
                KeyCode::Char('L') => self.logout(),
                KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
                _ => {}
            },
            Route::Jobs if self.editing_search => self.search_key(key),
            Route::Jobs => self.jobs_key(key),
            Route::JobDetail(_) => match key.code {
                KeyCode::Char('J') | KeyCode::PageDown | KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll_offset = self.scroll_offset.saturating_add(3)
                }
                KeyCode::Char('K') | KeyCode::PageUp | KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll_offset = self.scroll_offset.saturating_sub(3)
                }
                KeyCode::Char('r') => {
                    if matches!(self.details.current_state(), ApiState::Failure(_)) {
                        if let Some(ticket) = self.details.retry() {
                            self.spawn_details(ticket);
                        }
                    }
                }
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => self.back(),
                KeyCode::Char('L') => self.logout(),
                KeyCode::Char('q') => self.quit = true,
                _ => {}
            },
            Route::NotFound => match key.code {
                KeyCode::Char('q') => self.quit = true,
                _ => self.back(),
            },
        }
    }

    fn login_key(&mut self, key: KeyEvent) {
        if self.login_form.submitting {
            return;
        }
        let form = &mut self.login_form;
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.on_password = !form.on_password
            }
            KeyCode::Char(c) => {
                if form.on_password {
                    form.password.push(c);
                } else {
                    form.username.push(c);
                }
            }
            KeyCode::Backspace => {
                if form.on_password {
                    form.password.pop();
                } else {
                    form.username.pop();
                }
            }
            KeyCode::Enter => {
                form.error = None;
                form.submitting = true;
            }
            KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    fn search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.search_draft.push(c),
            KeyCode::Backspace => {
                self.search_draft.pop();
            }
            KeyCode::Enter => {
                self.editing_search = false;
                let ticket = if self.search_draft != self.search.query().search {
                    let draft = self.search_draft.clone();
                    self.search.set_search_term(&draft)
                } else {
                    self.search.submit_search()
                };
                self.spawn_jobs(ticket);
            }
            KeyCode::Esc => {
                self.editing_search = false;
                self.search_draft = self.search.query().search.clone();
            }
            _ => {}
        }
    }

    fn jobs_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('/') => self.editing_search = true,
            KeyCode::Down | KeyCode::Char('j') => {
                if let ApiState::Success(jobs) = self.search.state() {
                    if !jobs.is_empty() && self.selected < jobs.len() - 1 {
                        self.selected += 1;
                    }
                }
                self.list_state.select(Some(self.selected));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                self.list_state.select(Some(self.selected));
            }
            KeyCode::Enter => {
                let id = match self.search.state() {
                    ApiState::Success(jobs) => jobs.get(self.selected).map(|j| j.id.clone()),
                    _ => None,
                };
                if let Some(id) = id {
                    self.go(Route::JobDetail(id));
                }
            }
            KeyCode::Char(c @ '1'..='4') => {
                let kind = EmploymentType::ALL[c as usize - '1' as usize];
                let included = !self.search.query().includes(kind);
                let ticket = self.search.toggle_employment_type(kind, included);
                self.spawn_jobs(ticket);
            }
            KeyCode::Char(c @ '5'..='8') => {
                let range = SALARY_RANGES[c as usize - '5' as usize];
                let ticket = self.search.set_salary_floor(Some(range));
                self.spawn_jobs(ticket);
            }
            KeyCode::Char('0') => {
                let ticket = self.search.set_salary_floor(None);
                self.spawn_jobs(ticket);
            }
            KeyCode::Char('r') => {
                if matches!(self.search.state(), ApiState::Failure(_)) {
                    if let Some(ticket) = self.search.retry() {
                        self.spawn_jobs(ticket);
                    }
                }
            }
            KeyCode::Char('p') => {
                if matches!(self.profile.current_state(), ApiState::Failure(_)) {
                    if let Some(ticket) = self.profile.retry() {
                        self.spawn_profile(ticket);
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('h') => self.back(),
            KeyCode::Char('L') => self.logout(),
            KeyCode::Char('q') => self.quit = true,
            _ => {}
        }
    }
}

pub async fn run_browse(api: Arc<dyn JobsApi>, credentials: CredentialStore, start: Route) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(api, credentials, start, tx.clone());
    spawn_input_reader(tx);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut app, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

/// Reads a line from the terminal without echoing it.
pub fn read_password(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;

    enable_raw_mode()?;
    let read = read_hidden_line();
    disable_raw_mode()?;
    eprintln!();

    read
}

fn read_hidden_line() -> Result<String> {
    let mut line = String::new();
    loop {
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                anyhow::bail!("Login cancelled")
            }
            KeyCode::Enter => return Ok(line),
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Char(c) => line.push(c),
            _ => {}
        }
    }
}

/// Terminal reads block, so they live on their own thread.
fn spawn_input_reader(tx: UnboundedSender<Msg>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if tx.send(Msg::Input(key)).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("terminal input failed: {e}");
                break;
            }
        }
    });
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    rx: &mut UnboundedReceiver<Msg>,
) -> Result<()> {
    app.resolve();

    while !app.quit {
        terminal.draw(|frame| draw(frame, app))?;

        if app.login_form.submitting {
            app.finish_login().await;
            continue;
        }

        let Some(msg) = rx.recv().await else { break };
        match msg {
            Msg::Input(key) => app.handle_key(key),
            other => app.apply(other),
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let help = match app.nav.current().clone() {
        Route::Login => {
            draw_login(frame, chunks[0], &app.login_form);
            " tab:switch field  enter:login  esc:quit"
        }
        Route::Home => {
            draw_home(frame, chunks[0]);
            " enter:find jobs  L:logout  q:quit"
        }
        Route::Jobs => {
            draw_jobs(frame, chunks[0], app);
            if app.editing_search {
                " type to search  enter:search  esc:done"
            } else {
                " j/k:navigate  enter:open  /:search  1-4:type  5-8:salary 0:any  r:retry p:retry profile  h:home L:logout q:quit"
            }
        }
        Route::JobDetail(_) => {
            draw_detail(frame, chunks[0], app);
            " j/k:scroll  r:retry  esc:back  L:logout  q:quit"
        }
        Route::NotFound => {
            let text = Paragraph::new(views::NOT_FOUND_HEADING)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(text, chunks[0]);
            " any key:back  q:quit"
        }
    };

    let help = match &app.status {
        Some(status) => Paragraph::new(status.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(help, chunks[1]);
}

fn draw_login(frame: &mut Frame, area: Rect, form: &LoginForm) {
    let focused = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let (user_style, pass_style) = if form.on_password {
        (Style::default(), focused)
    } else {
        (focused, Style::default())
    };

    let mut lines = vec![
        Line::from(Span::styled("USERNAME", user_style)),
        Line::from(format!("  {}", form.username)),
        Line::from(""),
        Line::from(Span::styled("PASSWORD", pass_style)),
        Line::from(format!("  {}", "*".repeat(form.password.chars().count()))),
        Line::from(""),
    ];
    if form.submitting {
        lines.push(Line::from(Span::styled("Logging in...", Style::default().fg(Color::Yellow))));
    } else if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!("*{}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let widget = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Login "));
    frame.render_widget(widget, area);
}

fn draw_home(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            views::HOME_HEADING,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(views::HOME_DESCRIPTION),
        Line::from(""),
        Line::from(Span::styled("[ Find Jobs ]", Style::default().fg(Color::Cyan))),
    ];
    let widget = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Jobby "))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn draw_jobs(frame: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(columns[0]);

    // Profile panel
    let profile_text = match views::profile_view(app.profile.current_state()) {
        ProfileView::Nothing => Text::raw(""),
        ProfileView::Loading => Text::raw("Loading..."),
        ProfileView::Retry => Text::from(Span::styled(
            "[ Retry ] (p)",
            Style::default().fg(Color::Yellow),
        )),
        ProfileView::Profile(profile) => Text::from(vec![
            Line::from(Span::styled(
                profile.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(profile.short_bio.clone()),
        ]),
    };
    let profile = Paragraph::new(profile_text)
        .block(Block::default().borders(Borders::ALL).title(" Profile "))
        .wrap(Wrap { trim: true });
    frame.render_widget(profile, left[0]);

    // Filters
    let query = app.search.query();
    let mut filter_lines = vec![Line::from(Span::styled(
        "Type of Employment",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (i, kind) in EmploymentType::ALL.iter().enumerate() {
        let mark = if query.includes(*kind) { "[x]" } else { "[ ]" };
        filter_lines.push(Line::from(format!(" {} {} {}", i + 1, mark, kind.label())));
    }
    filter_lines.push(Line::from(""));
    filter_lines.push(Line::from(Span::styled(
        "Salary Range",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (i, range) in SALARY_RANGES.iter().enumerate() {
        let mark = if query.minimum_package == Some(*range) { "(o)" } else { "( )" };
        filter_lines.push(Line::from(format!(" {} {} {}", i + 5, mark, range.label)));
    }
    let filters = Paragraph::new(Text::from(filter_lines))
        .block(Block::default().borders(Borders::ALL).title(" Filters "));
    frame.render_widget(filters, left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(columns[1]);

    // Search bar
    let search_style = if app.editing_search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let shown = if app.editing_search {
        format!("{}_", app.search_draft)
    } else {
        app.search.query().search.clone()
    };
    let search = Paragraph::new(shown)
        .style(search_style)
        .block(Block::default().borders(Borders::ALL).title(" Search "));
    frame.render_widget(search, right[0]);

    // List
    match views::jobs_view(app.search.state()) {
        JobsView::Jobs(jobs) => {
            let items: Vec<ListItem> = jobs
                .iter()
                .map(|job| {
                    ListItem::new(format!(
                        "{} | {} | {} | {} | {}",
                        views::truncate(&job.title, 35),
                        job.location,
                        job.employment_type,
                        job.package_per_annum,
                        views::format_rating(job.rating)
                    ))
                })
                .collect();
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(format!(" Jobs ({}) ", jobs.len())))
                .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, right[1], &mut app.list_state);
        }
        view => {
            let lines = state_lines(&views::jobs_lines(&view), matches!(view, JobsView::Failure(_)));
            let widget = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title(" Jobs "))
                .wrap(Wrap { trim: false });
            frame.render_widget(widget, right[1]);
        }
    }
}

fn draw_detail(frame: &mut Frame, area: Rect, app: &App) {
    let view = views::detail_view(app.details.current_state());
    let DetailView::Detail(details) = &view else {
        let lines = state_lines(&views::detail_lines(&view), matches!(view, DetailView::Failure(_)));
        let widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Job "))
            .wrap(Wrap { trim: false });
        frame.render_widget(widget, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let job = &details.job;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(job.summary.title.clone(), bold)),
        Line::from(Span::styled(
            format!("* {}", views::format_rating(job.summary.rating)),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(format!(
            "{}  |  {}  |  {}",
            job.summary.location, job.summary.employment_type, job.summary.package_per_annum
        )),
        Line::from(""),
        Line::from(Span::styled("Description", bold)),
    ];
    if !job.company_website_url.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Visit: {}", job.company_website_url),
            Style::default().fg(Color::Cyan),
        )));
    }
    for line in textwrap::fill(&job.summary.job_description, 70).lines() {
        lines.push(Line::from(line.to_string()));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Skills", bold)));
    let names: Vec<&str> = job.skills.iter().map(|s| s.name.as_str()).collect();
    lines.push(Line::from(format!("  {}", names.join(", "))));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Life at Company", bold)));
    for line in textwrap::fill(&job.life_at_company.description, 68).lines() {
        lines.push(Line::from(format!("  {}", line)));
    }

    let detail = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Job "))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0));
    frame.render_widget(detail, chunks[0]);

    let items: Vec<ListItem> = details
        .similar_jobs
        .iter()
        .map(|job| {
            ListItem::new(Text::from(vec![
                Line::from(Span::styled(job.title.clone(), bold)),
                Line::from(format!(
                    "  {} | {} | * {}",
                    job.location,
                    job.employment_type,
                    views::format_rating(job.rating)
                )),
            ]))
        })
        .collect();
    let similar = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Similar Jobs ({}) ", details.similar_jobs.len())),
    );
    frame.render_widget(similar, chunks[1]);
}

/// Loading / empty / failure text, failure heading in red.
fn state_lines(lines: &[String], failed: bool) -> Text<'static> {
    let mut out: Vec<Line> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let style = if i == 0 {
            let base = Style::default().add_modifier(Modifier::BOLD);
            if failed && line == FALLBACK_MESSAGE {
                base.fg(Color::Red)
            } else {
                base
            }
        } else if failed && line == "Retry" {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let text = if failed && line == "Retry" {
            "[ Retry ] (r)".to_string()
        } else {
            line.clone()
        };
        out.push(Line::from(Span::styled(text, style)));
    }
    Text::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Call, FakeApi};
    use crate::clock::ManualClock;
    use crate::credentials::{Credential, MemoryStorage, TokenStorage, CREDENTIAL_TTL_DAYS};
    use chrono::{DateTime, TimeZone, Utc};

    /// Storage on a read-only disk: reads work, writes fail.
    struct ReadOnlyStorage {
        stored: Option<Credential>,
    }

    impl TokenStorage for ReadOnlyStorage {
        fn load(&self, _now: DateTime<Utc>) -> anyhow::Result<Option<Credential>> {
            Ok(self.stored.clone())
        }

        fn save(&mut self, _credential: &Credential) -> anyhow::Result<()> {
            anyhow::bail!("read-only file system")
        }

        fn remove(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("read-only file system")
        }
    }

    fn read_only_app(
        api: Arc<FakeApi>,
        stored: Option<Credential>,
        start: Route,
    ) -> (App, UnboundedReceiver<Msg>) {
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        let credentials = CredentialStore::new(Box::new(ReadOnlyStorage { stored }), clock);
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(api, credentials, start, tx), rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(api: Arc<FakeApi>, logged_in: bool, start: Route) -> (App, UnboundedReceiver<Msg>) {
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        let mut credentials = CredentialStore::new(Box::new(MemoryStorage::default()), clock);
        if logged_in {
            credentials.set("abc123", CREDENTIAL_TTL_DAYS).unwrap();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(api, credentials, start, tx), rx)
    }

    async fn pump(app: &mut App, rx: &mut UnboundedReceiver<Msg>, n: usize) {
        for _ in 0..n {
            let msg = rx.recv().await.unwrap();
            app.apply(msg);
        }
    }

    #[tokio::test]
    async fn test_protected_start_without_credential_lands_on_login() {
        let api = Arc::new(FakeApi::default());
        let (mut app, _rx) = app(api.clone(), false, Route::Jobs);
        app.resolve();

        assert_eq!(app.nav.current(), &Route::Login);
        assert_eq!(app.nav.history(), &[Route::Login]);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_jobs_mount_fetches_list_and_profile() {
        let api = Arc::new(FakeApi::default());
        let (mut app, mut rx) = app(api.clone(), true, Route::Home);
        app.resolve();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.nav.current(), &Route::Jobs);

        pump(&mut app, &mut rx, 2).await;
        assert_eq!(app.search.state(), &ApiState::Success(Vec::new()));
        assert!(matches!(app.profile.current_state(), ApiState::Success(_)));
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_filter_keys_reissue_query() {
        let api = Arc::new(FakeApi::default());
        let (mut app, mut rx) = app(api.clone(), true, Route::Jobs);
        app.resolve();
        pump(&mut app, &mut rx, 2).await;

        app.handle_key(key(KeyCode::Char('1')));
        app.handle_key(key(KeyCode::Char('5')));
        pump(&mut app, &mut rx, 2).await;

        let last = api
            .calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                Call::Jobs { params, .. } => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(last[0].1, "FULLTIME");
        assert_eq!(last[1].1, "1000000");
    }

    #[tokio::test]
    async fn test_detail_failure_then_retry_hits_same_id() {
        let api = Arc::new(FakeApi::default());
        api.push_details(Err(ApiError::Fetch {
            status: 404,
            message: None,
        }));
        let (mut app, mut rx) = app(api.clone(), true, Route::JobDetail("42".to_string()));
        app.resolve();
        pump(&mut app, &mut rx, 1).await;
        assert!(matches!(app.details.current_state(), ApiState::Failure(_)));

        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.details.current_state(), &ApiState::Loading);
        pump(&mut app, &mut rx, 1).await;
        assert!(matches!(app.details.current_state(), ApiState::Success(_)));

        let detail_calls: Vec<Call> = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::JobDetails { .. }))
            .collect();
        assert_eq!(detail_calls.len(), 2);
        assert_eq!(detail_calls[0], detail_calls[1]);
    }

    #[tokio::test]
    async fn test_login_form_submits_and_goes_home() {
        let api = Arc::new(FakeApi::default());
        api.push_login(Ok("abc123".to_string()));
        let (mut app, _rx) = app(api.clone(), false, Route::Login);
        app.resolve();

        for c in "rahul".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Tab));
        for c in "rahul@2021".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert!(app.login_form.submitting);

        // Enter while in flight is ignored.
        app.handle_key(key(KeyCode::Enter));
        app.finish_login().await;

        assert_eq!(app.nav.current(), &Route::Home);
        assert!(app.credentials.is_present());
        assert_eq!(
            api.calls(),
            vec![Call::Login {
                username: "rahul".to_string(),
                password: "rahul@2021".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_logout_returns_to_login() {
        let api = Arc::new(FakeApi::default());
        let (mut app, _rx) = app(api, true, Route::Home);
        app.resolve();
        app.handle_key(key(KeyCode::Char('L')));

        assert_eq!(app.nav.current(), &Route::Login);
        assert!(!app.credentials.is_present());
    }

    #[tokio::test]
    async fn test_unsaved_login_stays_on_form_with_error() {
        let api = Arc::new(FakeApi::default());
        api.push_login(Ok("abc123".to_string()));
        let (mut app, _rx) = read_only_app(api, None, Route::Login);
        app.resolve();

        app.handle_key(key(KeyCode::Enter));
        app.finish_login().await;

        assert_eq!(app.nav.current(), &Route::Login);
        assert!(!app.login_form.submitting);
        let error = app.login_form.error.clone().unwrap();
        assert!(error.contains("read-only file system"), "{error}");
        assert!(!app.quit);
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_screen_and_reports() {
        let api = Arc::new(FakeApi::default());
        let stored = Credential {
            value: "abc123".to_string(),
            expires_at: Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap(),
            scope: "/".to_string(),
        };
        let (mut app, _rx) = read_only_app(api, Some(stored), Route::Home);
        app.resolve();
        app.handle_key(key(KeyCode::Char('L')));

        assert_eq!(app.nav.current(), &Route::Home);
        assert!(app.status.as_deref().unwrap().starts_with("Logout failed"));

        // Cleared by the next key.
        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.status.is_none());
    }

    #[tokio::test]
    async fn test_abandoned_search_draft_is_discarded() {
        let api = Arc::new(FakeApi::default());
        let (mut app, mut rx) = app(api, true, Route::Jobs);
        app.resolve();
        pump(&mut app, &mut rx, 2).await;

        app.handle_key(key(KeyCode::Char('/')));
        for c in "rust".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Esc));

        assert!(!app.editing_search);
        assert_eq!(app.search_draft, "");
        assert_eq!(app.search.query().search, "");
    }
}
