use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::Cell;
use std::path::PathBuf;

use crate::api::{self, ApiClient, FetchError};
use crate::config::session::Session;
use crate::config::AppConfig;
use crate::export::{self, ExportFormat};
use crate::reimbursement::filter::{self, StatusCounts, StatusFilter};
use crate::reimbursement::pagination::Paginator;
use crate::reimbursement::Reimbursement;
use crate::status::StatusMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Download,
    Help,
}

pub struct App {
    pub screen: Screen,
    pub popup: Popup,
    pub should_quit: bool,

    pub config: AppConfig,
    session_path: PathBuf,
    access_token: Option<String>,
    client: ApiClient,

    // Everything the server returned; filtering happens per render
    pub records: Vec<Reimbursement>,

    // Filter + pagination state
    pub search_query: String,
    pub search_active: bool,
    pub status_filter: StatusFilter,
    pub paginator: Paginator,

    // Card rows scrolled past on the current page; the grid reports the
    // largest useful value each time it is drawn
    pub scroll: usize,
    pub scroll_limit: Cell<usize>,

    // Message line under the header (persists until replaced)
    pub message: Option<StatusMessage>,

    // Fetch runs on the next tick so "Loading..." gets drawn first
    fetch_pending: bool,
    pub loading: bool,

    // Export runs on the next tick for the same reason
    pending_export: Option<ExportFormat>,
    pub is_downloading: bool,
    pub download_selected: usize,

    // Login view input
    pub token_input: String,
}

impl App {
    pub fn new(config: AppConfig, session_path: PathBuf) -> Result<Self> {
        let client = ApiClient::new(config.api_base_url.clone(), config.request_timeout())?;
        let session = Session::load_from(&session_path);
        let access_token = session.access_token().map(str::to_string);
        let paginator = Paginator::new(config.items_per_page);

        let mut app = Self {
            screen: Screen::Dashboard,
            popup: Popup::None,
            should_quit: false,

            config,
            session_path,
            access_token,
            client,

            records: Vec::new(),

            search_query: String::new(),
            search_active: false,
            status_filter: StatusFilter::All,
            paginator,

            scroll: 0,
            scroll_limit: Cell::new(0),

            message: None,

            fetch_pending: false,
            loading: false,

            pending_export: None,
            is_downloading: false,
            download_selected: 0,

            token_input: String::new(),
        };

        app.request_fetch();
        Ok(app)
    }

    /// Queue a fetch, or send the user to the login view when signed out
    pub fn request_fetch(&mut self) {
        if self.access_token.is_none() {
            tracing::info!("No access token, showing login");
            self.screen = Screen::Login;
            self.popup = Popup::None;
            return;
        }
        self.screen = Screen::Dashboard;
        self.fetch_pending = true;
        self.loading = true;
    }

    /// Records passing the current search text and facet
    pub fn filtered(&self) -> Vec<&Reimbursement> {
        filter::filter(&self.records, &self.search_query, self.status_filter)
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_records(&self.records)
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages(self.filtered().len())
    }

    /// Records on the current page of the filtered view
    pub fn page_records(&self) -> Vec<&Reimbursement> {
        let filtered = self.filtered();
        self.paginator.slice(&filtered).to_vec()
    }

    /// Quitting with `q` is only safe when no text field has focus
    pub fn accepts_quit_key(&self) -> bool {
        self.screen == Screen::Dashboard && self.popup == Popup::None && !self.search_active
    }

    pub async fn tick(&mut self) {
        if self.fetch_pending {
            self.fetch_pending = false;
            self.fetch().await;
        }

        if let Some(format) = self.pending_export.take() {
            self.run_export(format).await;
        }
    }

    async fn fetch(&mut self) {
        let Some(token) = self.access_token.clone() else {
            self.request_fetch();
            return;
        };
        let result = self.client.list_reimbursements(&token).await;
        self.apply_fetch_result(result);
    }

    pub fn apply_fetch_result(&mut self, result: Result<Vec<Reimbursement>, FetchError>) {
        let (records, message) = api::summarize(result);
        self.records = records;
        self.message = Some(message);
        self.loading = false;
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        let len = self.filtered().len();
        self.paginator.clamp(len);
        self.scroll = 0;
    }

    fn set_status_filter(&mut self, status: StatusFilter) {
        self.status_filter = status;
        self.clamp_page();
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.screen == Screen::Login {
            return self.handle_login_key(key);
        }

        // Handle popups first
        match self.popup {
            Popup::Download => return self.handle_download_key(key),
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
                return Ok(());
            }
            Popup::None => {}
        }

        if self.search_active {
            self.handle_search_key(key);
            return Ok(());
        }

        self.handle_normal_key(key)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.filtered().len();

        match key.code {
            // Facets
            KeyCode::Char('a') => self.set_status_filter(StatusFilter::All),
            KeyCode::Char('p') => self.set_status_filter(StatusFilter::Paid),
            KeyCode::Char('u') => self.set_status_filter(StatusFilter::Unpaid),
            KeyCode::Tab => self.set_status_filter(self.status_filter.next()),

            // Search
            KeyCode::Char('/') | KeyCode::Char('s') => self.search_active = true,
            KeyCode::Esc => {
                if !self.search_query.is_empty() {
                    self.search_query.clear();
                    self.clamp_page();
                }
            }

            // Page size
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.paginator.cycle_page_size_up();
                self.scroll = 0;
            }
            KeyCode::Char('-') => {
                self.paginator.cycle_page_size_down();
                self.scroll = 0;
            }

            // Paging
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(']') | KeyCode::PageDown => {
                self.paginator.next(len);
                self.scroll = 0;
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('[') | KeyCode::PageUp => {
                self.paginator.previous();
                self.scroll = 0;
            }

            // Scroll within a page taller than the screen
            KeyCode::Down | KeyCode::Char('j') => {
                if self.scroll < self.scroll_limit.get() {
                    self.scroll += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),

            // Download menu (disabled while an export runs)
            KeyCode::Char('d') => {
                if !self.is_downloading {
                    self.download_selected = 0;
                    self.popup = Popup::Download;
                }
            }

            // Refresh
            KeyCode::Char('R') | KeyCode::Char('r') => self.request_fetch(),

            KeyCode::Char('?') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.search_active = false,
            KeyCode::Backspace => {
                self.search_query.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.search_query.push(c);
            }
            _ => return,
        }
        self.clamp_page();
    }

    fn handle_download_key(&mut self, key: KeyEvent) -> Result<()> {
        let choices = ExportFormat::ALL.len();

        match key.code {
            KeyCode::Esc | KeyCode::Char('d') | KeyCode::Char('q') => {
                if !self.is_downloading {
                    self.popup = Popup::None;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.download_selected = (self.download_selected + 1) % choices;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.download_selected = (self.download_selected + choices - 1) % choices;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.start_export(ExportFormat::ALL[self.download_selected]);
            }
            KeyCode::Char('1') | KeyCode::Char('p') => self.start_export(ExportFormat::Pdf),
            KeyCode::Char('2') | KeyCode::Char('x') => self.start_export(ExportFormat::Xlsx),
            KeyCode::Char('3') | KeyCode::Char('c') => self.start_export(ExportFormat::Csv),
            _ => {}
        }
        Ok(())
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit_token(),
            KeyCode::Backspace => {
                self.token_input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.token_input.push(c);
            }
            _ => {}
        }
        Ok(())
    }

    /// Save the pasted token and fetch with it
    fn submit_token(&mut self) {
        let token = self.token_input.trim().to_string();
        if token.is_empty() {
            self.message = Some(StatusMessage::warning("Enter an access token"));
            return;
        }

        match Session::store_token(&self.session_path, &token) {
            Ok(_) => {
                self.access_token = Some(token);
                self.token_input.clear();
                self.message = None;
                self.request_fetch();
            }
            Err(e) => {
                tracing::error!("Could not save session: {:#}", e);
                self.message = Some(StatusMessage::error("Could not save session"));
            }
        }
    }

    /// Mark the download as running; the export happens on the next tick
    pub fn start_export(&mut self, format: ExportFormat) {
        if self.is_downloading {
            return;
        }
        self.is_downloading = true;
        self.pending_export = Some(format);
    }

    async fn run_export(&mut self, format: ExportFormat) {
        let rows = export::rows_for_export(&self.filtered());
        let dir = self.config.export_dir();

        let result = tokio::task::spawn_blocking(move || export::export(format, &rows, &dir)).await;

        self.message = Some(match result {
            Ok(Ok(path)) => {
                if self.config.notifications {
                    notify_export(format, &path);
                }
                StatusMessage::success(format.success_message())
            }
            Ok(Err(e)) => {
                tracing::error!("{}: {}", format.failure_message(), e);
                StatusMessage::error(format.failure_message())
            }
            Err(e) => {
                tracing::error!("{}: task failed: {}", format.failure_message(), e);
                StatusMessage::error(format.failure_message())
            }
        });

        self.is_downloading = false;
        self.popup = Popup::None;
    }
}

fn notify_export(format: ExportFormat, path: &std::path::Path) {
    let shown = notify_rust::Notification::new()
        .summary("reimburse")
        .body(&format!("{}\n{}", format.success_message(), path.display()))
        .icon("document-save")
        .show();
    if let Err(e) = shown {
        tracing::warn!("Could not show notification: {}", e);
    }
}
