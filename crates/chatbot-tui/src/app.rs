use chatbot_core::{
    BackendClient, ChatError, ChatSession, ConnectionStatus, HealthTicket, PendingRequest,
    SubmitRejected,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::tui::AppEvent;

/// Lines scrolled per mouse wheel notch
const WHEEL_STEP: u16 = 3;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: ChatSession,

    // Composer
    pub input: String,
    pub input_cursor: usize, // char position in input

    // Settings panel
    pub show_settings: bool,
    pub url_input: String,
    pub url_cursor: usize,

    // Blocking notice shown over everything until dismissed
    pub alert: Option<String>,

    // Transcript scrolling. The renderer resolves `stick_to_bottom` once it
    // knows how many wrapped lines the transcript takes.
    pub chat_scroll: u16,
    pub max_chat_scroll: u16,
    pub chat_page: u16,
    pub stick_to_bottom: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    client: BackendClient,
    chat_task: Option<JoinHandle<()>>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(session: ChatSession, client: BackendClient, events: UnboundedSender<AppEvent>) -> Self {
        let url_input = session.backend_url().to_string();
        let url_cursor = url_input.chars().count();

        Self {
            should_quit: false,
            session,

            input: String::new(),
            input_cursor: 0,

            show_settings: false,
            url_input,
            url_cursor,

            alert: None,

            chat_scroll: 0,
            max_chat_scroll: 0,
            chat_page: 0,
            stick_to_bottom: true,

            animation_frame: 0,

            chat_area: None,

            client,
            chat_task: None,
            events,
        }
    }

    /// Re-check the current backend ("Test Connection")
    pub fn check_connection(&mut self) {
        let ticket = self.session.begin_health_check();
        self.spawn_health_check(ticket);
    }

    /// Push the settings field into the session; every edit re-checks the backend.
    pub fn apply_url_input(&mut self) {
        if self.url_input == self.session.backend_url() {
            return;
        }
        let ticket = self.session.set_backend_url(self.url_input.clone());
        self.spawn_health_check(ticket);
    }

    fn spawn_health_check(&self, ticket: HealthTicket) {
        let client = self.client.with_base_url(&ticket.url);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let status = client.check_health().await;
            let _ = tx.send(AppEvent::HealthChecked {
                generation: ticket.generation,
                status,
            });
        });
    }

    pub fn on_health_checked(&mut self, generation: u64, status: ConnectionStatus) {
        self.session.finish_health_check(generation, status);
    }

    /// Submit the composer contents
    pub fn send_message(&mut self) {
        match self.session.submit(&self.input) {
            Ok(pending) => {
                self.input.clear();
                self.input_cursor = 0;
                self.stick_to_bottom = true;
                self.spawn_chat_request(pending);
            }
            Err(SubmitRejected::NotConnected) => {
                info!("send blocked: backend not connected");
                self.alert = Some(SubmitRejected::NotConnected.to_string());
            }
            Err(reason) => debug!(%reason, "send ignored"),
        }
    }

    fn spawn_chat_request(&mut self, pending: PendingRequest) {
        let client = self.client.with_base_url(self.session.backend_url());
        let tx = self.events.clone();
        self.chat_task = Some(tokio::spawn(async move {
            let outcome = client.chat(&pending.messages).await;
            let _ = tx.send(AppEvent::ChatFinished {
                id: pending.id,
                outcome,
            });
        }));
    }

    pub fn on_chat_finished(&mut self, id: u64, outcome: Result<String, ChatError>) {
        if self.session.finish_request(id, outcome) {
            self.chat_task = None;
            self.stick_to_bottom = true;
        }
    }

    /// Abort the in-flight request, if there is one
    pub fn cancel_request(&mut self) -> bool {
        if let Some(task) = self.chat_task.take() {
            task.abort();
        }
        let cancelled = self.session.cancel();
        if cancelled {
            self.stick_to_bottom = true;
        }
        cancelled
    }

    pub fn clear_chat(&mut self) {
        self.session.clear();
        self.chat_scroll = 0;
        self.stick_to_bottom = true;
    }

    pub fn toggle_settings(&mut self) {
        self.show_settings = !self.show_settings;
        if self.show_settings {
            self.url_input = self.session.backend_url().to_string();
            self.url_cursor = self.url_input.chars().count();
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.stick_to_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll);
        if self.chat_scroll == self.max_chat_scroll {
            self.stick_to_bottom = true;
        }
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_up(self.chat_page.max(1));
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_down(self.chat_page.max(1));
    }

    pub fn wheel_up(&mut self) {
        self.scroll_up(WHEEL_STEP);
    }

    pub fn wheel_down(&mut self) {
        self.scroll_down(WHEEL_STEP);
    }
}
