//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - `Guide` for chat orchestration, journal and visualizer calls
//! - Local view state for rendering
//!
//! The App never mutates turn state itself. Chat sends are spawned onto the
//! runtime so the guide's thinking delay never blocks the event loop; the
//! resulting bubbles arrive back over the [`GuideMessage`] channel.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use guide_core::backend::JournalBackend;
use guide_core::speech::{run_capture, SpeechRecognizer, TranscriptCapture};
use guide_core::{
    build_cards, load_config, CardList, DreamCard, DreamRecord, Gallery, Guide, GuideMessage,
    HttpJournalBackend, MessageRole, ProfileStore,
};

/// How long the welcome banner stays personalized after a login
const WELCOME_BANNER_SECS: u64 = 10;

/// Which main view is active
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    /// Analyzed dream cards
    Journal,
    /// Dream image generation
    Visualizer,
}

/// One rendered chat bubble
#[derive(Clone, Debug)]
pub struct ChatBubble {
    /// Who the bubble belongs to
    pub role: MessageRole,
    /// Bubble text
    pub text: String,
    /// Error bubbles render in the warning style
    pub is_error: bool,
}

/// Main application state
pub struct App {
    /// Is the app still running?
    pub(crate) running: bool,

    // === Guide Integration ===
    /// The chat turn controller, shared with spawned send tasks
    pub(crate) guide: Arc<Guide<HttpJournalBackend>>,
    /// Messages from the guide
    rx: mpsc::Receiver<GuideMessage>,
    /// Login token and profile persistence
    store: Option<ProfileStore>,
    /// Speech engine, when one is installed on this system
    recognizer: Option<Box<dyn SpeechRecognizer>>,

    // === View State ===
    /// Active tab
    pub(crate) tab: Tab,
    /// Header banner text
    pub(crate) banner: String,
    /// When the personalized banner reverts to the app name
    banner_expiry: Option<Instant>,
    /// Transient status line
    pub(crate) status: Option<String>,
    /// When the status line disappears
    status_expiry: Option<Instant>,

    // === Journal Tab ===
    /// Records as last fetched
    pub(crate) dreams: Vec<DreamRecord>,
    /// Formatted cards for the records
    pub(crate) cards: Vec<DreamCard>,
    /// Per-card expansion state
    pub(crate) card_list: CardList,
    /// Selected card index
    pub(crate) selected_card: usize,
    /// Whether the new-dream form is open
    pub(crate) composing: bool,
    /// Whether the form focus is on the title (vs the content)
    pub(crate) compose_title_focused: bool,
    /// New dream title input
    pub(crate) title_input: String,
    /// New dream content input
    pub(crate) content_input: String,

    // === Chat Overlay ===
    /// Chat input buffer
    pub(crate) chat_input: String,
    /// Rendered transcript
    pub(crate) bubbles: Vec<ChatBubble>,
    /// Typing indicator
    pub(crate) typing: bool,

    // === Visualizer Tab ===
    /// Dream description input
    pub(crate) dream_input: String,
    /// Image gallery
    pub(crate) gallery: Gallery,
    /// Selected image index
    pub(crate) selected_image: usize,
}

impl App {
    /// Create a new App instance
    pub async fn new() -> anyhow::Result<Self> {
        let config = load_config()?;
        let store = ProfileStore::default_store();

        let (tx, rx) = mpsc::channel(100);
        let backend = HttpJournalBackend::from_config(&config);
        let guide = Arc::new(Guide::new(backend, config, tx));
        guide.start().await;

        let (banner, banner_expiry) = welcome_banner(store.as_ref());

        let mut app = Self {
            running: true,
            guide,
            rx,
            store,
            recognizer: None,
            tab: Tab::Journal,
            banner,
            banner_expiry,
            status: None,
            status_expiry: None,
            dreams: Vec::new(),
            cards: Vec::new(),
            card_list: CardList::new(),
            selected_card: 0,
            composing: false,
            compose_title_focused: true,
            title_input: String::new(),
            content_input: String::new(),
            chat_input: String::new(),
            bubbles: Vec::new(),
            typing: false,
            dream_input: String::new(),
            gallery: Gallery::new(),
            selected_image: 0,
        };

        app.refresh_dreams().await;
        Ok(app)
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let frame_duration = Duration::from_millis(100);
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key).await
                            }
                            _ => {}
                        }
                    }
                }

                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.process_guide_messages();
            self.update();
            self.render(terminal)?;

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Whether the chat overlay is open
    pub(crate) fn chat_open(&self) -> bool {
        self.guide.session().lock().is_open()
    }

    /// Process all pending messages from the Guide
    fn process_guide_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                GuideMessage::Message { role, text, .. } => {
                    self.bubbles.push(ChatBubble {
                        role,
                        text,
                        is_error: false,
                    });
                }
                GuideMessage::Typing { active } => self.typing = active,
                GuideMessage::TurnFailed { error } => {
                    self.typing = false;
                    self.bubbles.push(ChatBubble {
                        role: MessageRole::System,
                        text: error,
                        is_error: true,
                    });
                }
                GuideMessage::ConversationReset => self.bubbles.clear(),
                GuideMessage::Notify { message, .. } => self.set_status(message),
                // The chat input title reads the session's pending question
                GuideMessage::PendingQuestion { .. } => {}
            }
        }
    }

    /// Expire the banner and status line
    fn update(&mut self) {
        if let Some(expiry) = self.banner_expiry {
            if Instant::now() >= expiry {
                self.banner = "REMinder".to_string();
                self.banner_expiry = None;
            }
        }
        if let Some(expiry) = self.status_expiry {
            if Instant::now() >= expiry {
                self.status = None;
                self.status_expiry = None;
            }
        }
    }

    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        terminal.draw(|frame| crate::ui::draw(frame, self))?;
        Ok(())
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.status_expiry = Some(
            Instant::now() + Duration::from_millis(self.guide.config().status_expiry_ms),
        );
    }

    fn token(&self) -> Option<String> {
        self.store.as_ref().and_then(|s| s.token().ok().flatten())
    }

    // === Keyboard ===

    async fn handle_key(&mut self, key: event::KeyEvent) {
        // Global bindings first
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.running = false;
                    return;
                }
                KeyCode::Char('g') => {
                    self.guide.session().lock().toggle_open();
                    return;
                }
                _ => {}
            }
        }

        if self.chat_open() {
            self.handle_chat_key(key);
            return;
        }

        if key.code == KeyCode::Tab && !self.composing {
            self.tab = match self.tab {
                Tab::Journal => Tab::Visualizer,
                Tab::Visualizer => Tab::Journal,
            };
            return;
        }

        match self.tab {
            Tab::Journal => self.handle_journal_key(key).await,
            Tab::Visualizer => self.handle_visualizer_key(key).await,
        }
    }

    fn handle_chat_key(&mut self, key: event::KeyEvent) {
        match key.code {
            KeyCode::Esc => self.guide.session().lock().toggle_open(),
            KeyCode::Enter => {
                let awaiting = self.guide.session().lock().is_awaiting();
                let Some(text) = take_chat_input(&mut self.chat_input, awaiting) else {
                    return;
                };
                // Spawned so the thinking delay never blocks the event loop
                let guide = Arc::clone(&self.guide);
                tokio::spawn(async move {
                    if let Err(e) = guide.send_message(&text).await {
                        tracing::warn!(error = %e, "chat send failed");
                    }
                });
            }
            KeyCode::Backspace => {
                self.chat_input.pop();
            }
            KeyCode::Char(c) => self.chat_input.push(c),
            _ => {}
        }
    }

    async fn handle_journal_key(&mut self, key: event::KeyEvent) {
        if self.composing {
            self.handle_compose_key(key).await;
            return;
        }

        match key.code {
            KeyCode::Char('n') => {
                self.composing = true;
                self.compose_title_focused = true;
            }
            KeyCode::Char('r') => self.refresh_dreams().await,
            KeyCode::Char('x') => self.delete_selected_dream().await,
            KeyCode::Up => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_card + 1 < self.cards.len() {
                    self.selected_card += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(card) = self.cards.get(self.selected_card) {
                    self.card_list.toggle(card.key);
                }
            }
            _ => {}
        }
    }

    async fn handle_compose_key(&mut self, key: event::KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    self.save_dream().await;
                    return;
                }
                KeyCode::Char('r') => {
                    self.capture_speech().await;
                    return;
                }
                _ => {}
            }
        }
        match key.code {
            KeyCode::Esc => {
                self.composing = false;
                self.title_input.clear();
                self.content_input.clear();
            }
            KeyCode::Tab => self.compose_title_focused = !self.compose_title_focused,
            KeyCode::Enter => {
                if self.compose_title_focused {
                    self.compose_title_focused = false;
                } else {
                    self.content_input.push('\n');
                }
            }
            KeyCode::Backspace => {
                if self.compose_title_focused {
                    self.title_input.pop();
                } else {
                    self.content_input.pop();
                }
            }
            KeyCode::Char(c) => {
                if self.compose_title_focused {
                    self.title_input.push(c);
                } else {
                    self.content_input.push(c);
                }
            }
            _ => {}
        }
    }

    async fn handle_visualizer_key(&mut self, key: event::KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            self.dream_input.clear();
            self.gallery.clear();
            self.selected_image = 0;
            return;
        }
        match key.code {
            KeyCode::Enter => self.generate_images().await,
            KeyCode::Left => {
                self.selected_image = self.selected_image.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.selected_image + 1 < self.gallery.images().len() {
                    self.selected_image += 1;
                }
            }
            KeyCode::Delete => {
                self.gallery.delete_image(self.selected_image);
                if self.selected_image >= self.gallery.images().len() {
                    self.selected_image = self.gallery.images().len().saturating_sub(1);
                }
            }
            KeyCode::Backspace => {
                self.dream_input.pop();
            }
            KeyCode::Char(c) => self.dream_input.push(c),
            _ => {}
        }
    }

    // === Journal operations ===

    async fn refresh_dreams(&mut self) {
        let Some(token) = self.token() else {
            self.set_status("You are not logged in.");
            return;
        };

        match self.guide.backend().list_dreams(&token).await {
            Ok(dreams) => {
                self.cards = build_cards(&dreams);
                self.selected_card = 0;
                // Prime the chat with the freshest analysis
                if let Some(newest) = dreams.first() {
                    self.guide.prime_for_dream(newest).await;
                }
                self.dreams = dreams;
            }
            Err(e) => {
                tracing::warn!(error = %e, "dream refresh failed");
                self.set_status(e.to_string());
            }
        }
    }

    async fn save_dream(&mut self) {
        if self.title_input.trim().is_empty() || self.content_input.trim().is_empty() {
            self.set_status("Title and dream text are required.");
            return;
        }
        let Some(token) = self.token() else {
            self.set_status("You are not logged in.");
            return;
        };

        match self
            .guide
            .backend()
            .add_dream(&self.title_input, &self.content_input, &token)
            .await
        {
            Ok(()) => {
                self.title_input.clear();
                self.content_input.clear();
                self.composing = false;
                self.set_status("Dream saved.");
                self.refresh_dreams().await;
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    /// Dictate into the dream content field
    ///
    /// Runs a capture session against the installed speech engine; without
    /// one, reports unavailability and leaves the field untouched.
    async fn capture_speech(&mut self) {
        let Some(recognizer) = &self.recognizer else {
            self.set_status("Speech recognition not supported here.");
            return;
        };

        let mut capture = TranscriptCapture::with_text(std::mem::take(&mut self.content_input));
        let locale = self.guide.config().speech_locale.clone();
        if let Err(e) = run_capture(recognizer.as_ref(), &mut capture, &locale).await {
            tracing::warn!(error = %e, "speech capture failed");
        }

        self.content_input = capture.transcript().to_string();
        if let Some(status) = capture.status() {
            let status = status.to_string();
            self.set_status(status);
        }
    }

    async fn delete_selected_dream(&mut self) {
        let Some(id) = self
            .dreams
            .get(self.selected_card)
            .and_then(|record| record.id)
        else {
            return;
        };
        let Some(token) = self.token() else {
            self.set_status("You are not logged in.");
            return;
        };

        match self.guide.backend().delete_dream(id, &token).await {
            Ok(()) => {
                self.set_status("Dream deleted.");
                self.refresh_dreams().await;
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // === Visualizer operations ===

    async fn generate_images(&mut self) {
        self.gallery.set_dream_text(self.dream_input.clone());
        let token = self.token();
        self.gallery
            .generate(self.guide.backend().as_ref(), token.as_deref())
            .await;
        self.selected_image = 0;
    }
}

/// Banner text and expiry at startup
///
/// A fresh login shows "Welcome Back {username}" for a few seconds; the
/// marker is cleared so the next launch goes straight to the app name.
fn welcome_banner(store: Option<&ProfileStore>) -> (String, Option<Instant>) {
    let Some(store) = store else {
        return ("REMinder".to_string(), None);
    };

    let fresh_login = store.just_logged_in().unwrap_or(false);
    if !fresh_login {
        return ("REMinder".to_string(), None);
    }

    if let Err(e) = store.clear_just_logged_in() {
        tracing::warn!(error = %e, "could not clear login marker");
    }

    let username = store
        .profile()
        .ok()
        .flatten()
        .map(|p| p.username)
        .unwrap_or_default();
    (
        format!("Welcome Back {username}"),
        Some(Instant::now() + Duration::from_secs(WELCOME_BANNER_SECS)),
    )
}

/// Take the chat input buffer for sending
///
/// Blank input is not a send. A turn in flight rejects the send WITHOUT
/// consuming the buffer, so text typed during the guide's thinking delay
/// survives in the input field.
fn take_chat_input(input: &mut String, turn_in_flight: bool) -> Option<String> {
    if turn_in_flight || input.trim().is_empty() {
        return None;
    }
    Some(std::mem::take(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use guide_core::ChatSession;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chat_input_survives_inflight_turn() {
        let session = ChatSession::shared();
        assert!(session.lock().begin_turn());

        let mut input = "still typing".to_string();
        let taken = take_chat_input(&mut input, session.lock().is_awaiting());
        assert_eq!(taken, None);
        assert_eq!(input, "still typing");

        session.lock().finish_turn();
        let taken = take_chat_input(&mut input, session.lock().is_awaiting());
        assert_eq!(taken.as_deref(), Some("still typing"));
        assert_eq!(input, "");
    }

    #[test]
    fn test_blank_chat_input_is_not_taken() {
        let mut input = "   ".to_string();
        assert_eq!(take_chat_input(&mut input, false), None);
        assert_eq!(input, "   ");
    }
}
