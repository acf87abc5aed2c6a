//! Speech Capture Adapter
//!
//! Wraps an external continuous speech-recognition engine and turns its
//! result events into appended dream-text lines. The engine itself lives
//! behind the [`SpeechRecognizer`] trait; this module owns the capture
//! state machine, the transcript accumulation rules, and the
//! auto-restart-on-session-end behavior recognizers impose.
//!
//! # State machine
//!
//! `Idle -> Listening -> (Restarting | Idle)`. Transitions requested
//! outside their declared states are rejected. Restarting bridges the gap
//! between a provider-imposed session end and the next `start()`, so intent
//! to keep recording survives the engine's own lifecycle.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// One recognition result from the engine
#[derive(Clone, Debug)]
pub struct RecognizerResult {
    /// Alternative transcripts, best first
    pub alternatives: Vec<String>,
    /// Whether this result is finalized (interim results are dropped)
    pub is_final: bool,
}

/// Events from a speech recognizer session
#[derive(Clone, Debug)]
pub enum RecognizerEvent {
    /// A batch of results, newly updated, in index order
    Results(Vec<RecognizerResult>),
    /// Recognition failed; the session is dead
    Error(String),
    /// The engine ended the session (provider session limit, silence)
    End,
}

/// Speech recognition engine trait
///
/// Implementations run continuous recognition with interim results and
/// deliver [`RecognizerEvent`]s on the returned channel until the session
/// ends.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Engine name for logging
    fn name(&self) -> &str;

    /// Start a recognition session in the given locale (e.g. "en-US")
    ///
    /// Errors when the engine is unavailable on this system; the caller
    /// reports unavailability and performs no capture.
    async fn start(&self, locale: &str) -> anyhow::Result<mpsc::Receiver<RecognizerEvent>>;

    /// Request the current session to stop
    async fn stop(&self);
}

/// Capture state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    /// Not recording
    Idle,
    /// Recording; results are being accumulated
    Listening,
    /// Engine session ended but recording intent persists; awaiting restart
    Restarting,
}

/// What the capture driver should do after an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureAction {
    /// Nothing; keep listening
    Continue,
    /// Start a new recognizer session, then call [`TranscriptCapture::resumed`]
    Restart,
    /// Capture is over; stop driving events
    Finished,
}

/// Accumulates finalized speech into dream text
#[derive(Clone, Debug)]
pub struct TranscriptCapture {
    /// State machine
    state: CaptureState,
    /// Accumulated dream text, one line per finalized batch
    transcript: String,
    /// Short-lived status message for the surface
    status: Option<String>,
    /// Whether an engine session end should trigger a restart
    auto_restart: bool,
}

impl TranscriptCapture {
    /// Create an idle capture with empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            transcript: String::new(),
            status: None,
            auto_restart: false,
        }
    }

    /// Create a capture seeded with existing text (typed before speaking)
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            transcript: text.into(),
            ..Self::new()
        }
    }

    /// Begin recording: `Idle -> Listening`
    ///
    /// Returns false without effect when not idle.
    pub fn begin(&mut self) -> bool {
        if self.state != CaptureState::Idle {
            tracing::debug!(state = ?self.state, "begin rejected");
            return false;
        }
        self.state = CaptureState::Listening;
        self.auto_restart = true;
        self.status = Some("Listening... speak your dream".to_string());
        true
    }

    /// Stop recording at the user's request
    ///
    /// Clears the restart intent so a late `End` event from the engine is
    /// treated as final.
    pub fn request_stop(&mut self) {
        if self.state == CaptureState::Idle {
            return;
        }
        self.auto_restart = false;
        self.state = CaptureState::Idle;
        self.status = Some("Stopped listening.".to_string());
    }

    /// Report that the engine is unavailable on this system
    pub fn report_unavailable(&mut self, engine: &str) {
        tracing::warn!(engine, "speech recognition not available");
        self.status = Some("Speech recognition not supported here.".to_string());
    }

    /// Feed one recognizer event through the state machine
    pub fn handle_event(&mut self, event: RecognizerEvent) -> CaptureAction {
        match event {
            RecognizerEvent::Results(results) => {
                if self.state == CaptureState::Listening {
                    self.append_finals(&results);
                }
                CaptureAction::Continue
            }
            RecognizerEvent::Error(error) => {
                tracing::warn!(%error, "speech recognition error");
                self.status = Some("Mic error - try again.".to_string());
                self.auto_restart = false;
                self.state = CaptureState::Idle;
                CaptureAction::Finished
            }
            RecognizerEvent::End => {
                if self.state == CaptureState::Listening && self.auto_restart {
                    // Provider session limit hit mid-recording; bridge it
                    self.state = CaptureState::Restarting;
                    CaptureAction::Restart
                } else {
                    self.state = CaptureState::Idle;
                    self.status = Some("Stopped listening.".to_string());
                    CaptureAction::Finished
                }
            }
        }
    }

    /// Resume listening after a restart: `Restarting -> Listening`
    ///
    /// Returns false without effect when not restarting.
    pub fn resumed(&mut self) -> bool {
        if self.state != CaptureState::Restarting {
            tracing::debug!(state = ?self.state, "resumed rejected");
            return false;
        }
        self.state = CaptureState::Listening;
        true
    }

    /// Concatenate newly finalized results into one appended line
    ///
    /// First alternative only, in index order, joined with spaces and
    /// trimmed; interim results are ignored. Prior content keeps a newline
    /// separator.
    fn append_finals(&mut self, results: &[RecognizerResult]) {
        let mut line = String::new();
        for result in results {
            if !result.is_final {
                continue;
            }
            if let Some(best) = result.alternatives.first() {
                let best = best.trim();
                if !best.is_empty() {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(best);
                }
            }
        }

        if line.is_empty() {
            return;
        }

        if !self.transcript.is_empty() {
            self.transcript.push('\n');
        }
        self.transcript.push_str(&line);
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Whether recording is in progress (including a restart bridge)
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.state != CaptureState::Idle
    }

    /// Accumulated dream text
    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Current status message, if any
    ///
    /// Surfaces expire this after their configured status lifetime.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Clear the status message
    pub fn clear_status(&mut self) {
        self.status = None;
    }
}

impl Default for TranscriptCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive a full capture: start the engine, feed events, handle restarts
///
/// Runs until the capture finishes (user stop, engine error, or final
/// session end). Returns the accumulated transcript state through the
/// mutated capture.
pub async fn run_capture<R: SpeechRecognizer + ?Sized>(
    recognizer: &R,
    capture: &mut TranscriptCapture,
    locale: &str,
) -> anyhow::Result<()> {
    if !capture.begin() {
        return Ok(());
    }

    let mut rx = match recognizer.start(locale).await {
        Ok(rx) => rx,
        Err(e) => {
            capture.report_unavailable(recognizer.name());
            capture.request_stop();
            return Err(e);
        }
    };

    loop {
        let Some(event) = rx.recv().await else {
            // Channel closed without an End event; treat as session end
            match capture.handle_event(RecognizerEvent::End) {
                CaptureAction::Restart => {
                    rx = recognizer.start(locale).await?;
                    capture.resumed();
                    continue;
                }
                _ => return Ok(()),
            }
        };

        match capture.handle_event(event) {
            CaptureAction::Continue => {}
            CaptureAction::Restart => {
                rx = recognizer.start(locale).await?;
                capture.resumed();
            }
            CaptureAction::Finished => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn final_result(text: &str) -> RecognizerResult {
        RecognizerResult {
            alternatives: vec![text.to_string()],
            is_final: true,
        }
    }

    fn interim_result(text: &str) -> RecognizerResult {
        RecognizerResult {
            alternatives: vec![text.to_string()],
            is_final: false,
        }
    }

    #[test]
    fn test_begin_only_from_idle() {
        let mut capture = TranscriptCapture::new();
        assert!(capture.begin());
        assert_eq!(capture.state(), CaptureState::Listening);
        assert!(!capture.begin());
    }

    #[test]
    fn test_finals_append_as_lines() {
        let mut capture = TranscriptCapture::new();
        capture.begin();

        capture.handle_event(RecognizerEvent::Results(vec![
            final_result(" I was flying "),
            interim_result("over the"),
            final_result("over the sea"),
        ]));
        assert_eq!(capture.transcript(), "I was flying over the sea");

        capture.handle_event(RecognizerEvent::Results(vec![final_result(
            "then I woke up",
        )]));
        assert_eq!(
            capture.transcript(),
            "I was flying over the sea\nthen I woke up"
        );
    }

    #[test]
    fn test_interim_only_batch_appends_nothing() {
        let mut capture = TranscriptCapture::new();
        capture.begin();
        capture.handle_event(RecognizerEvent::Results(vec![interim_result("partial")]));
        assert_eq!(capture.transcript(), "");
    }

    #[test]
    fn test_prior_text_keeps_newline_separator() {
        let mut capture = TranscriptCapture::with_text("typed intro");
        capture.begin();
        capture.handle_event(RecognizerEvent::Results(vec![final_result("spoken part")]));
        assert_eq!(capture.transcript(), "typed intro\nspoken part");
    }

    #[test]
    fn test_end_while_recording_restarts() {
        let mut capture = TranscriptCapture::new();
        capture.begin();

        let action = capture.handle_event(RecognizerEvent::End);
        assert_eq!(action, CaptureAction::Restart);
        assert_eq!(capture.state(), CaptureState::Restarting);

        assert!(capture.resumed());
        assert_eq!(capture.state(), CaptureState::Listening);
    }

    #[test]
    fn test_end_after_stop_request_finishes() {
        let mut capture = TranscriptCapture::new();
        capture.begin();
        capture.request_stop();
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(capture.status(), Some("Stopped listening."));

        let action = capture.handle_event(RecognizerEvent::End);
        assert_eq!(action, CaptureAction::Finished);
    }

    #[test]
    fn test_error_halts_and_disables_restart() {
        let mut capture = TranscriptCapture::new();
        capture.begin();

        let action = capture.handle_event(RecognizerEvent::Error("no-speech".to_string()));
        assert_eq!(action, CaptureAction::Finished);
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(capture.status(), Some("Mic error - try again."));

        // A stray End afterwards must not restart
        let action = capture.handle_event(RecognizerEvent::End);
        assert_eq!(action, CaptureAction::Finished);
    }

    #[test]
    fn test_resumed_only_from_restarting() {
        let mut capture = TranscriptCapture::new();
        assert!(!capture.resumed());
        capture.begin();
        assert!(!capture.resumed());
    }

    /// Scripted recognizer: each start() yields the next session's events
    struct ScriptedRecognizer {
        sessions: std::sync::Mutex<Vec<Vec<RecognizerEvent>>>,
        locales: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedRecognizer {
        fn new(mut sessions: Vec<Vec<RecognizerEvent>>) -> Self {
            sessions.reverse();
            Self {
                sessions: std::sync::Mutex::new(sessions),
                locales: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn start(&self, locale: &str) -> anyhow::Result<mpsc::Receiver<RecognizerEvent>> {
            self.locales.lock().unwrap().push(locale.to_string());
            let events = self
                .sessions
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| anyhow::anyhow!("no more sessions"))?;
            let (tx, rx) = mpsc::channel(16);
            tokio::spawn(async move {
                for event in events {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }

        async fn stop(&self) {}
    }

    #[tokio::test]
    async fn test_run_capture_bridges_session_end() {
        // First engine session ends mid-recording; second carries on, then
        // errors out to terminate the capture.
        let recognizer = ScriptedRecognizer::new(vec![
            vec![
                RecognizerEvent::Results(vec![final_result("first line")]),
                RecognizerEvent::End,
            ],
            vec![
                RecognizerEvent::Results(vec![final_result("second line")]),
                RecognizerEvent::Error("mic lost".to_string()),
            ],
        ]);

        let mut capture = TranscriptCapture::new();
        run_capture(&recognizer, &mut capture, "es-MX").await.unwrap();

        assert_eq!(capture.transcript(), "first line\nsecond line");
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(capture.status(), Some("Mic error - try again."));

        // Both the initial session and the restart used the configured locale
        assert_eq!(
            *recognizer.locales.lock().unwrap(),
            vec!["es-MX".to_string(), "es-MX".to_string()]
        );
    }

    #[tokio::test]
    async fn test_run_capture_unavailable_engine() {
        let recognizer = ScriptedRecognizer::new(vec![]);
        let mut capture = TranscriptCapture::new();

        let result = run_capture(&recognizer, &mut capture, "en-US").await;
        assert!(result.is_err());
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(capture.transcript(), "");
    }
}
