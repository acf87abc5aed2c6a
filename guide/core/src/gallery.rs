//! Image Gallery Controller
//!
//! Submits dream text to the image-generation endpoint and manages the
//! resulting gallery: an ordered, client-mutable sequence of image URLs.
//! Deletion is local-only - the backend keeps no gallery state to
//! reconcile.

use crate::backend::{BackendError, JournalBackend};

/// Gallery state machine: `Idle <-> Generating`
///
/// A generate triggered while one is in flight is dropped, not queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalleryState {
    /// Ready to generate
    Idle,
    /// A generation request is in flight
    Generating,
}

/// Client-side gallery for generated dream images
#[derive(Debug)]
pub struct Gallery {
    /// Dream description input
    dream_text: String,
    /// Generated image URLs, in backend order
    images: Vec<String>,
    /// Last error, shown inline
    error: Option<String>,
    /// State machine
    state: GalleryState,
}

impl Gallery {
    /// Create an empty gallery
    #[must_use]
    pub fn new() -> Self {
        Self {
            dream_text: String::new(),
            images: Vec::new(),
            error: None,
            state: GalleryState::Idle,
        }
    }

    /// Replace the dream description input
    pub fn set_dream_text(&mut self, text: impl Into<String>) {
        self.dream_text = text.into();
    }

    /// The dream description input
    #[must_use]
    pub fn dream_text(&self) -> &str {
        &self.dream_text
    }

    /// Current image URLs
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Last error message, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> GalleryState {
        self.state
    }

    /// Generate images from the current dream text
    ///
    /// Requires non-blank text and a stored auth token; neither produces a
    /// network call when absent. On success the gallery is replaced with
    /// the returned URLs. Returns whether a backend call was made.
    pub async fn generate<B: JournalBackend>(
        &mut self,
        backend: &B,
        token: Option<&str>,
    ) -> bool {
        if self.dream_text.trim().is_empty() {
            return false;
        }
        if self.state == GalleryState::Generating {
            tracing::debug!("generate dropped: one already in flight");
            return false;
        }

        self.state = GalleryState::Generating;
        self.images.clear();
        self.error = None;

        let Some(token) = token else {
            self.error = Some(BackendError::MissingAuth.to_string());
            self.state = GalleryState::Idle;
            return false;
        };

        match backend.visualize_dream(&self.dream_text, token).await {
            Ok(images) => {
                tracing::info!(count = images.len(), "dream visualized");
                self.images = images;
            }
            Err(e) => {
                tracing::warn!(error = %e, "image generation failed");
                self.error = Some(e.to_string());
            }
        }

        self.state = GalleryState::Idle;
        true
    }

    /// Remove one image from the local sequence
    ///
    /// No network effect and no undo; the backend is never informed.
    /// Out-of-range indices are ignored.
    pub fn delete_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
        }
    }

    /// Reset input text, gallery, and error state together
    pub fn clear(&mut self) {
        self.dream_text.clear();
        self.images.clear();
        self.error = None;
    }
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new()
    }
}
