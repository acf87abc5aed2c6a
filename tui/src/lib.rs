//! REMinder TUI - Terminal interface for the dream journal
//!
//! This crate provides a full-screen terminal UI over `guide-core`:
//!
//! - **Journal tab**: analyzed dream cards with expandable analysis detail
//! - **Visualizer tab**: dream text to generated image gallery
//! - **Chat overlay**: the DreamAnalyzer guide, toggled from any tab
//!
//! All business logic lives in `guide-core`; this crate only translates
//! terminal events into core operations and renders what the core reports.

pub mod app;
pub mod ui;

pub use app::App;
