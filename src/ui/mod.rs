//! Presentation: view models, plain-text rendering and the ratatui frontend.

pub mod components;
pub mod render;
pub mod shortcuts;
pub mod tui;
