//! UI layer for the card window.

pub mod app;

pub use app::CardStudioApp;
