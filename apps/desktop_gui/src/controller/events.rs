//! Events sent from the backend worker to the UI thread.

use client_core::state::AppEvent;

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    /// The worker could not start; no command will ever be answered.
    StartupFailed(String),
    App(AppEvent),
}
