//! Checkout UI Surface
//!
//! What the checkout is allowed to do to the screen around it.

use std::sync::Mutex;

/// UI capabilities handed to the checkout
pub trait CheckoutUi: Send + Sync {
    /// Show a success toast
    fn notify_success(&self, message: &str);

    /// Ask the owning view to reload its data
    fn refresh(&self);

    /// Route to another view
    fn navigate(&self, route: &str);

    /// Close the checkout modal
    fn close(&self);
}

/// Something the checkout did to the UI
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    Success(String),
    Refresh,
    Navigate(String),
    Close,
}

/// UI that only remembers what happened to it
#[derive(Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: UiEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl CheckoutUi for RecordingUi {
    fn notify_success(&self, message: &str) {
        self.push(UiEvent::Success(message.to_string()));
    }

    fn refresh(&self) {
        self.push(UiEvent::Refresh);
    }

    fn navigate(&self, route: &str) {
        self.push(UiEvent::Navigate(route.to_string()));
    }

    fn close(&self) {
        self.push(UiEvent::Close);
    }
}

/// Headless UI that reports through `tracing`
pub struct LogUi;

impl CheckoutUi for LogUi {
    fn notify_success(&self, message: &str) {
        tracing::info!(%message, "Checkout notification");
    }

    fn refresh(&self) {
        tracing::debug!("Checkout requested refresh");
    }

    fn navigate(&self, route: &str) {
        tracing::info!(%route, "Checkout navigated");
    }

    fn close(&self) {
        tracing::debug!("Checkout closed");
    }
}
