//! Client application state store.
//!
//! A single [`ClientStore`] is created by the application root and handed
//! to every consumer. Mutation goes through the setters only; each setter
//! applies its change in one `send_modify`, so every subscriber observes a
//! complete snapshot and never a half-applied update.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::AppConfig;
use crate::notification::{push_capped, Notification, NotificationKind};
use crate::settings::{BackendMode, Theme};
use crate::view::View;

/// Used whenever the configured API base URL is empty.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientState {
    pub theme: Theme,
    pub backend_mode: BackendMode,
    /// Stored verbatim, including empty; see [`ClientState::effective_api_base_url`].
    pub api_base_url: String,
    pub selected_view: String,
    pub is_live: bool,
    pub command_palette_open: bool,
    /// Newest first, at most [`crate::NOTIFICATION_CAP`] entries.
    pub notifications: Vec<Notification>,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            backend_mode: BackendMode::default(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            selected_view: View::Dashboard.key().into(),
            is_live: true,
            command_palette_open: false,
            notifications: Vec::new(),
        }
    }
}

impl ClientState {
    /// The base URL requests are resolved against. Blank means the local
    /// development endpoint.
    pub fn effective_api_base_url(&self) -> &str {
        let trimmed = self.api_base_url.trim();
        if trimmed.is_empty() {
            DEFAULT_API_BASE_URL
        } else {
            trimmed
        }
    }

    pub fn active_view(&self) -> View {
        View::resolve(&self.selected_view)
    }

    pub fn agents_enabled(&self) -> bool {
        self.backend_mode.agents_enabled()
    }
}

/// Shared handle to the process-wide client state.
#[derive(Clone)]
pub struct ClientStore {
    tx: Arc<watch::Sender<ClientState>>,
}

impl Default for ClientStore {
    fn default() -> Self {
        Self::new(ClientState::default())
    }
}

impl ClientStore {
    pub fn new(initial: ClientState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Build the initial state from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut state = ClientState {
            theme: config.ui.theme,
            backend_mode: config.backend.mode,
            api_base_url: config.api.base_url.clone(),
            selected_view: config.ui.start_view.clone(),
            is_live: config.ui.live,
            ..ClientState::default()
        };
        if state.api_base_url.trim().is_empty() {
            state.api_base_url = DEFAULT_API_BASE_URL.into();
        }
        Self::new(state)
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> ClientState {
        self.tx.borrow().clone()
    }

    /// Receiver notified after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.tx.subscribe()
    }

    /// Apply a multi-field change atomically.
    pub fn update(&self, f: impl FnOnce(&mut ClientState)) {
        self.tx.send_modify(f);
    }

    fn read<R>(&self, f: impl FnOnce(&ClientState) -> R) -> R {
        f(&self.tx.borrow())
    }

    // -- Getters ---

    pub fn theme(&self) -> Theme {
        self.read(|s| s.theme)
    }

    pub fn backend_mode(&self) -> BackendMode {
        self.read(|s| s.backend_mode)
    }

    pub fn api_base_url(&self) -> String {
        self.read(|s| s.api_base_url.clone())
    }

    pub fn selected_view(&self) -> String {
        self.read(|s| s.selected_view.clone())
    }

    pub fn is_live(&self) -> bool {
        self.read(|s| s.is_live)
    }

    pub fn command_palette_open(&self) -> bool {
        self.read(|s| s.command_palette_open)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.read(|s| s.notifications.clone())
    }

    // -- Setters ---

    pub fn set_theme(&self, theme: Theme) {
        tracing::debug!("theme -> {theme}");
        self.update(|s| s.theme = theme);
    }

    pub fn cycle_theme(&self) -> Theme {
        let mut theme = Theme::default();
        self.update(|s| {
            s.theme = s.theme.next();
            theme = s.theme;
        });
        theme
    }

    pub fn set_backend_mode(&self, mode: BackendMode) {
        tracing::debug!("backend mode -> {mode}");
        self.update(|s| s.backend_mode = mode);
    }

    pub fn set_api_base_url(&self, url: impl Into<String>) {
        let url = url.into();
        tracing::debug!("api base url -> {url:?}");
        self.update(|s| s.api_base_url = url);
    }

    pub fn set_selected_view(&self, view: impl Into<String>) {
        let view = view.into();
        tracing::debug!("selected view -> {view}");
        self.update(|s| s.selected_view = view);
    }

    pub fn set_is_live(&self, live: bool) {
        tracing::debug!("live -> {live}");
        self.update(|s| s.is_live = live);
    }

    pub fn toggle_live(&self) -> bool {
        let mut live = false;
        self.update(|s| {
            s.is_live = !s.is_live;
            live = s.is_live;
        });
        live
    }

    pub fn set_command_palette_open(&self, open: bool) {
        self.update(|s| s.command_palette_open = open);
    }

    /// Prepend a notification and return its id. The log is capped; the
    /// oldest entries are dropped silently.
    pub fn add_notification(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> String {
        let (title, message) = (title.into(), message.into());
        let mut id = String::new();
        self.update(|s| {
            id = loop {
                let candidate = uuid::Uuid::new_v4().simple().to_string();
                if !s.notifications.iter().any(|n| n.id == candidate) {
                    break candidate;
                }
            };
            push_capped(
                &mut s.notifications,
                Notification::new(id.clone(), kind, title, message),
            );
        });
        tracing::debug!("notification added: {id}");
        id
    }

    /// Remove the notification with `id`. Absent ids are ignored.
    pub fn remove_notification(&self, id: &str) {
        self.tx.send_if_modified(|s| {
            let before = s.notifications.len();
            s.notifications.retain(|n| n.id != id);
            s.notifications.len() != before
        });
    }

    pub fn clear_notifications(&self) {
        self.update(|s| s.notifications.clear());
    }
}
