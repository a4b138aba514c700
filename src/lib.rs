//! deskhub: notification delivery and read-state reconciliation.
//!
//! The server half (`api`, `store`, `auth`) persists notifications per user
//! and flips their read state. The client half (`client`) fetches through a
//! query cache and invalidates it only after a confirmed write.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod store;

use store::NotificationStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub store: Arc<dyn NotificationStore>,
    pub config: config::Config,
}

impl AppState {
    pub fn new(store: Arc<dyn NotificationStore>, config: config::Config) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}
