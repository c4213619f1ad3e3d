//! Application state management

use crate::auth::SessionService;
use almanac_core::config::AppConfig;
use almanac_core::{CalendarStore, CredentialStore, SessionStore};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
    /// Session subsystem
    pub sessions: SessionService,
    /// Event and participation storage
    pub calendar: Arc<dyn CalendarStore>,
}

impl AppState {
    /// Create new application state over the given store backends
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        session_store: Arc<dyn SessionStore>,
        calendar: Arc<dyn CalendarStore>,
    ) -> Self {
        let sessions = SessionService::new(credentials, session_store, config.auth.clone());

        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(true),
            sessions,
            calendar,
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}
