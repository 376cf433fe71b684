//! Application state for the TARA server

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::TaraConfig;
use crate::error::{Error, Result};
use crate::providers::{ElevenLabsSpeech, SpeechProvider};
use crate::session::{Session, SessionServices};

/// A session guarded for one request at a time
pub type SharedSession = Arc<Mutex<Session>>;

/// A live session and when a request last touched it
struct SessionEntry {
    session: SharedSession,
    last_seen: parking_lot::Mutex<Instant>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: TaraConfig,
    /// Backends shared by every session
    services: Arc<SessionServices>,
    /// Text-to-speech, when a key is configured
    speech: Option<Arc<dyn SpeechProvider>>,
    /// Live sessions
    sessions: DashMap<Uuid, SessionEntry>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state with the production backends
    pub fn new(config: TaraConfig) -> Result<Self> {
        tracing::info!("Initializing TARA application state...");

        let services = Arc::new(SessionServices::from_config(&config)?);

        let speech = ElevenLabsSpeech::from_config(&config.speech)?
            .map(|s| Arc::new(s) as Arc<dyn SpeechProvider>);
        match &speech {
            Some(s) => tracing::info!("Text-to-speech enabled ({})", s.name()),
            None => tracing::info!(
                "Text-to-speech disabled ({} not set)",
                config.speech.api_key_env
            ),
        }

        Ok(Self::with_services(config, services, speech))
    }

    /// Create application state over explicit services
    pub fn with_services(
        config: TaraConfig,
        services: Arc<SessionServices>,
        speech: Option<Arc<dyn SpeechProvider>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                speech,
                sessions: DashMap::new(),
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &TaraConfig {
        &self.inner.config
    }

    pub fn services(&self) -> &Arc<SessionServices> {
        &self.inner.services
    }

    /// Get the speech provider, if configured
    pub fn speech(&self) -> Option<&Arc<dyn SpeechProvider>> {
        self.inner.speech.as_ref()
    }

    /// Start a new, empty session
    pub fn create_session(&self) -> SharedSession {
        let session = Session::new(Arc::clone(&self.inner.services));
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.inner.sessions.insert(
            id,
            SessionEntry {
                session: Arc::clone(&shared),
                last_seen: parking_lot::Mutex::new(Instant::now()),
            },
        );
        tracing::info!("Created session {}", id);
        shared
    }

    /// Look up a session and mark it as active
    pub fn session(&self, id: &Uuid) -> Result<SharedSession> {
        let entry = self
            .inner
            .sessions
            .get(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        *entry.last_seen.lock() = Instant::now();
        Ok(Arc::clone(&entry.session))
    }

    /// Drop a session with its index, memory and datasets
    pub fn remove_session(&self, id: &Uuid) -> Result<()> {
        self.inner
            .sessions
            .remove(id)
            .map(|_| tracing::info!("Removed session {}", id))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Drop sessions not touched within `max_idle` of `now`; returns how many
    pub fn evict_idle(&self, max_idle: Duration, now: Instant) -> usize {
        let before = self.inner.sessions.len();
        self.inner
            .sessions
            .retain(|_, entry| now.saturating_duration_since(*entry.last_seen.lock()) <= max_idle);
        let evicted = before.saturating_sub(self.inner.sessions.len());
        if evicted > 0 {
            tracing::info!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
