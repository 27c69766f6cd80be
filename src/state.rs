use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::agent::{AgentFactory, AgentInterface};
use crate::config::Config;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub factory: AgentFactory,
    pub sessions: Arc<DashMap<String, Session>>,
    /// Serializes the limit check with the insert in `create_session`.
    session_gate: Arc<Mutex<()>>,
    /// Cancelled on shutdown; every in-flight dispatch watches a child of it.
    pub shutdown: CancellationToken,
}

/// One conversation: an agent with its own history.
#[derive(Clone)]
pub struct Session {
    pub agent: Arc<dyn AgentInterface>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, factory: AgentFactory) -> Self {
        Self {
            config,
            factory,
            sessions: Arc::new(DashMap::new()),
            session_gate: Arc::new(Mutex::new(())),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn generate_session_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    pub fn create_session(&self) -> Result<String, ApiError> {
        let limit = self.config.system_config.max_sessions;
        let _gate = self
            .session_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.sessions.len() >= limit {
            return Err(ApiError::SessionLimit(limit));
        }

        let session_id = self.generate_session_id();
        let now = Utc::now();
        self.sessions.insert(
            session_id.clone(),
            Session {
                agent: self.factory.create_agent(),
                created_at: now,
                last_active: now,
            },
        );
        info!("Created session {} ({} active)", session_id, self.sessions.len());
        Ok(session_id)
    }

    /// Look up a session's agent and mark the session active.
    pub fn touch_session(&self, session_id: &str) -> Result<Arc<dyn AgentInterface>, ApiError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))?;
        session.last_active = Utc::now();
        Ok(session.agent.clone())
    }

    /// Look up a session without refreshing its idle timer.
    pub fn get_session(&self, session_id: &str) -> Result<Session, ApiError> {
        self.sessions
            .get(session_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))
    }

    pub fn remove_session(&self, session_id: &str) -> Result<(), ApiError> {
        if self.sessions.remove(session_id).is_none() {
            return Err(ApiError::SessionNotFound(session_id.to_string()));
        }
        info!("Removed session {}", session_id);
        Ok(())
    }

    /// Drop sessions idle for longer than `max_idle` as of `now`.
    /// Returns how many were evicted.
    pub fn evict_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.signed_duration_since(session.last_active) <= max_idle);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!("Evicted {} idle session(s)", evicted);
        } else {
            debug!("No idle sessions to evict");
        }
        evicted
    }

    /// Periodically evict idle sessions until shutdown.
    pub async fn run_eviction(self) {
        let system = &self.config.system_config;
        let period = std::time::Duration::from_secs(system.eviction_interval_secs.max(1));
        let max_idle = Duration::seconds(system.session_idle_secs as i64);
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    self.evict_idle(Utc::now(), max_idle);
                }
            }
        }
        debug!("Session eviction task stopped");
    }
}
