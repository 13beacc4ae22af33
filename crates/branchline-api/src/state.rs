//! Shared application state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use branchline_core::clock::Clock;
use branchline_core::config::FlowConfig;
use branchline_flow::DialogueHandle;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::view::SessionView;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Stamps session creation.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Timing and layout used for every new session.
    pub flow_config: FlowConfig,
    /// Live dialogue sessions.
    pub sessions: Arc<SessionRegistry>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("flow_config", &self.flow_config)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state with the default session policy.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, flow_config: FlowConfig) -> Self {
        Self::with_session_policy(clock, flow_config, SessionPolicy::default())
    }

    /// Create new application state that evicts sessions per `policy`.
    #[must_use]
    pub fn with_session_policy(
        clock: Arc<dyn Clock + Send + Sync>,
        flow_config: FlowConfig,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            clock,
            flow_config,
            sessions: Arc::new(SessionRegistry::new(policy)),
        }
    }
}

/// How long sessions stay registered without client activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Retention of a finished dialogue after the last request touching it.
    pub finished_retention: Duration,
    /// Lifetime of an unfinished dialogue nobody sends requests to.
    pub idle_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            finished_retention: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(1800),
        }
    }
}

impl SessionPolicy {
    /// Pause between background sweeps.
    #[must_use]
    pub fn sweep_period(&self) -> Duration {
        (self.finished_retention.min(self.idle_timeout) / 2).max(Duration::from_secs(1))
    }
}

/// A hosted dialogue: its input handle and what its screen shows.
#[derive(Debug)]
pub struct Session {
    /// Input side of the running controller.
    pub handle: DialogueHandle,
    /// Presentation state fed by the controller.
    pub view: Arc<SessionView>,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
    last_activity: Instant,
}

impl Session {
    /// Wraps a freshly spawned dialogue.
    #[must_use]
    pub fn new(handle: DialogueHandle, view: Arc<SessionView>, started_at: DateTime<Utc>) -> Self {
        Self {
            handle,
            view,
            started_at,
            last_activity: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant, policy: SessionPolicy) -> bool {
        let idle = now.saturating_duration_since(self.last_activity);
        if self.handle.is_finished() {
            idle >= policy.finished_retention
        } else {
            idle >= policy.idle_timeout
        }
    }
}

/// Sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    policy: SessionPolicy,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    /// Creates an empty registry evicting sessions per `policy`.
    #[must_use]
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            sessions: Mutex::default(),
        }
    }

    /// Registers a session, first evicting expired ones.
    pub fn insert(&self, session_id: Uuid, session: Session) {
        self.sweep();
        self.lock().insert(session_id, session);
    }

    /// Drops every expired session and returns how many were dropped.
    ///
    /// Dropping an unfinished session closes its input, so its controller
    /// abandons the dialogue at the next wait.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let policy = self.policy;
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|session_id, session| {
            let expired = session.is_expired(now, policy);
            if expired {
                debug!(%session_id, finished = session.handle.is_finished(), "evicting dialogue session");
            }
            !expired
        });
        before - sessions.len()
    }

    /// Runs `f` against the session with `session_id` and marks it active.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionNotFound` if no such session exists, or
    /// whatever `f` returns.
    pub fn with_session<T>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&Session) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(ApiError::SessionNotFound(session_id))?;
        session.last_activity = Instant::now();
        f(session)
    }

    /// Removes a session, stopping its controller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionNotFound` if no such session exists.
    pub fn remove(&self, session_id: Uuid) -> Result<(), ApiError> {
        let session = self
            .lock()
            .remove(&session_id)
            .ok_or(ApiError::SessionNotFound(session_id))?;
        session.handle.abort();
        Ok(())
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spawns a task that sweeps `sessions` on the policy's sweep period.
pub fn start_session_reaper(sessions: Arc<SessionRegistry>) -> JoinHandle<()> {
    let period = sessions.policy.sweep_period();
    info!(period_secs = period.as_secs(), "session reaper started");
    tokio::spawn(async move {
        loop {
            sleep(period).await;
            let evicted = sessions.sweep();
            if evicted > 0 {
                info!(evicted, remaining = sessions.len(), "expired dialogue sessions evicted");
            }
        }
    })
}
