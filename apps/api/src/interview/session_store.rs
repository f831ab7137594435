use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::applications::models::InterviewOutcome;
use crate::errors::AppError;
use crate::interview::session::InterviewSession;

type SharedSession = Arc<Mutex<InterviewSession>>;

struct Slot {
    application_id: i32,
    session: SharedSession,
}

/// A session that has left `Active` but whose outcome is not yet persisted.
#[derive(Debug, Clone)]
pub struct ClosingSession {
    pub application_id: i32,
    pub tab_switch_count: u32,
    pub outcome: InterviewOutcome,
}

/// Live interview sessions keyed by session id.
///
/// Lock order is always session, then map. Neither lock is held across an `.await`.
/// Code holding the map lock may only `try_lock` a session.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Slot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new active session. An active session for the same application
    /// is dropped. A closing or busy one blocks the start with `Conflict`.
    pub fn create(
        &self,
        application_id: i32,
        job_requirements: String,
        now: DateTime<Utc>,
    ) -> Result<Uuid, AppError> {
        let session = InterviewSession::new(application_id, job_requirements, now);
        let id = session.id;

        let mut sessions = self.sessions.write();
        let mut replaced = Vec::new();
        for (existing_id, slot) in sessions.iter() {
            if slot.application_id != application_id {
                continue;
            }
            match slot.session.try_lock() {
                Some(existing) if existing.is_active() => replaced.push(*existing_id),
                Some(_) => {
                    return Err(AppError::Conflict(format!(
                        "Interview for application {application_id} is still closing"
                    )))
                }
                None => {
                    return Err(AppError::Conflict(format!(
                        "Interview for application {application_id} is handling another request"
                    )))
                }
            }
        }
        for existing_id in replaced {
            debug!("Replacing session {existing_id} for application {application_id}");
            sessions.remove(&existing_id);
        }
        sessions.insert(
            id,
            Slot {
                application_id,
                session: Arc::new(Mutex::new(session)),
            },
        );
        Ok(id)
    }

    /// Runs `f` inside the session's critical section if it is still active.
    /// A session closed by `f` stays in the store until `release`.
    pub fn with_active<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut InterviewSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let shared = self.get(id).ok_or(AppError::NoActiveSession)?;

        let mut session = shared.lock();
        if !session.is_active() || !self.is_current(id, &shared) {
            return Err(AppError::NoActiveSession);
        }
        f(&mut session)
    }

    /// The pending outcome of session `id`, if it has closed but not been released.
    pub fn closing(&self, id: Uuid) -> Option<ClosingSession> {
        let shared = self.get(id)?;
        let session = shared.lock();
        if session.is_active() {
            return None;
        }
        session.outcome.clone().map(|outcome| ClosingSession {
            application_id: session.application_id,
            tab_switch_count: session.tab_switch_count,
            outcome,
        })
    }

    /// Every closing session, optionally only those of one application.
    pub fn closing_sessions(&self, application_id: Option<i32>) -> Vec<(Uuid, ClosingSession)> {
        let ids: Vec<Uuid> = self
            .sessions
            .read()
            .iter()
            .filter(|(_, slot)| application_id.map_or(true, |a| slot.application_id == a))
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.closing(id).map(|closing| (id, closing)))
            .collect()
    }

    /// Drops a session once its outcome is persisted.
    pub fn release(&self, id: Uuid) {
        if self.sessions.write().remove(&id).is_some() {
            debug!("Session {id} released");
        }
    }

    /// Drops active sessions started more than `max_age` before `now`.
    /// Closing and busy sessions are kept.
    pub fn evict_stale(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, slot| match slot.session.try_lock() {
            Some(session) if session.is_active() && now - session.started_at >= max_age => {
                debug!("Evicting abandoned session {id}");
                false
            }
            _ => true,
        });
        before - sessions.len()
    }

    #[cfg(test)]
    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.read().contains_key(&id)
    }

    /// Sessions still accepting events. A session busy in its critical
    /// section counts as active.
    pub fn active_count(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|slot| slot.session.try_lock().map_or(true, |s| s.is_active()))
            .count()
    }

    fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions
            .read()
            .get(&id)
            .map(|slot| Arc::clone(&slot.session))
    }

    fn is_current(&self, id: Uuid, shared: &SharedSession) -> bool {
        self.sessions
            .read()
            .get(&id)
            .is_some_and(|slot| Arc::ptr_eq(&slot.session, shared))
    }
}
