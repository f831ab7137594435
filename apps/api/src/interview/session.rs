//! Interview session state and the tab-switch proctoring state machine.
//!
//! `Active(count, last)` moves to `Active(count + 1, now)` on every accepted
//! event and to `Terminated` once the count reaches the policy limit. Events
//! inside the debounce window of the last accepted one are ignored outright.
//!
//! A session that leaves `Active` carries the `InterviewOutcome` that still has
//! to reach the application store; it is released only once that write lands.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::applications::models::{ApplicationStatus, InterviewOutcome};
use crate::config::Config;
use crate::errors::AppError;

pub const DEFAULT_TAB_SWITCH_LIMIT: u32 = 3;
pub const DEFAULT_DEBOUNCE_MS: i64 = 1000;
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 2 * 60 * 60;
pub const TERMINATION_REASON: &str = "Excessive tab switching";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Active,
    Terminated,
    Completed,
}

#[derive(Debug, Clone, Copy)]
pub struct ProctorPolicy {
    pub max_tab_switches: u32,
    pub debounce: Duration,
}

impl Default for ProctorPolicy {
    fn default() -> Self {
        Self {
            max_tab_switches: DEFAULT_TAB_SWITCH_LIMIT,
            debounce: Duration::milliseconds(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl ProctorPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tab_switches: config.tab_switch_limit.max(1),
            debounce: Duration::milliseconds(config.tab_switch_debounce_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabSwitchOutcome {
    /// Arrived inside the debounce window; nothing changed.
    Ignored { count: u32 },
    Recorded { count: u32 },
    /// The limit was reached. The session is no longer active.
    Terminated {
        count: u32,
        outcome: InterviewOutcome,
    },
}

#[derive(Debug, Clone)]
pub struct InterviewSession {
    pub id: Uuid,
    pub application_id: i32,
    pub job_requirements: String,
    pub tab_switch_count: u32,
    pub last_tab_switch_at: Option<DateTime<Utc>>,
    pub proctoring_flags: Vec<String>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    /// Set when the session leaves `Active`; not yet persisted while present.
    pub outcome: Option<InterviewOutcome>,
}

impl InterviewSession {
    pub fn new(application_id: i32, job_requirements: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            application_id,
            job_requirements,
            tab_switch_count: 0,
            last_tab_switch_at: None,
            proctoring_flags: Vec::new(),
            status: SessionStatus::Active,
            started_at: now,
            outcome: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Ends the session with `outcome`. Terminal application statuses other
    /// than `Terminated` close it as `Completed`.
    pub fn close(&mut self, outcome: InterviewOutcome) {
        self.status = match outcome.status {
            ApplicationStatus::Terminated => SessionStatus::Terminated,
            _ => SessionStatus::Completed,
        };
        self.outcome = Some(outcome);
    }

    pub fn record_tab_switch(
        &mut self,
        now: DateTime<Utc>,
        policy: &ProctorPolicy,
    ) -> Result<TabSwitchOutcome, AppError> {
        if !self.is_active() {
            return Err(AppError::NoActiveSession);
        }

        if let Some(last) = self.last_tab_switch_at {
            if now - last < policy.debounce {
                return Ok(TabSwitchOutcome::Ignored {
                    count: self.tab_switch_count,
                });
            }
        }

        self.last_tab_switch_at = Some(now);
        self.tab_switch_count += 1;
        self.proctoring_flags.push(format!(
            "Tab switch at {}",
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));

        if self.tab_switch_count >= policy.max_tab_switches {
            let outcome = InterviewOutcome {
                status: ApplicationStatus::Terminated,
                results: json!({
                    "termination_reason": TERMINATION_REASON,
                    "proctoring_flags": self.proctoring_flags,
                }),
                report_path: None,
            };
            self.close(outcome.clone());
            return Ok(TabSwitchOutcome::Terminated {
                count: self.tab_switch_count,
                outcome,
            });
        }

        Ok(TabSwitchOutcome::Recorded {
            count: self.tab_switch_count,
        })
    }
}
