use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::models::LoginThrottleState;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCK_MINUTES: i64 = 5;

/// Threshold and cool-down applied by a [`LoginThrottle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lock_duration: Duration::minutes(DEFAULT_LOCK_MINUTES),
        }
    }
}

/// Observable throttle state at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThrottleStatus {
    Open {
        attempts: u32,
        #[serde(rename = "remainingAttempts")]
        remaining_attempts: u32,
    },
    Locked {
        #[serde(rename = "lockedUntil")]
        locked_until: DateTime<Utc>,
        #[serde(rename = "remainingMinutes")]
        remaining_minutes: i64,
    },
}

impl ThrottleStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, ThrottleStatus::Locked { .. })
    }
}

/// Whether a new sign-in attempt may proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Rejected {
        locked_until: DateTime<Utc>,
        remaining_minutes: i64,
    },
}

/// Tagged result of a throttled credential check
#[derive(Debug)]
pub enum AttemptOutcome<T, E> {
    /// The credential check ran and succeeded; the attempt counter was reset
    Succeeded(T),
    /// The credential check ran and failed; `status` is the state after counting it
    Failed { error: E, status: ThrottleStatus },
    /// The client is locked; the credential check was not invoked
    Rejected {
        locked_until: DateTime<Utc>,
        remaining_minutes: i64,
    },
}

/// Failed sign-in counter with a timed lock
///
/// Open until `max_attempts` consecutive failures, then Locked until
/// `locked_until`. Expiry is evaluated lazily against the `now` passed to
/// each call, so the type holds no clock and no timer of its own.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    policy: ThrottlePolicy,
    state: LoginThrottleState,
}

impl LoginThrottle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            state: LoginThrottleState::default(),
        }
    }

    /// Restore a throttle from persisted state
    pub fn from_state(policy: ThrottlePolicy, state: LoginThrottleState) -> Self {
        Self { policy, state }
    }

    pub fn state(&self) -> &LoginThrottleState {
        &self.state
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    /// Lock deadline if the lock is still in force at `now`
    pub fn locked_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.state.locked_until.filter(|until| now < *until)
    }

    /// Clear an expired lock. Returns true if the throttle just unlocked.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        match self.state.locked_until {
            Some(until) if now >= until => {
                tracing::debug!("Login lock expired at {}", until);
                self.state = LoginThrottleState::default();
                true
            }
            _ => false,
        }
    }

    /// Current status, clearing the lock first if it has expired
    pub fn status(&mut self, now: DateTime<Utc>) -> ThrottleStatus {
        self.refresh(now);
        match self.state.locked_until {
            Some(locked_until) => ThrottleStatus::Locked {
                locked_until,
                remaining_minutes: remaining_minutes(locked_until, now),
            },
            None => ThrottleStatus::Open {
                attempts: self.state.attempt_count,
                remaining_attempts: self.policy.max_attempts.saturating_sub(self.state.attempt_count),
            },
        }
    }

    /// Decide whether an attempt submitted at `now` may reach the credential check
    pub fn check(&mut self, now: DateTime<Utc>) -> ThrottleDecision {
        match self.status(now) {
            ThrottleStatus::Locked {
                locked_until,
                remaining_minutes,
            } => ThrottleDecision::Rejected {
                locked_until,
                remaining_minutes,
            },
            ThrottleStatus::Open { .. } => ThrottleDecision::Allowed,
        }
    }

    /// Count a failed credential check, locking once the threshold is reached
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> ThrottleStatus {
        self.refresh(now);
        if self.state.locked_until.is_some() {
            return self.status(now);
        }

        self.state.attempt_count = self.state.attempt_count.saturating_add(1);
        if self.state.attempt_count >= self.policy.max_attempts {
            let until = now + self.policy.lock_duration;
            self.state.locked_until = Some(until);
            tracing::warn!(
                "Locking sign-in after {} failed attempts until {}",
                self.state.attempt_count,
                until
            );
        }

        self.status(now)
    }

    /// Count a successful credential check. Only the counter is cleared.
    pub fn record_success(&mut self) {
        self.state.attempt_count = 0;
    }

    /// Force the throttle open with no recorded failures
    pub fn reset(&mut self) {
        self.state = LoginThrottleState::default();
    }

    /// Run `credential_check` unless the throttle is locked, and record its outcome
    pub async fn attempt<F, Fut, T, E>(
        &mut self,
        now: DateTime<Utc>,
        credential_check: F,
    ) -> AttemptOutcome<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let ThrottleDecision::Rejected {
            locked_until,
            remaining_minutes,
        } = self.check(now)
        {
            return AttemptOutcome::Rejected {
                locked_until,
                remaining_minutes,
            };
        }

        match credential_check().await {
            Ok(value) => {
                self.record_success();
                AttemptOutcome::Succeeded(value)
            }
            Err(error) => {
                let status = self.record_failure(now);
                AttemptOutcome::Failed { error, status }
            }
        }
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(ThrottlePolicy::default())
    }
}

/// Whole minutes left on a lock, rounded up
pub fn remaining_minutes(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (locked_until - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + 59_999) / 60_000
}
