use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::core::throttle::{
    self, AttemptOutcome, LoginThrottle, ThrottleDecision, ThrottlePolicy, ThrottleStatus,
};
use crate::core::unlock::{SharedThrottle, UnlockWatcher};
use crate::models::LoginThrottleState;

/// Errors that can occur persisting throttle state
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Live throttle for one client plus its unlock watcher, if locked
struct ClientThrottle {
    throttle: SharedThrottle,
    watcher: Mutex<Option<UnlockWatcher>>,
}

impl ClientThrottle {
    fn new(throttle: LoginThrottle) -> Self {
        Self {
            throttle: Arc::new(Mutex::new(throttle)),
            watcher: Mutex::new(None),
        }
    }
}

/// Redis persistence for throttle records
#[derive(Clone)]
struct ThrottleStore {
    conn: Arc<Mutex<ConnectionManager>>,
    ttl_secs: u64,
}

impl ThrottleStore {
    async fn load(&self, client_id: &str) -> Result<Option<LoginThrottleState>, StoreError> {
        let mut conn = self.conn.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(ThrottleKey::client(client_id))
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, client_id: &str, state: &LoginThrottleState) -> Result<(), StoreError> {
        let key = ThrottleKey::client(client_id);
        let mut conn = self.conn.lock().await;

        if *state == LoginThrottleState::default() {
            let _: () = redis::cmd("DEL").arg(&key).query_async(&mut *conn).await?;
        } else {
            let json = serde_json::to_string(state)?;
            let _: () = redis::cmd("SETEX")
                .arg(&key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await?;
        }

        tracing::trace!("Throttle state saved: {}", key);
        Ok(())
    }
}

/// Per-client login throttles
///
/// Live state is held in memory (one owned [`LoginThrottle`] per client,
/// evicted after `idle_ttl`). When Redis is configured, a client's state is
/// read from Redis only when its live entry is created, and written back
/// after every change. Once an entry is live it is authoritative for this
/// process; changes made by other instances are picked up only after the
/// entry is evicted. Redis failures are logged and the registry carries on
/// with memory only.
pub struct ThrottleRegistry {
    live: moka::future::Cache<String, Arc<ClientThrottle>>,
    store: Option<ThrottleStore>,
    policy: ThrottlePolicy,
    unlock_tick: Duration,
    ttl_secs: u64,
}

impl ThrottleRegistry {
    /// Registry without persistence
    pub fn in_memory(policy: ThrottlePolicy, unlock_tick: Duration, idle_ttl_secs: u64) -> Self {
        let live = moka::future::CacheBuilder::new(100_000)
            .time_to_idle(Duration::from_secs(idle_ttl_secs.max(1)))
            .build();

        Self {
            live,
            store: None,
            policy,
            unlock_tick,
            ttl_secs: idle_ttl_secs.max(1),
        }
    }

    /// Registry persisting state to Redis
    pub async fn with_redis(
        redis_url: &str,
        policy: ThrottlePolicy,
        unlock_tick: Duration,
        idle_ttl_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        let mut registry = Self::in_memory(policy, unlock_tick, idle_ttl_secs);
        registry.store = Some(ThrottleStore {
            conn: Arc::new(Mutex::new(conn)),
            ttl_secs: registry.ttl_secs,
        });
        Ok(registry)
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Current status for a client, clearing an expired lock
    pub async fn status(&self, client_id: &str, now: DateTime<Utc>) -> ThrottleStatus {
        let entry = self.entry(client_id).await;
        let mut throttle = entry.throttle.lock().await;

        let unlocked = throttle.refresh(now);
        let status = throttle.status(now);
        let state = throttle.state().clone();
        drop(throttle);

        if unlocked {
            self.persist(client_id, &state).await;
        }
        status
    }

    /// Run a credential check through the client's throttle
    ///
    /// The lock decision and the recorded result are each taken under the
    /// client's mutex; the credential check itself runs without it, so
    /// concurrent attempts from one client may both reach the backend.
    /// When the attempt locks the client an [`UnlockWatcher`] is started.
    pub async fn attempt<F, Fut, T, E>(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
        credential_check: F,
    ) -> AttemptOutcome<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let entry = self.entry(client_id).await;

        let mut throttle = entry.throttle.lock().await;
        let before = throttle.state().clone();
        let decision = throttle.check(now);
        let after = throttle.state().clone();
        drop(throttle);

        if before != after {
            self.persist(client_id, &after).await;
        }

        if let ThrottleDecision::Rejected {
            locked_until,
            remaining_minutes,
        } = decision
        {
            return AttemptOutcome::Rejected {
                locked_until,
                remaining_minutes,
            };
        }

        let result = credential_check().await;

        let mut throttle = entry.throttle.lock().await;
        let before = throttle.state().clone();
        let outcome = match result {
            Ok(value) => {
                throttle.record_success();
                AttemptOutcome::Succeeded(value)
            }
            Err(error) => {
                let status = throttle.record_failure(now);
                AttemptOutcome::Failed { error, status }
            }
        };
        let after = throttle.state().clone();
        drop(throttle);

        if before != after {
            self.persist(client_id, &after).await;
        }

        if let AttemptOutcome::Failed { status, .. } = &outcome {
            if status.is_locked() {
                tracing::info!("Client {} locked after repeated failed sign-ins", client_id);
                self.ensure_watcher(client_id, &entry).await;
            }
        }

        outcome
    }

    /// Force a client's throttle open, stopping any unlock watcher
    pub async fn reset(&self, client_id: &str) {
        let entry = self.entry(client_id).await;
        if let Some(watcher) = entry.watcher.lock().await.take() {
            watcher.cancel();
        }

        let mut throttle = entry.throttle.lock().await;
        throttle.reset();
        let state = throttle.state().clone();
        drop(throttle);

        self.persist(client_id, &state).await;

        tracing::info!("Login throttle reset for client {}", client_id);
    }

    /// Live status updates for a locked client
    ///
    /// Returns `None` when the client is not locked.
    pub async fn subscribe(&self, client_id: &str) -> Option<watch::Receiver<ThrottleStatus>> {
        let entry = self.entry(client_id).await;
        let watcher = entry.watcher.lock().await;
        let receiver = watcher
            .as_ref()
            .filter(|w| !w.is_finished())
            .map(UnlockWatcher::subscribe);
        receiver
    }

    /// Live entry for a client, loading persisted state on first use
    ///
    /// A client found locked gets an unlock watcher if none is running.
    async fn entry(&self, client_id: &str) -> Arc<ClientThrottle> {
        let entry = self
            .live
            .get_with(client_id.to_string(), async {
                let state = match self.load(client_id).await {
                    Ok(state) => state.unwrap_or_default(),
                    Err(e) => {
                        tracing::warn!("Failed to load throttle state for {}: {}", client_id, e);
                        LoginThrottleState::default()
                    }
                };
                Arc::new(ClientThrottle::new(LoginThrottle::from_state(self.policy, state)))
            })
            .await;

        self.ensure_watcher(client_id, &entry).await;
        entry
    }

    /// Start an unlock watcher for a locked client unless one is running
    async fn ensure_watcher(&self, client_id: &str, entry: &ClientThrottle) {
        let now = Utc::now();
        let locked_until = entry.throttle.lock().await.locked_until(now);
        let Some(locked_until) = locked_until else {
            return;
        };

        let mut watcher = entry.watcher.lock().await;
        if watcher.as_ref().is_some_and(|w| !w.is_finished()) {
            return;
        }

        let initial = ThrottleStatus::Locked {
            locked_until,
            remaining_minutes: throttle::remaining_minutes(locked_until, now),
        };
        let started = UnlockWatcher::spawn(entry.throttle.clone(), self.unlock_tick, initial);

        if let Some(store) = &self.store {
            persist_on_unlock(
                store.clone(),
                client_id.to_string(),
                entry.throttle.clone(),
                started.subscribe(),
            );
        }

        tracing::debug!("Unlock watcher started for client {} until {}", client_id, locked_until);
        *watcher = Some(started);
    }

    async fn persist(&self, client_id: &str, state: &LoginThrottleState) {
        if let Err(e) = self.save(client_id, state).await {
            tracing::warn!("Failed to persist throttle state for {}: {}", client_id, e);
        }
    }

    /// Load a client's persisted state
    pub async fn load(&self, client_id: &str) -> Result<Option<LoginThrottleState>, StoreError> {
        match &self.store {
            Some(store) => store.load(client_id).await,
            None => Ok(None),
        }
    }

    /// Save a client's state; a cleared state removes the key
    pub async fn save(&self, client_id: &str, state: &LoginThrottleState) -> Result<(), StoreError> {
        match &self.store {
            Some(store) => store.save(client_id, state).await,
            None => Ok(()),
        }
    }
}

/// Save the throttle's state once its watcher publishes an open status
///
/// Ends without saving if the watcher is cancelled while still locked.
fn persist_on_unlock(
    store: ThrottleStore,
    client_id: String,
    throttle: SharedThrottle,
    mut updates: watch::Receiver<ThrottleStatus>,
) {
    tokio::spawn(async move {
        loop {
            let sender_alive = updates.changed().await.is_ok();
            let locked = updates.borrow_and_update().is_locked();

            if !locked {
                let state = throttle.lock().await.state().clone();
                if let Err(e) = store.save(&client_id, &state).await {
                    tracing::warn!("Failed to persist unlock for {}: {}", client_id, e);
                }
                return;
            }

            if !sender_alive {
                return;
            }
        }
    });
}

/// Redis key builder
pub struct ThrottleKey;

impl ThrottleKey {
    pub fn client(client_id: &str) -> String {
        format!("throttle:{}", client_id)
    }
}
