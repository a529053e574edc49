//! Session guard with single-flight token refresh.
//!
//! # Responsibility
//! - Attach the current access token to outgoing store calls.
//! - Serialize token renewal: concurrent rejected callers share one
//!   refresh call and replay once against its outcome.
//!
//! # Invariants
//! - At most one refresh is in flight, no matter how many concurrent
//!   calls observed a rejection.
//! - A rejected call is replayed at most once per rejection; a replay
//!   rejection surfaces as `SessionExpired`.
//! - Refresh failure (including timeout) is terminal: the session drops
//!   to unauthenticated and logout listeners are notified.

use crate::session::auth::{AuthClient, AuthError};
use crate::session::token::{AccessToken, Credentials, RefreshToken, TokenPair};
use crate::store::{StoreError, StoreResult};
use log::{info, warn};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Subscriber notified when the session terminates.
pub trait SessionListener: Send + Sync {
    fn on_logout(&self);
}

enum SessionState {
    Unauthenticated,
    Authenticated(TokenPair),
    /// A refresh round is in flight; the refresh token travels with the
    /// leader, waiters block on the condvar until the round settles.
    Refreshing,
}

struct GuardState {
    session: SessionState,
    /// Incremented every time a refresh round settles, so waiters can
    /// tell rounds apart.
    refresh_rounds: u64,
}

/// Token holder and single-flight refresh coordinator.
///
/// Replaces any notion of a process-global "current auth header": the
/// guard instance is injected into whatever issues store calls.
pub struct SessionGuard {
    auth: Arc<dyn AuthClient>,
    state: Mutex<GuardState>,
    round_settled: Condvar,
    refresh_timeout: Duration,
    listeners: Mutex<Vec<Arc<dyn SessionListener>>>,
}

impl SessionGuard {
    pub fn new(auth: Arc<dyn AuthClient>) -> Self {
        Self::with_refresh_timeout(auth, DEFAULT_REFRESH_TIMEOUT)
    }

    pub fn with_refresh_timeout(auth: Arc<dyn AuthClient>, refresh_timeout: Duration) -> Self {
        Self {
            auth,
            state: Mutex::new(GuardState {
                session: SessionState::Unauthenticated,
                refresh_rounds: 0,
            }),
            round_settled: Condvar::new(),
            refresh_timeout,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers a logout subscriber.
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        listeners.push(listener);
    }

    /// Authenticates against the auth collaborator and stores the pair.
    pub fn login(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let pair = self.auth.login(credentials)?;
        let mut state = self.lock_state();
        state.session = SessionState::Authenticated(pair);
        info!("event=session_login module=session status=ok");
        Ok(())
    }

    /// Ends the session: best-effort auth logout, then drop to
    /// unauthenticated and notify listeners.
    pub fn logout(&self) {
        let pair = {
            let mut state = self.lock_state();
            let pair = match &state.session {
                SessionState::Authenticated(pair) => Some(pair.clone()),
                _ => None,
            };
            state.session = SessionState::Unauthenticated;
            pair
        };

        if let Some(pair) = pair {
            if let Err(err) = self.auth.logout(&pair.access) {
                warn!("event=session_logout module=session status=error error={err}");
            }
        }
        info!("event=session_logout module=session status=ok");
        self.notify_logout();
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.lock_state().session, SessionState::Authenticated(_))
    }

    /// Returns the token a decorated request would carry right now.
    ///
    /// Waits out an in-flight refresh round; fails with `SessionExpired`
    /// when no session exists.
    pub fn access_token(&self) -> StoreResult<AccessToken> {
        let mut state = self.lock_state();
        loop {
            match &state.session {
                SessionState::Authenticated(pair) => return Ok(pair.access.clone()),
                SessionState::Unauthenticated => return Err(StoreError::SessionExpired),
                SessionState::Refreshing => {
                    state = self
                        .round_settled
                        .wait(state)
                        .unwrap_or_else(|err| err.into_inner());
                }
            }
        }
    }

    /// Runs `op` with the current access token.
    ///
    /// On `TokenRejected` the guard refreshes (single-flight across all
    /// concurrent rejected callers) and replays `op` exactly once with
    /// the new token. A rejection on replay maps to `SessionExpired`.
    pub fn call<T>(&self, op: impl Fn(&AccessToken) -> StoreResult<T>) -> StoreResult<T> {
        let token = self.access_token()?;
        match op(&token) {
            Err(StoreError::TokenRejected) => {
                let fresh = self.refresh_after_rejection(&token)?;
                match op(&fresh) {
                    Err(StoreError::TokenRejected) => Err(StoreError::SessionExpired),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Resolves a rejected token to a fresh one, refreshing at most once
    /// per rejection round across arbitrarily many concurrent callers.
    fn refresh_after_rejection(&self, stale: &AccessToken) -> StoreResult<AccessToken> {
        let mut state = self.lock_state();
        loop {
            match &state.session {
                SessionState::Authenticated(pair) if pair.access != *stale => {
                    // Another caller already completed a refresh round.
                    return Ok(pair.access.clone());
                }
                SessionState::Authenticated(pair) => {
                    let refresh_token = pair.refresh.clone();
                    state.session = SessionState::Refreshing;
                    drop(state);
                    return self.lead_refresh(refresh_token);
                }
                SessionState::Refreshing => {
                    state = self
                        .round_settled
                        .wait(state)
                        .unwrap_or_else(|err| err.into_inner());
                }
                SessionState::Unauthenticated => return Err(StoreError::SessionExpired),
            }
        }
    }

    /// Executes the single refresh call for the current round and
    /// settles the session state for every waiter.
    fn lead_refresh(&self, refresh_token: RefreshToken) -> StoreResult<AccessToken> {
        info!("event=session_refresh module=session status=start");
        let outcome = self.run_refresh_with_timeout(refresh_token.clone());

        let mut state = self.lock_state();
        state.refresh_rounds += 1;
        let result = match outcome {
            Ok(access) => {
                state.session = SessionState::Authenticated(TokenPair {
                    access: access.clone(),
                    refresh: refresh_token,
                });
                info!(
                    "event=session_refresh module=session status=ok rounds={}",
                    state.refresh_rounds
                );
                Ok(access)
            }
            Err(err) => {
                state.session = SessionState::Unauthenticated;
                warn!("event=session_refresh module=session status=error error={err}");
                Err(StoreError::SessionExpired)
            }
        };
        self.round_settled.notify_all();
        drop(state);

        if result.is_err() {
            self.notify_logout();
        }
        result
    }

    /// Runs the refresh call on a helper thread so a hung endpoint
    /// cannot wedge the guard; timeout counts as refresh failure.
    fn run_refresh_with_timeout(&self, refresh_token: RefreshToken) -> Result<AccessToken, AuthError> {
        let (sender, receiver) = mpsc::channel();
        let auth = Arc::clone(&self.auth);
        thread::spawn(move || {
            let _ = sender.send(auth.refresh(&refresh_token));
        });

        match receiver.recv_timeout(self.refresh_timeout) {
            Ok(result) => result,
            Err(_) => Err(AuthError::Transport(format!(
                "refresh timed out after {}ms",
                self.refresh_timeout.as_millis()
            ))),
        }
    }

    fn notify_logout(&self) {
        let listeners = {
            let listeners = self
                .listeners
                .lock()
                .unwrap_or_else(|err| err.into_inner());
            listeners.clone()
        };
        for listener in listeners {
            listener.on_logout();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}
