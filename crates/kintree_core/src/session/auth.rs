//! Auth collaborator contracts and in-memory reference implementation.
//!
//! # Responsibility
//! - Define the login/refresh/logout contract consumed by `SessionGuard`.
//! - Provide an in-process token service for local use and tests.
//!
//! # Invariants
//! - Refreshing rotates the access token and invalidates the previous one.
//! - A revoked refresh token is permanently rejected.

use crate::session::token::{AccessToken, Credentials, RefreshToken, TokenPair};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Auth endpoint failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login rejected the supplied credentials.
    InvalidCredentials,
    /// Refresh token is unknown, expired, or revoked.
    RefreshRejected,
    /// Endpoint unreachable or timed out.
    Transport(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::RefreshRejected => write!(f, "refresh token rejected"),
            Self::Transport(message) => write!(f, "auth transport failure: {message}"),
        }
    }
}

impl Error for AuthError {}

/// Auth endpoints consumed by `SessionGuard`.
///
/// Exact transport is out of scope; only call/result/error semantics
/// matter here.
pub trait AuthClient: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError>;
    fn refresh(&self, refresh_token: &RefreshToken) -> Result<AccessToken, AuthError>;
    fn logout(&self, access_token: &AccessToken) -> Result<(), AuthError>;
}

/// Token acceptance check used by store implementations to decide
/// whether to reject a call with `TokenRejected`.
pub trait TokenValidator: Send + Sync {
    fn is_valid(&self, token: &AccessToken) -> bool;
}

struct AuthInner {
    /// email -> password
    accounts: BTreeMap<String, String>,
    /// refresh token -> currently valid access token
    sessions: HashMap<String, String>,
    valid_access: HashSet<String>,
}

/// In-process auth service implementing both `AuthClient` and
/// `TokenValidator` against the same token state.
///
/// Serves local/demo setups and tests; a networked deployment swaps in
/// a transport-backed `AuthClient` without touching the guard.
pub struct MemoryAuthService {
    inner: Mutex<AuthInner>,
    refresh_calls: AtomicUsize,
    refresh_delay: Mutex<Option<Duration>>,
}

impl MemoryAuthService {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AuthInner {
                accounts: BTreeMap::new(),
                sessions: HashMap::new(),
                valid_access: HashSet::new(),
            }),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay: Mutex::new(None),
        }
    }

    /// Creates a service with a single registered account.
    pub fn with_account(email: impl Into<String>, password: impl Into<String>) -> Self {
        let service = Self::new();
        service.register_account(email, password);
        service
    }

    /// Registers one login account.
    pub fn register_account(&self, email: impl Into<String>, password: impl Into<String>) {
        let mut inner = self.lock_inner();
        inner.accounts.insert(email.into(), password.into());
    }

    /// Invalidates one access token while keeping its session alive,
    /// so the next call is rejected but a refresh still succeeds.
    pub fn expire_access(&self, token: &AccessToken) {
        let mut inner = self.lock_inner();
        inner.valid_access.remove(token.as_str());
    }

    /// Invalidates every outstanding access token while keeping the
    /// sessions alive, so refreshes still succeed.
    pub fn expire_all_access(&self) {
        let mut inner = self.lock_inner();
        inner.valid_access.clear();
    }

    /// Revokes one refresh token; subsequent refresh attempts fail.
    pub fn revoke_refresh(&self, token: &RefreshToken) {
        let mut inner = self.lock_inner();
        if let Some(access) = inner.sessions.remove(token.as_str()) {
            inner.valid_access.remove(&access);
        }
    }

    /// Number of refresh calls served so far.
    pub fn refresh_call_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Delays every refresh call, for exercising refresh timeouts.
    pub fn set_refresh_delay(&self, delay: Duration) {
        let mut slot = self
            .refresh_delay
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        *slot = Some(delay);
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, AuthInner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn mint_token() -> String {
        Uuid::new_v4().to_string()
    }
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthClient for MemoryAuthService {
    fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let mut inner = self.lock_inner();
        match inner.accounts.get(&credentials.email) {
            Some(password) if *password == credentials.password => {
                let access = Self::mint_token();
                let refresh = Self::mint_token();
                inner.valid_access.insert(access.clone());
                inner.sessions.insert(refresh.clone(), access.clone());
                Ok(TokenPair {
                    access: AccessToken::new(access),
                    refresh: RefreshToken::new(refresh),
                })
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    fn refresh(&self, refresh_token: &RefreshToken) -> Result<AccessToken, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        let delay = {
            let slot = self
                .refresh_delay
                .lock()
                .unwrap_or_else(|err| err.into_inner());
            *slot
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut inner = self.lock_inner();
        if !inner.sessions.contains_key(refresh_token.as_str()) {
            return Err(AuthError::RefreshRejected);
        }

        let access = Self::mint_token();
        if let Some(previous) = inner
            .sessions
            .insert(refresh_token.as_str().to_string(), access.clone())
        {
            inner.valid_access.remove(&previous);
        }
        inner.valid_access.insert(access.clone());
        Ok(AccessToken::new(access))
    }

    fn logout(&self, access_token: &AccessToken) -> Result<(), AuthError> {
        let mut inner = self.lock_inner();
        inner.valid_access.remove(access_token.as_str());
        inner
            .sessions
            .retain(|_, access| access != access_token.as_str());
        Ok(())
    }
}

impl TokenValidator for MemoryAuthService {
    fn is_valid(&self, token: &AccessToken) -> bool {
        self.lock_inner().valid_access.contains(token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthClient, AuthError, MemoryAuthService, TokenValidator};
    use crate::session::token::Credentials;

    #[test]
    fn login_issues_valid_token_pair() {
        let auth = MemoryAuthService::with_account("ada@example.com", "secret");
        let pair = auth
            .login(&Credentials::new("ada@example.com", "secret"))
            .expect("login should succeed");
        assert!(auth.is_valid(&pair.access));
    }

    #[test]
    fn login_rejects_bad_password() {
        let auth = MemoryAuthService::with_account("ada@example.com", "secret");
        let err = auth
            .login(&Credentials::new("ada@example.com", "wrong"))
            .expect_err("wrong password should fail");
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn refresh_rotates_access_token() {
        let auth = MemoryAuthService::with_account("ada@example.com", "secret");
        let pair = auth
            .login(&Credentials::new("ada@example.com", "secret"))
            .expect("login should succeed");

        let rotated = auth.refresh(&pair.refresh).expect("refresh should succeed");
        assert_ne!(rotated, pair.access);
        assert!(auth.is_valid(&rotated));
        assert!(!auth.is_valid(&pair.access));
        assert_eq!(auth.refresh_call_count(), 1);
    }

    #[test]
    fn revoked_refresh_token_is_rejected() {
        let auth = MemoryAuthService::with_account("ada@example.com", "secret");
        let pair = auth
            .login(&Credentials::new("ada@example.com", "secret"))
            .expect("login should succeed");

        auth.revoke_refresh(&pair.refresh);
        let err = auth
            .refresh(&pair.refresh)
            .expect_err("revoked refresh should fail");
        assert_eq!(err, AuthError::RefreshRejected);
    }

    #[test]
    fn logout_invalidates_session() {
        let auth = MemoryAuthService::with_account("ada@example.com", "secret");
        let pair = auth
            .login(&Credentials::new("ada@example.com", "secret"))
            .expect("login should succeed");

        auth.logout(&pair.access).expect("logout should succeed");
        assert!(!auth.is_valid(&pair.access));
        assert_eq!(
            auth.refresh(&pair.refresh).expect_err("session gone"),
            AuthError::RefreshRejected
        );
    }
}
