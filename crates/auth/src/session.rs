//! In-memory session store.
//!
//! Maps each issued token to the user it was issued for. A token is only
//! honoured while it both verifies (signature + expiry) and is still in the
//! map; removing it from the map is how logout revokes it. A background
//! sweeper evicts entries whose token no longer verifies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::claims::{IssuedToken, TokenError, TokenIssuer};
use crate::{AuthConfig, AuthError, User};

/// Outcome of checking a presented credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No credential was presented.
    Missing,
    /// The credential is not a structurally valid token.
    Malformed,
    /// Bad signature, wrong algorithm or expired.
    Invalid,
    Valid,
}

impl AuthStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, AuthStatus::Valid)
    }
}

#[derive(Debug)]
pub struct SessionStore {
    issuer: TokenIssuer,
    sessions: Mutex<HashMap<String, User>>,
}

impl SessionStore {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            issuer,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(TokenIssuer::new(config.secret.as_bytes(), config.ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.issuer.ttl()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, User>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a session for `user`, replacing the caller's `current` one.
    pub fn authenticate(&self, current: Option<&str>, user: User) -> Result<IssuedToken, AuthError> {
        self.authenticate_at(current, user, Utc::now())
    }

    /// As [`authenticate`](Self::authenticate) with an explicit issue time.
    pub fn authenticate_at(
        &self,
        current: Option<&str>,
        user: User,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let issued = self.issuer.mint(&user.username, issued_at)?;

        let mut sessions = self.lock();
        if let Some(old) = current {
            sessions.remove(old);
        }
        sessions.insert(issued.token.clone(), user);
        drop(sessions);

        debug!(expires_at = %issued.expires_at, "session opened");
        Ok(issued)
    }

    /// Drop the caller's session. Errors only when no credential was presented.
    pub fn deauthenticate(&self, current: Option<&str>) -> Result<(), AuthError> {
        let token = present(current).ok_or(AuthError::NoCredential)?;
        self.lock().remove(token);
        Ok(())
    }

    /// Swap the caller's session token for a freshly minted one.
    pub fn refresh(&self, current: Option<&str>) -> Result<IssuedToken, AuthError> {
        let old = present(current).ok_or(AuthError::NoCredential)?;
        let claims = self
            .issuer
            .verify(old)
            .map_err(|_| AuthError::NotAuthenticated)?;
        let issued = self.issuer.mint(&claims.username, Utc::now())?;

        let mut sessions = self.lock();
        let user = sessions.remove(old).ok_or(AuthError::NotAuthenticated)?;
        sessions.insert(issued.token.clone(), user);

        Ok(issued)
    }

    pub fn check_auth(&self, current: Option<&str>) -> AuthStatus {
        let Some(token) = present(current) else {
            return AuthStatus::Missing;
        };

        match self.issuer.verify(token) {
            Ok(_) => AuthStatus::Valid,
            Err(TokenError::Malformed) => AuthStatus::Malformed,
            Err(TokenError::Invalid) => AuthStatus::Invalid,
        }
    }

    pub fn is_authenticated(&self, current: Option<&str>) -> bool {
        self.user(current).is_some()
    }

    /// The user behind a valid, still-open session.
    pub fn user(&self, current: Option<&str>) -> Option<User> {
        if !self.check_auth(current).is_valid() {
            return None;
        }
        let token = present(current)?;
        self.lock().get(token).cloned()
    }

    /// Evict every session whose token no longer verifies. Returns the number evicted.
    pub fn sweep(&self) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|token, _| self.issuer.verify(token).is_ok());
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run [`sweep`](Self::sweep) every `period` until `shutdown` is cancelled.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            info!(period_ms = period.as_millis() as u64, "session sweeper started");
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(period) => {
                        let evicted = store.sweep();
                        if evicted > 0 {
                            info!(evicted, remaining = store.len(), "expired sessions evicted");
                        }
                    }
                }
            }
            info!("session sweeper stopped");
        })
    }
}

fn present(current: Option<&str>) -> Option<&str> {
    current.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn test_store() -> SessionStore {
        SessionStore::new(TokenIssuer::new(b"session-test-secret", Duration::from_secs(600)))
    }

    fn test_user(name: &str) -> User {
        User {
            id: 1,
            username: name.into(),
            email: format!("{name}@example.com"),
            ..User::default()
        }
    }

    #[test]
    fn authenticated_token_is_accepted_immediately() {
        let store = test_store();
        let issued = store.authenticate(None, test_user("johnny")).unwrap();
        let token = Some(issued.token.as_str());

        assert_eq!(store.check_auth(token), AuthStatus::Valid);
        assert!(store.is_authenticated(token));
        assert_eq!(store.user(token), Some(test_user("johnny")));
    }

    #[test]
    fn deauthenticated_token_is_rejected_although_it_still_verifies() {
        let store = test_store();
        let issued = store.authenticate(None, test_user("johnny")).unwrap();
        let token = Some(issued.token.as_str());

        store.deauthenticate(token).unwrap();

        assert_eq!(store.check_auth(token), AuthStatus::Valid);
        assert!(!store.is_authenticated(token));
        assert_eq!(store.user(token), None);
    }

    #[test]
    fn deauthenticate_without_credential_fails() {
        let store = test_store();
        assert!(matches!(store.deauthenticate(None), Err(AuthError::NoCredential)));
        assert!(matches!(store.deauthenticate(Some("")), Err(AuthError::NoCredential)));
    }

    #[test]
    fn reauthenticating_replaces_the_current_session() {
        let store = test_store();
        let first = store.authenticate(None, test_user("johnny")).unwrap();
        let second = store
            .authenticate_at(
                Some(&first.token),
                test_user("johnny"),
                Utc::now() + TimeDelta::seconds(1),
            )
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.is_authenticated(Some(&first.token)));
        assert!(store.is_authenticated(Some(&second.token)));
    }

    #[test]
    fn refresh_swaps_tokens_for_the_same_user() {
        let store = test_store();
        let old = store
            .authenticate_at(None, test_user("johnny"), Utc::now() - TimeDelta::seconds(5))
            .unwrap();

        let new = store.refresh(Some(&old.token)).unwrap();

        assert_ne!(old.token, new.token);
        assert!(!store.is_authenticated(Some(&old.token)));
        assert_eq!(store.user(Some(&new.token)).unwrap().username, "johnny");
    }

    #[test]
    fn same_second_logins_keep_separate_sessions() {
        let store = test_store();
        let at = Utc::now();
        let a = store.authenticate_at(None, test_user("johnny"), at).unwrap();
        let b = store.authenticate_at(None, test_user("johnny"), at).unwrap();

        store.deauthenticate(Some(&a.token)).unwrap();

        assert!(!store.is_authenticated(Some(&a.token)));
        assert!(store.is_authenticated(Some(&b.token)));
    }

    #[test]
    fn refresh_in_the_same_second_still_rotates_the_token() {
        let store = test_store();
        let old = store.authenticate(None, test_user("johnny")).unwrap();

        let new = store.refresh(Some(&old.token)).unwrap();

        assert_ne!(old.token, new.token);
        assert!(!store.is_authenticated(Some(&old.token)));
        assert!(store.is_authenticated(Some(&new.token)));
    }

    #[test]
    fn refresh_requires_an_open_session() {
        let store = test_store();
        let issued = store.authenticate(None, test_user("johnny")).unwrap();
        store.deauthenticate(Some(&issued.token)).unwrap();

        assert!(matches!(store.refresh(Some(&issued.token)), Err(AuthError::NotAuthenticated)));
        assert!(matches!(store.refresh(None), Err(AuthError::NoCredential)));
    }

    #[test]
    fn check_auth_classifies_credentials() {
        let store = test_store();
        let foreign = SessionStore::new(TokenIssuer::new(b"other", Duration::from_secs(600)))
            .authenticate(None, test_user("johnny"))
            .unwrap();

        assert_eq!(store.check_auth(None), AuthStatus::Missing);
        assert_eq!(store.check_auth(Some("garbage")), AuthStatus::Malformed);
        assert_eq!(store.check_auth(Some(&foreign.token)), AuthStatus::Invalid);
    }

    #[test]
    fn sweep_evicts_expired_sessions_only() {
        let store = test_store();
        let stale = store
            .authenticate_at(None, test_user("oldtimer"), Utc::now() - TimeDelta::minutes(11))
            .unwrap();
        let fresh = store.authenticate(None, test_user("johnny")).unwrap();

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.is_authenticated(Some(&fresh.token)));
        assert!(!store.is_authenticated(Some(&stale.token)));
    }

    #[test]
    fn concurrent_logins_lose_no_sessions() {
        let store = Arc::new(test_store());

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            store
                                .authenticate(None, test_user(&format!("user-{t}-{i}")))
                                .unwrap()
                                .token
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let tokens: Vec<String> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();

        assert_eq!(store.len(), 16 * 25);
        assert!(tokens.iter().all(|t| store.is_authenticated(Some(t))));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_on_its_own_timer_and_stops_on_cancel() {
        let store = Arc::new(test_store());
        store
            .authenticate_at(None, test_user("oldtimer"), Utc::now() - TimeDelta::minutes(11))
            .unwrap();

        let shutdown = CancellationToken::new();
        let sweeper = store.spawn_sweeper(Duration::from_secs(600), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert!(store.is_empty());

        shutdown.cancel();
        sweeper.await.unwrap();
    }
}
