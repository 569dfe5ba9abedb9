//! Authentication hooks around each attempt.
//!
//! # Responsibilities
//! - Attach the session's bearer token to outgoing requests
//! - React to an expired session (HTTP 401)
//!
//! # Design Decisions
//! - Token storage is lock-free (`ArcSwapOption`); reads happen on every attempt
//! - Teardown on expiry is a caller-supplied callback

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Callbacks invoked by [`crate::http::HttpClient`] around each attempt.
pub trait RequestHooks: Send + Sync {
    /// Adjust headers before the request is sent.
    fn on_before_request(&self, _headers: &mut HeaderMap) {}

    /// The backend answered 401.
    fn on_auth_expired(&self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl RequestHooks for NoHooks {}

type Teardown = Box<dyn Fn() + Send + Sync>;

/// Bearer-token session.
#[derive(Default)]
pub struct Session {
    token: ArcSwapOption<String>,
    on_expired: Option<Teardown>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `teardown` after the token is cleared on a 401.
    pub fn with_teardown<F>(mut self, teardown: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_expired = Some(Box::new(teardown));
        self
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.token.store(Some(Arc::new(token.into())));
    }

    pub fn token(&self) -> Option<Arc<String>> {
        self.token.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    pub fn clear(&self) {
        self.token.store(None);
    }
}

impl RequestHooks for Session {
    fn on_before_request(&self, headers: &mut HeaderMap) {
        let Some(token) = self.token.load_full() else {
            return;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Session token is not a valid header value, sending unauthenticated"),
        }
    }

    fn on_auth_expired(&self) {
        tracing::warn!("Session expired, clearing token");
        self.clear();
        if let Some(teardown) = &self.on_expired {
            teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_bearer_injected_only_with_token() {
        let session = Session::new();
        let mut headers = HeaderMap::new();
        session.on_before_request(&mut headers);
        assert!(headers.get(AUTHORIZATION).is_none());

        session.set_token("abc123");
        session.on_before_request(&mut headers);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[test]
    fn test_expiry_clears_and_tears_down() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = torn_down.clone();
        let session = Session::new().with_teardown(move || flag.store(true, Ordering::SeqCst));
        session.set_token("abc123");

        session.on_auth_expired();

        assert!(!session.is_authenticated());
        assert!(torn_down.load(Ordering::SeqCst));
    }
}
