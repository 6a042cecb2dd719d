//! Browser session relay between the storefront and the Shop API.
//!
//! The Shop API authenticates with its own session cookie. An [`ApiSession`]
//! carries the browser's `Cookie` header into outgoing calls and collects any
//! `Set-Cookie` headers the API answers with, so route handlers can hand them
//! back to the browser. Cookies set by one call are merged into the header
//! forwarded by later calls in the same request.

use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::response::AppendHeaders;

/// Session context for calls made on behalf of one browser request.
#[derive(Debug, Default)]
pub struct ApiSession {
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    /// Cookie pairs forwarded to the API, in browser order.
    cookies: Vec<(String, String)>,
    /// Raw `Set-Cookie` values received from the API.
    set_cookies: Vec<HeaderValue>,
}

impl ApiSession {
    /// Build a session from the browser's `Cookie` header.
    #[must_use]
    pub fn from_cookie_header(header: Option<&str>) -> Self {
        let cookies = header.map(parse_cookie_header).unwrap_or_default();
        Self {
            state: Mutex::new(SessionState {
                cookies,
                set_cookies: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The `Cookie` header to forward, if the browser sent any cookies.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        let state = self.lock();
        if state.cookies.is_empty() {
            return None;
        }
        Some(
            state
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Record a `Set-Cookie` header from an API response.
    ///
    /// The cookie's value replaces (or is added to) the forwarded cookies;
    /// a cookie cleared with an empty value is dropped.
    pub fn capture_set_cookie(&self, value: &HeaderValue) {
        let mut state = self.lock();
        state.set_cookies.push(value.clone());

        let Some((name, cookie_value)) = value.to_str().ok().and_then(parse_set_cookie) else {
            return;
        };

        state.cookies.retain(|(existing, _)| existing != &name);
        if !cookie_value.is_empty() {
            state.cookies.push((name, cookie_value));
        }
    }

    /// Raw `Set-Cookie` values captured so far.
    #[must_use]
    pub fn captured_set_cookies(&self) -> Vec<HeaderValue> {
        self.lock().set_cookies.clone()
    }

    /// Captured cookies as response headers for the browser.
    #[must_use]
    pub fn relay_headers(&self) -> AppendHeaders<Vec<(HeaderName, HeaderValue)>> {
        AppendHeaders(
            self.lock()
                .set_cookies
                .iter()
                .map(|value| (SET_COOKIE, value.clone()))
                .collect(),
        )
    }
}

impl<S> FromRequestParts<S> for ApiSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(COOKIE).and_then(|v| v.to_str().ok());
        Ok(Self::from_cookie_header(header))
    }
}

fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let first = header.split(';').next()?;
    let (name, value) = first.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_forwarded_verbatim() {
        let session = ApiSession::from_cookie_header(Some("session=abc; session.sig=def"));
        assert_eq!(
            session.cookie_header().as_deref(),
            Some("session=abc; session.sig=def")
        );
    }

    #[test]
    fn test_no_cookies_means_no_header() {
        assert!(ApiSession::default().cookie_header().is_none());
        assert!(ApiSession::from_cookie_header(Some("")).cookie_header().is_none());
    }

    #[test]
    fn test_set_cookie_updates_forwarded_header() {
        let session = ApiSession::from_cookie_header(Some("theme=dark; session=old"));
        session.capture_set_cookie(&HeaderValue::from_static(
            "session=new; Path=/; HttpOnly; SameSite=Lax",
        ));

        assert_eq!(
            session.cookie_header().as_deref(),
            Some("theme=dark; session=new")
        );
        assert_eq!(session.captured_set_cookies().len(), 1);
    }

    #[test]
    fn test_cleared_cookie_is_dropped() {
        let session = ApiSession::from_cookie_header(Some("session=abc"));
        session.capture_set_cookie(&HeaderValue::from_static(
            "session=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        ));

        assert!(session.cookie_header().is_none());
    }

    #[test]
    fn test_relay_headers_carry_every_capture() {
        let session = ApiSession::default();
        session.capture_set_cookie(&HeaderValue::from_static("session=a; Path=/"));
        session.capture_set_cookie(&HeaderValue::from_static("session.sig=b; Path=/"));

        let AppendHeaders(headers) = session.relay_headers();
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|(name, _)| name == SET_COOKIE));
        assert_eq!(
            headers.get(1).unwrap().1,
            HeaderValue::from_static("session.sig=b; Path=/")
        );
    }
}
