use std::collections::HashMap;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use paperclip::actix::Apiv2Security;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "library_session";
const TOKEN_LENGTH: usize = 48;

/// Current unix time in seconds
pub fn now_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub expires_at: i64,
}

/// Server side store of logged in admin sessions
pub trait SessionStore: Send + Sync {
    /// Creates a new session for the admin, valid from `now` for the store's lifetime.
    /// Sessions that expired by `now` are dropped
    fn open(&self, username: &str, now: i64) -> Session;
    /// Returns the session if it exists and has not expired at `now`
    fn get(&self, token: &str, now: i64) -> Option<Session>;
    /// Removes the session, returns false if there was none
    fn close(&self, token: &str) -> bool;
}

pub struct InMemorySessionStore {
    session_ttl_secs: i64,
    sessions: parking_lot::RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new(session_ttl_secs: i64) -> Self {
        Self {
            session_ttl_secs,
            sessions: Default::default(),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn open(&self, username: &str, now: i64) -> Session {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        let session = Session {
            token: token.clone(),
            username: username.to_string(),
            expires_at: now + self.session_ttl_secs,
        };
        let mut sessions = self.sessions.write();
        sessions.retain(|_, stored| stored.expires_at > now);
        sessions.insert(token, session.clone());
        session
    }

    fn get(&self, token: &str, now: i64) -> Option<Session> {
        let session = self.sessions.read().get(token).cloned()?;
        if session.expires_at > now {
            Some(session)
        } else {
            self.sessions.write().remove(token);
            None
        }
    }

    fn close(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }
}

/// Attributes of the session cookie handed out on login
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookie {
    pub fn for_session(&self, session: &Session) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, session.token.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(CookieDuration::seconds(self.max_age_secs))
            .finish()
    }

    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// Tokens sent by the client: the session cookie followed by `Authorization: Bearer <token>`
pub fn session_tokens(req: &HttpRequest) -> Vec<String> {
    let cookie = req
        .cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    cookie.into_iter().chain(bearer).collect()
}

/// Authenticated admin of the current request. Taking it as a handler argument
/// rejects the request with 401 unless it carries a valid session
#[derive(Debug, Clone, Apiv2Security)]
#[openapi(
    apiKey,
    in = "header",
    name = "Authorization",
    description = "Session token as 'Bearer TOKEN', the library_session cookie is accepted as well"
)]
pub struct AdminSession {
    pub username: String,
    pub token: String,
}

impl AdminSession {
    pub fn from_http_request(req: &HttpRequest) -> Result<Self, ApiError> {
        let sessions = req
            .app_data::<Data<Arc<dyn SessionStore>>>()
            .ok_or_else(|| ApiError::Internal("Session store is not configured".to_string()))?;
        let now = now_timestamp();
        // the first token that resolves wins, a stale cookie does not hide a valid header
        let session = session_tokens(req)
            .iter()
            .find_map(|token| sessions.get(token, now))
            .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;
        Ok(Self {
            username: session.username,
            token: session.token,
        })
    }
}

impl FromRequest for AdminSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}

#[cfg(test)]
mod sessions_tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn test_sessions_expire_and_close() {
        let store = InMemorySessionStore::new(60);
        let session = store.open("admin", 1_000);
        assert_eq!(session.token.len(), TOKEN_LENGTH);
        assert_eq!(session.expires_at, 1_060);

        assert_eq!(store.get(&session.token, 1_059), Some(session.clone()));
        assert_eq!(store.get(&session.token, 1_060), None);
        // expired session was evicted
        assert!(!store.close(&session.token));

        let other = store.open("admin", 1_000);
        assert_ne!(other.token, session.token);
        assert!(store.close(&other.token));
        assert_eq!(store.get(&other.token, 1_001), None);
    }

    #[test]
    fn test_open_drops_expired_sessions() {
        let store = InMemorySessionStore::new(60);
        for _ in 0..1000 {
            store.open("admin", 0);
        }
        let still_valid = store.open("admin", 30);
        assert_eq!(store.sessions.read().len(), 1001);

        let fresh = store.open("admin", 60);
        assert_eq!(store.sessions.read().len(), 2);
        assert_eq!(store.get(&still_valid.token, 61), Some(still_valid));
        assert_eq!(store.get(&fresh.token, 61), Some(fresh));
    }

    #[test]
    fn test_token_is_read_from_cookie_or_bearer_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "cookie-token"))
            .to_http_request();
        assert_eq!(session_tokens(&req), vec!["cookie-token".to_string()]);

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer header-token"))
            .to_http_request();
        assert_eq!(session_tokens(&req), vec!["header-token".to_string()]);

        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "cookie-token"))
            .insert_header((AUTHORIZATION, "Bearer header-token"))
            .to_http_request();
        assert_eq!(
            session_tokens(&req),
            vec!["cookie-token".to_string(), "header-token".to_string()]
        );

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert!(session_tokens(&req).is_empty());
    }

    #[test]
    fn test_admin_session_requires_valid_token() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(60));
        let session = store.open("admin", now_timestamp());

        let req = TestRequest::default()
            .app_data(Data::new(store.clone()))
            .insert_header((AUTHORIZATION, format!("Bearer {}", session.token)))
            .to_http_request();
        let admin = AdminSession::from_http_request(&req).unwrap();
        assert_eq!(admin.username, "admin");

        let req = TestRequest::default()
            .app_data(Data::new(store.clone()))
            .cookie(Cookie::new(SESSION_COOKIE, "stale-token"))
            .insert_header((AUTHORIZATION, format!("Bearer {}", session.token)))
            .to_http_request();
        assert_eq!(
            AdminSession::from_http_request(&req).unwrap().token,
            session.token
        );

        let req = TestRequest::default()
            .app_data(Data::new(store.clone()))
            .insert_header((AUTHORIZATION, "Bearer unknown"))
            .to_http_request();
        assert!(matches!(
            AdminSession::from_http_request(&req),
            Err(ApiError::Unauthorized(..))
        ));

        let req = TestRequest::default()
            .app_data(Data::new(store))
            .to_http_request();
        assert!(matches!(
            AdminSession::from_http_request(&req),
            Err(ApiError::Unauthorized(..))
        ));
    }
}
