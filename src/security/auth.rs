use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::models::user::User;
use crate::store::Store;
use crate::upload::CredentialRefresh;

const SESSION_COOKIE: &str = "pasticceria_session";
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const MIN_PASSWORD_LEN: usize = 6;
pub const NOT_ALLOWED: &str = "Questo utente non è autorizzato all'area admin.";

// ── Client IP request guard ──

/// Extracts the client IP, honouring the usual proxy headers first.
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();
        for name in ["X-Real-IP", "X-Forwarded-For"] {
            if let Some(ip) = headers.get_one(name).and_then(|v| v.split(',').next()) {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Outcome::Success(ClientIp(ip.to_string()));
                }
            }
        }
        let ip = request
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

// ── Console guard ──

/// Guard: signed in and, when an allow-list is configured, on it.
/// A signed-in user who is not allowed is signed out on the spot.
pub struct AdminUser {
    pub user: User,
    pub session_id: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some((user, session_id)) = resolve_session_user(request).await else {
            return Outcome::Forward(Status::Unauthorized);
        };
        let allowed = request
            .guard::<&State<SiteConfig>>()
            .await
            .succeeded()
            .map(|c| c.is_admin_allowed(&user.email))
            .unwrap_or(false);
        if !allowed {
            log::warn!("User {} is not on the admin allow-list, signing out", user.email);
            if let Some(store) = request.guard::<&State<Arc<dyn Store>>>().await.succeeded() {
                let _ = store.session_delete(&session_id);
            }
            clear_session_cookie(request.cookies());
            request.local_cache(|| AccessDenied(true));
            return Outcome::Forward(Status::Forbidden);
        }
        Outcome::Success(AdminUser { user, session_id })
    }
}

/// Set for the rest of a request once `AdminUser` signed a user out for
/// not being on the allow-list, so the fallback route can say why.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessDenied(pub bool);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AccessDenied {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(*request.local_cache(|| AccessDenied(false)))
    }
}

async fn resolve_session_user(request: &Request<'_>) -> Option<(User, String)> {
    let store = request
        .guard::<&State<Arc<dyn Store>>>()
        .await
        .succeeded()?;
    let cookies = request.cookies();
    let session_id = cookies.get_private(SESSION_COOKIE)?.value().to_string();

    match store.session_get_user(&session_id) {
        Some(user) => Some((user, session_id)),
        None => {
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            None
        }
    }
}

// ── Password utilities ──

pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ── Sign-in / sign-up ──

/// Check credentials. The error is the reason shown after "Accesso fallito: ".
pub fn sign_in(store: &dyn Store, email: &str, password: &str) -> Result<User, String> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err("email e password sono obbligatorie".to_string());
    }
    match store.user_get_by_email(email) {
        Some(user) if verify_password(password, &user.password_hash) => {
            if let Err(e) = store.user_touch_last_login(user.id) {
                log::warn!("last_login not updated for {}: {}", user.email, e);
            }
            Ok(user)
        }
        _ => Err("credenziali non valide".to_string()),
    }
}

/// Create an account. The error is the reason shown after
/// "Registrazione fallita: ".
pub fn sign_up(store: &dyn Store, email: &str, password: &str) -> Result<User, String> {
    let email = email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err("indirizzo email non valido".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "la password deve avere almeno {} caratteri",
            MIN_PASSWORD_LEN
        ));
    }
    if store.user_get_by_email(email).is_some() {
        return Err("indirizzo email già registrato".to_string());
    }
    let hash = hash_password(password)?;
    let id = store.user_create(email, &hash)?;
    store
        .user_get_by_id(id)
        .ok_or_else(|| "utente non trovato dopo la registrazione".to_string())
}

// ── Session management ──

fn expiry(store: &dyn Store) -> String {
    let hours = store.setting_get_i64("session_expiry_hours").max(1);
    (Utc::now().naive_utc() + Duration::hours(hours))
        .format(TS_FORMAT)
        .to_string()
}

pub fn create_session(store: &dyn Store, user_id: i64) -> Result<String, String> {
    let session_id = uuid::Uuid::new_v4().to_string();
    store.session_create(user_id, &session_id, &expiry(store))?;
    Ok(session_id)
}

pub fn destroy_session(store: &dyn Store, session_id: &str) -> Result<(), String> {
    store.session_delete(session_id)
}

/// Renews the signed-in session before an upload batch, the same way a
/// hosted auth SDK refreshes its token.
pub struct SessionRefresher<'a> {
    pub store: &'a dyn Store,
    pub session_id: &'a str,
}

impl CredentialRefresh for SessionRefresher<'_> {
    fn refresh(&self) -> Result<(), String> {
        self.store.session_refresh(self.session_id, &expiry(self.store))
    }
}

/// Set the session cookie. `Secure` follows the site URL scheme.
pub fn set_session_cookie(cookies: &CookieJar<'_>, session_id: &str, config: &SiteConfig) {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(rocket::http::SameSite::Strict);
    cookie.set_path("/");
    if config.site_url.starts_with("https://") {
        cookie.set_secure(true);
    }
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

pub fn hash_ip(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;

    fn test_store() -> SqliteStore {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        let store = SqliteStore::new(pool);
        store.run_migrations().unwrap();
        store.seed_defaults().unwrap();
        store
    }

    #[test]
    fn sign_up_then_sign_in() {
        let s = test_store();
        let user = sign_up(&s, " owner@example.com ", "segreto1").unwrap();
        assert_eq!(user.email, "owner@example.com");
        assert!(sign_in(&s, "owner@example.com", "segreto1").is_ok());
        assert_eq!(
            sign_in(&s, "owner@example.com", "sbagliata").unwrap_err(),
            "credenziali non valide"
        );
        assert!(sign_up(&s, "owner@example.com", "altrapass").is_err());
    }

    #[test]
    fn sign_up_validation() {
        let s = test_store();
        assert!(sign_up(&s, "nobody", "segreto1").is_err());
        assert!(sign_up(&s, "a@b.it", "corta").unwrap_err().contains("6"));
        assert_eq!(s.user_count(), 0);
    }

    #[test]
    fn session_lifecycle_and_refresh() {
        let s = test_store();
        let user = sign_up(&s, "a@b.it", "segreto1").unwrap();
        let sid = create_session(&s, user.id).unwrap();
        assert_eq!(s.session_get_user(&sid).map(|u| u.id), Some(user.id));

        let refresher = SessionRefresher { store: &s, session_id: &sid };
        assert!(refresher.refresh().is_ok());

        destroy_session(&s, &sid).unwrap();
        assert!(s.session_get_user(&sid).is_none());
    }

    #[test]
    fn ip_hash_is_stable_hex() {
        assert_eq!(hash_ip("127.0.0.1"), hash_ip("127.0.0.1"));
        assert_eq!(hash_ip("127.0.0.1").len(), 64);
    }
}
