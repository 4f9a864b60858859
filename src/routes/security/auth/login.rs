use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::request::FlashMessage;
use rocket::response::Redirect;
use rocket::State;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SiteConfig;
use crate::rate_limit::RateLimiter;
use crate::routes::security::NoCacheTemplate;
use crate::security::auth::{self, ClientIp, NOT_ALLOWED};
use crate::store::Store;

use super::{login_template, CONSOLE_PATH, WINDOW_SECS};

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Prefix of every sign-in failure shown on the page.
pub fn login_failed(reason: &str) -> String {
    format!("Accesso fallito: {}", reason)
}

#[get("/login")]
pub fn login_page(config: &State<SiteConfig>, flash: Option<FlashMessage<'_>>) -> NoCacheTemplate {
    let (error, notice) = match &flash {
        Some(f) if f.kind() == "error" => (Some(f.message()), None),
        Some(f) => (None, Some(f.message())),
        None => (None, None),
    };
    NoCacheTemplate(login_template(config, error, notice, ""))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    store: &State<Arc<dyn Store>>,
    config: &State<SiteConfig>,
    limiter: &State<Arc<RateLimiter>>,
    cookies: &CookieJar<'_>,
    client_ip: ClientIp,
) -> Result<Redirect, NoCacheTemplate> {
    let s: &dyn Store = &**store.inner();
    let rate_key = format!("login:{}", auth::hash_ip(&client_ip.0));
    let max_attempts = s.setting_get_i64("login_rate_limit").max(1) as u64;
    let fail = |reason: &str| NoCacheTemplate(login_template(config, Some(&login_failed(reason)), None, &form.email));

    if !limiter.check_and_record(&rate_key, max_attempts, Duration::from_secs(WINDOW_SECS)) {
        log::warn!("Sign-in rate limit hit for {}", client_ip.0);
        return Err(fail("troppi tentativi, riprova tra 15 minuti"));
    }

    let user = auth::sign_in(s, &form.email, &form.password).map_err(|e| {
        log::info!("Sign-in refused for {}: {}", form.email.trim(), e);
        fail(&e)
    })?;
    if !config.is_admin_allowed(&user.email) {
        log::warn!("Sign-in by {} refused by the allow-list", user.email);
        return Err(fail(NOT_ALLOWED));
    }

    limiter.reset(&rate_key);
    match auth::create_session(s, user.id) {
        Ok(session_id) => {
            auth::set_session_cookie(cookies, &session_id, config);
            log::info!("{} signed in", user.email);
            Ok(Redirect::to(CONSOLE_PATH))
        }
        Err(e) => {
            log::error!("Session for {} not created: {}", user.email, e);
            Err(fail("sessione non creata"))
        }
    }
}
