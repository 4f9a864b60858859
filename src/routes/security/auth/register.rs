use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::{Flash, Redirect};
use rocket::State;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SiteConfig;
use crate::rate_limit::RateLimiter;
use crate::routes::security::NoCacheTemplate;
use crate::security::auth::{self, ClientIp, NOT_ALLOWED};
use crate::store::Store;

use super::{login_template, CONSOLE_PATH, WINDOW_SECS};

pub const REGISTERED: &str = "Utente registrato.";

#[derive(Debug, FromForm)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
}

pub fn register_failed(reason: &str) -> String {
    format!("Registrazione fallita: {}", reason)
}

/// Create an account and sign it in. A new account outside the
/// allow-list is created but gets no session.
#[post("/register", data = "<form>")]
pub fn register_submit(
    form: Form<RegisterForm>,
    store: &State<Arc<dyn Store>>,
    config: &State<SiteConfig>,
    limiter: &State<Arc<RateLimiter>>,
    cookies: &CookieJar<'_>,
    client_ip: ClientIp,
) -> Result<Flash<Redirect>, NoCacheTemplate> {
    let s: &dyn Store = &**store.inner();
    let rate_key = format!("register:{}", auth::hash_ip(&client_ip.0));
    let max_attempts = s.setting_get_i64("login_rate_limit").max(1) as u64;
    let fail = |reason: &str| NoCacheTemplate(login_template(config, Some(&register_failed(reason)), None, &form.email));

    if !limiter.check_and_record(&rate_key, max_attempts, Duration::from_secs(WINDOW_SECS)) {
        return Err(fail("troppi tentativi, riprova tra 15 minuti"));
    }

    let user = auth::sign_up(s, &form.email, &form.password).map_err(|e| {
        log::info!("Sign-up refused for {}: {}", form.email.trim(), e);
        fail(&e)
    })?;
    log::info!("Registered {}", user.email);

    if !config.is_admin_allowed(&user.email) {
        return Err(NoCacheTemplate(login_template(
            config,
            Some(NOT_ALLOWED),
            Some(REGISTERED),
            &user.email,
        )));
    }
    let session_id = auth::create_session(s, user.id).map_err(|e| {
        log::error!("Session for {} not created: {}", user.email, e);
        fail("sessione non creata")
    })?;
    auth::set_session_cookie(cookies, &session_id, config);
    Ok(Flash::success(Redirect::to(CONSOLE_PATH), REGISTERED))
}
