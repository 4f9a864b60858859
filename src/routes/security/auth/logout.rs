use rocket::http::CookieJar;
use rocket::response::{Flash, Redirect};
use rocket::State;
use std::sync::Arc;

use crate::security::auth::{self, AccessDenied, NOT_ALLOWED};
use crate::store::Store;

use super::LOGIN_PATH;

#[get("/logout")]
pub fn logout(store: &State<Arc<dyn Store>>, admin: Option<auth::AdminUser>, cookies: &CookieJar<'_>) -> Redirect {
    if let Some(admin) = admin {
        if let Err(e) = auth::destroy_session(&**store.inner(), &admin.session_id) {
            log::warn!("Session of {} not deleted: {}", admin.user.email, e);
        }
    }
    auth::clear_session_cookie(cookies);
    Redirect::to(LOGIN_PATH)
}

fn to_login(denied: AccessDenied) -> Result<Redirect, Flash<Redirect>> {
    if denied.0 {
        Err(Flash::error(Redirect::to(LOGIN_PATH), NOT_ALLOWED))
    } else {
        Ok(Redirect::to(LOGIN_PATH))
    }
}

/// Catch-all for any /admin/* route that failed the AdminUser guard.
#[get("/<_path..>", rank = 99)]
pub fn admin_redirect_to_login(_path: std::path::PathBuf, denied: AccessDenied) -> Result<Redirect, Flash<Redirect>> {
    to_login(denied)
}

#[post("/<_path..>", rank = 99)]
pub fn admin_post_redirect_to_login(_path: std::path::PathBuf, denied: AccessDenied) -> Result<Redirect, Flash<Redirect>> {
    to_login(denied)
}
