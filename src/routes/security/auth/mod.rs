use rocket_dyn_templates::Template;
use serde_json::json;

use crate::config::SiteConfig;

pub mod login;
pub mod logout;
pub mod register;

pub const LOGIN_PATH: &str = "/admin/login";
pub const CONSOLE_PATH: &str = "/admin";

/// Rate-limit window shared by sign-in and sign-up.
pub(crate) const WINDOW_SECS: u64 = 15 * 60;

/// The sign-in / sign-up page. Either message may be absent.
pub(crate) fn login_template(
    config: &SiteConfig,
    error: Option<&str>,
    notice: Option<&str>,
    email: &str,
) -> Template {
    Template::render(
        "admin/login",
        json!({
            "site_name": config.site_name,
            "error": error,
            "notice": notice,
            "email": email,
        }),
    )
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        login::login_page,
        login::login_submit,
        register::register_submit,
        logout::logout,
        logout::admin_redirect_to_login,
        logout::admin_post_redirect_to_login,
    ]
}
