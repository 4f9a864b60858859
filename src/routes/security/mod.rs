pub mod auth;

use rocket::http::Header;
use rocket::response::{self, Responder};
use rocket::Request;
use rocket_dyn_templates::Template;

/// Cache-Control of every console and sign-in page.
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Sets the no-cache headers on a single response.
pub fn no_store(resp: &mut rocket::Response<'_>) {
    resp.set_header(Header::new("Cache-Control", NO_STORE));
    resp.set_header(Header::new("Pragma", "no-cache"));
}

/// A console template that must never be served from a cache.
pub struct NoCacheTemplate(pub Template);

impl<'r> Responder<'r, 'static> for NoCacheTemplate {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let mut resp = self.0.respond_to(req)?;
        no_store(&mut resp);
        Ok(resp)
    }
}

/// Sign-in, sign-up and sign-out, mounted under `/admin`.
pub fn routes() -> Vec<rocket::Route> {
    auth::routes()
}
