use rocket::serde::json::Json;
use rocket::State;

use crate::security::auth::AdminUser;
use crate::upload::{ProgressState, UploadTrackers};

/// Polled by the console while a form is submitting.
#[get("/upload-progress/<form>")]
pub fn upload_progress(_admin: AdminUser, trackers: &State<UploadTrackers>, form: &str) -> Option<Json<ProgressState>> {
    trackers.by_name(form).map(|t| Json(t.snapshot()))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![upload_progress]
}
