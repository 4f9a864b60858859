#[macro_use]
extern crate rocket;

use std::sync::Arc;
use std::time::Duration;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{FileServer, Options};
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod blob;
mod boot;
mod config;
mod content;
mod db;
mod hours;
mod models;
mod rate_limit;
mod render;
mod reviews;
mod routes;
mod rss;
mod security;
mod seo;
mod site;
mod snapshot;
mod store;
mod tasks;
mod upload;

#[cfg(test)]
mod tests;

use blob::local::LocalBlobStore;
use blob::BlobStore;
use config::SiteConfig;
use rate_limit::RateLimiter;
use store::mongo::MongoStore;
use store::sqlite::SqliteStore;
use store::Store;
use upload::UploadTrackers;

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        if req.uri().path().starts_with("/admin") {
            routes::security::no_store(res);
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Pagina non trovata.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Errore interno del server.</p><a href='/'>← Home</a></body></html>".to_string())
}

/// Open the configured document store, migrate and seed it.
pub fn open_store(config: &SiteConfig) -> Result<Arc<dyn Store>, String> {
    let store: Arc<dyn Store> = match config.store.backend.as_str() {
        "mongodb" => {
            let mongo = MongoStore::new(&config.store.mongo_uri, &config.store.mongo_db)?;
            mongo.test_connection()?;
            Arc::new(mongo)
        }
        _ => Arc::new(SqliteStore::new_at(&config.store.sqlite_path)?),
    };
    store.run_migrations()?;
    store.seed_defaults()?;
    Ok(store)
}

/// Assemble the application around already-built backends. Tests use
/// this with in-memory stores.
pub fn build(config: SiteConfig, store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>) -> Rocket<Build> {
    let reset_ms = store.setting_get_i64("upload_progress_reset_ms");
    let reset_after = Duration::from_millis(if reset_ms > 0 { reset_ms as u64 } else { 800 });
    let backend_enabled = config.backend_enabled;

    let figment = rocket::Config::figment().merge(("template_dir", "website/templates"));
    let rocket = rocket::custom(figment)
        .manage(store)
        .manage(blobs)
        .manage(UploadTrackers::new(reset_after))
        .manage(Arc::new(RateLimiter::new()))
        .attach(Template::fairing())
        .attach(NoCacheAdmin)
        .mount("/static", FileServer::new("website/static", Options::Index | Options::Missing))
        .mount("/", routes::public::routes())
        .register("/", catchers![not_found, server_error]);

    let rocket = if backend_enabled {
        rocket
            .attach(tasks::BackgroundTasks)
            .mount("/admin", routes::admin::routes())
            .mount("/admin", routes::security::routes())
            .mount("/admin/api", routes::admin::api::routes())
    } else {
        log::info!("Backend disabled: admin console closed");
        rocket.mount("/admin", routes::admin::closed_routes())
    };
    rocket.manage(config)
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let config = match SiteConfig::load(config::CONFIG_PATH) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Boot check: verify/create directories, validate critical files
    boot::run(&config);

    let store = open_store(&config).expect("Failed to initialize document store");
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&config.storage.root, &config.storage.public_base));

    log::info!(
        "{} at {} (store: {}, blogs: {})",
        config.site_name,
        config.site_url,
        config.store.backend,
        config.blogs_enabled
    );
    build(config, store, blobs)
}
