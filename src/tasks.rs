use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::rate_limit::RateLimiter;
use crate::store::Store;

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let Some(store) = rocket.state::<Arc<dyn Store>>().cloned() else {
            log::warn!("[task] No store managed, background tasks not started");
            return;
        };
        let limiter = rocket.state::<Arc<RateLimiter>>().cloned();

        tokio::spawn(async move {
            loop {
                let interval = get_interval(&*store, "task_session_cleanup_interval", 30);
                tokio::time::sleep(Duration::from_secs(interval * 60)).await;
                run_session_cleanup(&*store);
                if let Some(l) = &limiter {
                    l.cleanup(Duration::from_secs(15 * 60));
                }
            }
        });

        log::info!("[task] Background tasks started");
    }
}

/// One pass of the expired-session sweep. Returns the number removed.
pub fn run_session_cleanup(store: &dyn Store) -> usize {
    match store.session_cleanup_expired() {
        Ok(count) => {
            if count > 0 {
                log::info!("[task] Cleaned up {} expired sessions", count);
            }
            count
        }
        Err(e) => {
            log::error!("[task] Session cleanup failed: {}", e);
            0
        }
    }
}

fn get_interval(store: &dyn Store, key: &str, default: u64) -> u64 {
    store
        .setting_get_or(key, &default.to_string())
        .parse::<u64>()
        .unwrap_or(default)
        .max(1)
}
