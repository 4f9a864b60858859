use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::config::SiteConfig;

/// Critical template files; the console cannot render without them.
const CRITICAL_TEMPLATES: &[&str] = &[
    "website/templates/admin/base.html.tera",
    "website/templates/admin/login.html.tera",
    "website/templates/admin/console.html.tera",
];

/// Directory checks for a given config. Returns (warnings, errors).
pub fn check(config: &SiteConfig) -> (u32, u32) {
    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    let db_dir = Path::new(&config.store.sqlite_path)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let mut required = vec![Path::new(&config.storage.root).to_path_buf()];
    if config.store.backend != "mongodb" && !db_dir.as_os_str().is_empty() {
        required.push(db_dir.clone());
    }
    for dir in &required {
        if !dir.exists() {
            match fs::create_dir_all(dir) {
                Ok(_) => info!("  Created directory: {}", dir.display()),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir.display(), e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !Path::new(file).exists() {
            error!("  MISSING critical template: {}", file);
            errors += 1;
        }
    }

    // ── 3. Storage root writable ───────────────────────
    let test_file = Path::new(&config.storage.root).join(".write_test");
    match fs::write(&test_file, "test") {
        Ok(_) => {
            let _ = fs::remove_file(&test_file);
        }
        Err(e) => {
            warn!("  Storage root not writable: {} (uploads will fail)", e);
            warnings += 1;
        }
    }

    // ── 4. Snapshots ───────────────────────────────────
    let snapshots = [
        &config.snapshots.posts,
        &config.snapshots.reviews,
        &config.snapshots.instagram,
        &config.snapshots.phone_codes,
    ];
    for source in snapshots {
        let remote = source.starts_with("http://") || source.starts_with("https://");
        if !remote && !Path::new(source).exists() {
            warn!("  Snapshot not found: {} (static fallback will be shown)", source);
            warnings += 1;
        }
    }

    (warnings, errors)
}

/// Run all boot checks before launch; exits on errors.
pub fn run(config: &SiteConfig) {
    info!("Boot check starting...");
    let (warnings, errors) = check(config);

    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }
    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}
