use serde::Deserialize;
use std::path::Path;

/// Default location of the site configuration file.
pub const CONFIG_PATH: &str = "website/site.toml";

/// Site-wide configuration, read once at startup from `website/site.toml`
/// and then overridden by `PASTICCERIA_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site_name: String,
    pub site_url: String,
    pub timezone: String,
    /// When false the site behaves as if no backend were configured:
    /// public loaders use snapshots only and the admin console is closed.
    pub backend_enabled: bool,
    pub blogs_enabled: bool,
    pub store: StoreConfig,
    pub storage: StorageConfig,
    pub snapshots: SnapshotConfig,
    pub admin: AdminConfig,
    pub instagram_profile: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// "sqlite" or "mongodb"
    pub backend: String,
    pub sqlite_path: String,
    pub mongo_uri: String,
    pub mongo_db: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: String,
    /// Base URL the bucket is reachable at; object URLs are
    /// `{public_base}/o/{encoded path}?alt=media`.
    pub public_base: String,
}

/// Each entry is either a local file path or an http(s) URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub posts: String,
    pub reviews: String,
    pub instagram: String,
    pub phone_codes: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Empty means every signed-in user may use the console.
    pub email_allowlist: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            site_name: "AD Sferruzza Pasticceria".to_string(),
            site_url: "http://localhost:8000".to_string(),
            timezone: "Europe/Rome".to_string(),
            backend_enabled: true,
            blogs_enabled: true,
            store: StoreConfig::default(),
            storage: StorageConfig::default(),
            snapshots: SnapshotConfig::default(),
            admin: AdminConfig::default(),
            instagram_profile: "https://www.instagram.com/ad_sferruzza_pasticceria/".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: "sqlite".to_string(),
            sqlite_path: "website/db/pasticceria.db".to_string(),
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_db: "pasticceria".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            root: "website/storage".to_string(),
            public_base: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            posts: "website/static/blog/posts.json".to_string(),
            reviews: "website/static/data/reviews.json".to_string(),
            instagram: "website/static/data/instagram.json".to_string(),
            phone_codes: "website/static/data/phone-codes.json".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load the config file if present, then apply environment overrides.
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: &str) -> Result<Self, String> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
            Self::from_toml(&raw)?
        } else {
            log::info!("No config at {}, using defaults", path);
            SiteConfig::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| format!("Invalid site config: {}", e))
    }

    /// Apply `PASTICCERIA_*` overrides. The lookup is injected so tests
    /// don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |v: String| v == "true" || v == "1";

        if let Some(v) = lookup("PASTICCERIA_SITE_URL") {
            self.site_url = v;
        }
        if let Some(v) = lookup("PASTICCERIA_TIMEZONE") {
            self.timezone = v;
        }
        if let Some(v) = lookup("PASTICCERIA_BACKEND_ENABLED") {
            self.backend_enabled = flag(v);
        }
        if let Some(v) = lookup("PASTICCERIA_BLOGS_ENABLED") {
            self.blogs_enabled = flag(v);
        }
        if let Some(v) = lookup("PASTICCERIA_STORE") {
            self.store.backend = v;
        }
        if let Some(v) = lookup("PASTICCERIA_SQLITE_PATH") {
            self.store.sqlite_path = v;
        }
        if let Some(v) = lookup("PASTICCERIA_MONGO_URI") {
            self.store.mongo_uri = v;
        }
        if let Some(v) = lookup("PASTICCERIA_MONGO_DB") {
            self.store.mongo_db = v;
        }
        if let Some(v) = lookup("PASTICCERIA_STORAGE_ROOT") {
            self.storage.root = v;
        }
        if let Some(v) = lookup("PASTICCERIA_STORAGE_PUBLIC_BASE") {
            self.storage.public_base = v;
        }
        if let Some(v) = lookup("PASTICCERIA_ADMIN_ALLOWLIST") {
            self.admin.email_allowlist = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    /// Business time zone, falling back to Europe/Rome on a bad name.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .unwrap_or(chrono_tz::Europe::Rome)
    }

    /// Allow-list check. Comparison ignores ASCII case.
    pub fn is_admin_allowed(&self, email: &str) -> bool {
        self.admin.email_allowlist.is_empty()
            || self
                .admin
                .email_allowlist
                .iter()
                .any(|a| a.eq_ignore_ascii_case(email.trim()))
    }
}
