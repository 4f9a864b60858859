#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;

use crate::blob::{object_url, BlobStore, StoredObject};
use crate::config::SiteConfig;
use crate::content::{self, BlobOutcome, ContentCtx, ContentError};
use crate::models::featured::FeaturedProduct;
use crate::models::gallery::GalleryPhoto;
use crate::models::post::PostForm;
use crate::store::sqlite::SqliteStore;
use crate::store::{Direction, Query, Store};
use crate::upload::{CredentialRefresh, ProgressAggregator, UploadFile};

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

const BASE: &str = "http://test.local";

/// Fresh in-memory store with migrations and seed applied. Shared cache so
/// every pooled connection sees the same data.
fn test_store() -> Arc<SqliteStore> {
    let id = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let uri = format!("file:pasticceria_{}?mode=memory&cache=shared", id);
    let pool = Pool::builder()
        .max_size(2)
        .build(SqliteConnectionManager::file(uri))
        .expect("Failed to create test pool");
    let store = SqliteStore::new(pool);
    store.run_migrations().expect("migrations failed");
    store.seed_defaults().expect("seed failed");
    // Keep retries fast.
    store.setting_set("blob_delete_retry_ms", "1").unwrap();
    Arc::new(store)
}

/// Blob store that records every call and fails on demand.
#[derive(Default)]
struct FakeBlobs {
    calls: Mutex<Vec<String>>,
    url_delete_failures: AtomicUsize,
    fail_puts: bool,
    fail_path_deletes: bool,
}

impl FakeBlobs {
    fn failing_url_deletes(n: usize) -> Self {
        FakeBlobs {
            url_delete_failures: AtomicUsize::new(n),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[rocket::async_trait]
impl BlobStore for FakeBlobs {
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        _content_type: &str,
        on_progress: &(dyn Fn(u64) + Send + Sync),
    ) -> Result<(), String> {
        self.record(format!("put:{}", path));
        if self.fail_puts {
            return Err("quota exceeded".to_string());
        }
        on_progress(data.len() as u64);
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, String> {
        Ok(object_url(BASE, path))
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), String> {
        self.record(format!("delete_url:{}", url));
        let left = self.url_delete_failures.load(Ordering::SeqCst);
        if left > 0 {
            self.url_delete_failures.store(left - 1, Ordering::SeqCst);
            return Err("network error".to_string());
        }
        Ok(())
    }

    async fn delete_by_path(&self, path: &str) -> Result<(), String> {
        self.record(format!("delete_path:{}", path));
        if self.fail_path_deletes {
            return Err("object locked".to_string());
        }
        Ok(())
    }

    async fn list(&self, _folder: &str) -> Result<Vec<String>, String> {
        Ok(Vec::new())
    }

    async fn get(&self, _path: &str) -> Result<Option<StoredObject>, String> {
        Ok(None)
    }
}

struct NoRefresh;

impl CredentialRefresh for NoRefresh {
    fn refresh(&self) -> Result<(), String> {
        Ok(())
    }
}

fn ctx<'a>(store: &'a dyn Store, blobs: &'a dyn BlobStore) -> ContentCtx<'a> {
    ContentCtx {
        store,
        blobs,
        refresher: &NoRefresh,
        tracker: None,
    }
}

fn jpeg(name: &str) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        data: vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3],
        content_type: Some("image/jpeg".to_string()),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
}

// ═══════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════

#[test]
fn paragraph_rendering_is_idempotent() {
    let paragraphs = [
        "Introduzione",
        "## Gli ingredienti",
        "1. Ricotta\n2. Zucchero\n3. Cannella",
        "- Cialda\n- Pistacchio",
        "Vieni a trovarci su **www.example.com** o leggi [la ricetta](https://example.com/r) <script>",
    ];
    let first = crate::render::content::render_paragraphs(&paragraphs);
    let second = crate::render::content::render_paragraphs(&paragraphs);
    assert_eq!(first, second);
    assert!(!first.contains("<script>"));
}

// ═══════════════════════════════════════════════════════════
// Upload progress
// ═══════════════════════════════════════════════════════════

#[test]
fn aggregate_progress_across_files() {
    let mut agg = ProgressAggregator::new(vec![100, 300, 600]);
    agg.record(0, 100);
    agg.record(1, 150);
    assert_eq!(agg.record(2, 0), 25);
    assert_eq!(agg.complete(2), 85);
}

// ═══════════════════════════════════════════════════════════
// Posts
// ═══════════════════════════════════════════════════════════

#[rocket::async_test]
async fn empty_title_is_rejected_before_any_backend_call() {
    let store = test_store();
    let blobs = FakeBlobs::default();
    let form = PostForm {
        title: "   ".to_string(),
        content: "Testo".to_string(),
        ..Default::default()
    };
    let err = content::posts::publish(&ctx(&*store, &blobs), &form, Some(jpeg("cover.jpg")), None, today())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));
    assert!(blobs.calls().is_empty());
    assert!(content::posts::list(&*store, 10).unwrap().is_empty());
}

#[rocket::async_test]
async fn editing_keeps_the_original_slug() {
    let store = test_store();
    let blobs = FakeBlobs::default();
    let c = ctx(&*store, &blobs);

    let created = content::posts::publish(
        &c,
        &PostForm {
            title: "Cannoli".to_string(),
            content: "Primo.\n\nSecondo.".to_string(),
            ..Default::default()
        },
        Some(jpeg("cover.jpg")),
        None,
        today(),
    )
    .await
    .unwrap();
    assert_eq!(created.slug, "cannoli");
    assert_eq!(created.message(), "Articolo pubblicato!");

    let updated = content::posts::publish(
        &c,
        &PostForm {
            editing: "cannoli".to_string(),
            title: "Cannoli siciliani".to_string(),
            date: "2024-11-20".to_string(),
            content: "Nuovo testo.".to_string(),
            ..Default::default()
        },
        None,
        None,
        today(),
    )
    .await
    .unwrap();
    assert_eq!(updated.slug, "cannoli");
    assert_eq!(updated.message(), "Articolo aggiornato!");

    let posts = content::posts::list(&*store, 10).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Cannoli siciliani");
    assert_eq!(posts[0].date, "2024-11-20");
    // The cover uploaded on create survives an edit without a new file.
    assert!(posts[0].image.as_deref().unwrap_or("").contains("blog-covers%2Fcannoli-"));
}

#[rocket::async_test]
async fn post_delete_needs_confirmation() {
    let store = test_store();
    let blobs = FakeBlobs::default();
    let c = ctx(&*store, &blobs);
    content::posts::publish(
        &c,
        &PostForm {
            title: "Cassata".to_string(),
            ..Default::default()
        },
        None,
        None,
        today(),
    )
    .await
    .unwrap();

    assert!(content::posts::delete(&c, "cassata", false).await.is_err());
    assert!(content::posts::get(&*store, "cassata").unwrap().is_some());

    let outcome = content::posts::delete(&c, "cassata", true).await.unwrap();
    assert_eq!(outcome, BlobOutcome::NoBlob);
    assert!(content::posts::get(&*store, "cassata").unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════
// Gallery
// ═══════════════════════════════════════════════════════════

#[rocket::async_test]
async fn gallery_upload_writes_one_record_per_file() {
    let store = test_store();
    let blobs = FakeBlobs::default();
    let report = content::gallery::upload_photos(
        &ctx(&*store, &blobs),
        vec![jpeg("torta 1.jpg"), jpeg("torta-2.jpg")],
        "",
    )
    .await
    .unwrap();
    assert!(report.is_success());
    assert_eq!(report.summary(), "Completato: 2 / 2 file");

    let photos = content::gallery::list(&*store, 10).unwrap();
    assert_eq!(photos.len(), 2);
    assert!(photos.iter().all(|p| p.alt_text() == "Foto galleria"));
    assert!(photos.iter().all(|p| p.path.starts_with("gallery/")));
}

#[rocket::async_test]
async fn failed_puts_leave_no_records() {
    let store = test_store();
    let blobs = FakeBlobs {
        fail_puts: true,
        ..Default::default()
    };
    let report = content::gallery::upload_photos(&ctx(&*store, &blobs), vec![jpeg("a.jpg")], "Torta")
        .await
        .unwrap();
    assert!(!report.is_success());
    assert!(report.summary().starts_with("Errore:"));
    assert!(content::gallery::list(&*store, 10).unwrap().is_empty());
}

#[rocket::async_test]
async fn gallery_delete_falls_back_to_path_from_url() {
    let store = test_store();
    let blobs = FakeBlobs::failing_url_deletes(2);
    let url = object_url(BASE, "gallery/1700-torta.jpg");
    let id = store
        .doc_add(
            crate::models::gallery::COLLECTION,
            &GalleryPhoto::new_fields(&url, "Torta", "", "2024-12-01T10:00:00.000Z"),
        )
        .unwrap();

    let outcome = content::gallery::delete(&ctx(&*store, &blobs), &id, true).await.unwrap();
    assert_eq!(outcome, BlobOutcome::Removed);
    assert_eq!(
        blobs.calls(),
        vec![
            format!("delete_url:{}", url),
            format!("delete_url:{}", url),
            "delete_path:gallery/1700-torta.jpg".to_string(),
        ]
    );
    assert!(store.doc_get(crate::models::gallery::COLLECTION, &id).unwrap().is_none());
}

#[rocket::async_test]
async fn gallery_delete_drops_record_when_blob_survives() {
    let store = test_store();
    let blobs = FakeBlobs {
        url_delete_failures: AtomicUsize::new(2),
        fail_path_deletes: true,
        ..Default::default()
    };
    let url = object_url(BASE, "gallery/1700-torta.jpg");
    let id = store
        .doc_add(
            crate::models::gallery::COLLECTION,
            &GalleryPhoto::new_fields(&url, "Torta", "gallery/1700-torta.jpg", "2024-12-01T10:00:00.000Z"),
        )
        .unwrap();

    let outcome = content::gallery::delete(&ctx(&*store, &blobs), &id, true).await.unwrap();
    assert!(matches!(outcome, BlobOutcome::Kept(_)));
    assert_eq!(
        blobs.calls(),
        vec![
            format!("delete_url:{}", url),
            format!("delete_url:{}", url),
            "delete_path:gallery/1700-torta.jpg".to_string(),
        ]
    );
    assert!(store.doc_get(crate::models::gallery::COLLECTION, &id).unwrap().is_none());
}

#[rocket::async_test]
async fn same_named_files_in_one_batch_get_distinct_keys() {
    let store = test_store();
    let blobs = FakeBlobs::default();
    let report = content::gallery::upload_photos(
        &ctx(&*store, &blobs),
        vec![jpeg("torta.jpg"), jpeg("torta.jpg")],
        "Torta",
    )
    .await
    .unwrap();
    assert!(report.is_success());

    let mut paths: Vec<String> = report.uploaded.iter().map(|u| u.path.clone()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 2);

    let mut puts: Vec<String> = blobs.calls().into_iter().filter(|c| c.starts_with("put:")).collect();
    puts.sort();
    puts.dedup();
    assert_eq!(puts.len(), 2);

    let photos = content::gallery::list(&*store, 10).unwrap();
    assert_eq!(photos.len(), 2);
    assert_ne!(photos[0].path, photos[1].path);
}

// ═══════════════════════════════════════════════════════════
// Featured products
// ═══════════════════════════════════════════════════════════

fn seed_featured(store: &dyn Store, ids: &[&str]) {
    for (i, id) in ids.iter().enumerate() {
        store
            .doc_set(
                crate::models::featured::COLLECTION,
                id,
                &FeaturedProduct::new_fields(id, "", &object_url(BASE, &format!("featured/{}.jpg", id)), "", (i + 1) as i64, "t"),
                false,
            )
            .unwrap();
    }
}

#[test]
fn reorder_persists_visual_order() {
    let store = test_store();
    seed_featured(&*store, &["A", "B", "C"]);

    let order = crate::routes::admin::featured::parse_ids("B, A,C");
    content::featured::reorder(&*store, &order).unwrap();

    let list = content::featured::list(&*store, 10).unwrap();
    let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A", "C"]);
    let orders: Vec<i64> = list.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[test]
fn reorder_with_a_deleted_product_writes_nothing() {
    let store = test_store();
    seed_featured(&*store, &["A", "B"]);

    let order = crate::routes::admin::featured::parse_ids("B,A,ghost");
    let err = content::featured::reorder(&*store, &order).unwrap_err();
    assert_eq!(err, ContentError::Validation("Prodotto non trovato".to_string()));

    let list = content::featured::list(&*store, 10).unwrap();
    let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
}

#[test]
fn inline_save_of_a_deleted_product_creates_nothing() {
    let store = test_store();
    let err = content::featured::save_inline(
        &*store,
        "ghost",
        &content::featured::FeaturedInput {
            name: "Cannolo".to_string(),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));
    assert!(content::featured::list(&*store, 10).unwrap().is_empty());
}

#[test]
fn inline_save_keeps_the_image() {
    let store = test_store();
    seed_featured(&*store, &["A"]);
    content::featured::save_inline(
        &*store,
        "A",
        &content::featured::FeaturedInput {
            name: "Cannolo".to_string(),
            text: "Con ricotta".to_string(),
            order: "4".to_string(),
        },
    )
    .unwrap();
    let list = content::featured::list(&*store, 10).unwrap();
    assert_eq!(list[0].name, "Cannolo");
    assert_eq!(list[0].order, 4);
    assert!(list[0].image.ends_with("featured%2FA.jpg?alt=media"));
}

// ═══════════════════════════════════════════════════════════
// Opening hours
// ═══════════════════════════════════════════════════════════

#[test]
fn monday_hours_normalize_to_24h() {
    let entry = crate::hours::parse_description("Monday: 7:00 AM – 8:00 PM").unwrap();
    assert_eq!(entry.day, chrono::Weekday::Mon);
    match &entry.hours {
        crate::hours::DayHours::Range { opens, closes } => {
            assert_eq!(crate::hours::normalize_time(opens).as_deref(), Some("07:00"));
            assert_eq!(crate::hours::normalize_time(closes).as_deref(), Some("20:00"));
        }
        other => panic!("expected a range, got {:?}", other),
    }

    let now = chrono_tz::Europe::Rome.with_ymd_and_hms(2024, 12, 2, 9, 0, 0).unwrap();
    let hours = crate::hours::derive(&["Monday: 7:00 AM – 8:00 PM".to_string()], &[], &now).unwrap();
    let spec = &hours.specification[0];
    assert_eq!(spec["opens"], "07:00");
    assert_eq!(spec["closes"], "20:00");
    assert!(hours.rows.iter().any(|r| r.today && !r.closed));
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn refresher_extends_live_sessions() {
    let store = test_store();
    let hash = bcrypt::hash("segreta1", 4).unwrap();
    let uid = store.user_create("owner@example.com", &hash).unwrap();
    let sid = crate::security::auth::create_session(&*store, uid).unwrap();
    let refresher = crate::security::auth::SessionRefresher {
        store: &*store,
        session_id: &sid,
    };
    refresher.refresh().unwrap();
    assert_eq!(
        store.session_get_user(&sid).map(|u| u.email),
        Some("owner@example.com".to_string())
    );
}

// ═══════════════════════════════════════════════════════════
// HTTP surface
// ═══════════════════════════════════════════════════════════

fn temp_dir(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("pasticceria-{}-{}", name, uuid::Uuid::new_v4()))
        .to_string_lossy()
        .to_string()
}

fn test_config(storage_root: &str) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.storage.root = storage_root.to_string();
    config.storage.public_base = "http://localhost:8000".to_string();
    config
}

struct TestApp {
    client: Client,
    store: Arc<SqliteStore>,
}

fn app_with(config: SiteConfig) -> TestApp {
    let store = test_store();
    let blobs: Arc<dyn BlobStore> = Arc::new(crate::blob::local::LocalBlobStore::new(
        &config.storage.root,
        &config.storage.public_base,
    ));
    let dyn_store: Arc<dyn Store> = store.clone();
    let client = Client::tracked(crate::build(config, dyn_store, blobs)).expect("valid rocket instance");
    TestApp { client, store }
}

fn app() -> TestApp {
    app_with(test_config(&temp_dir("storage")))
}

fn add_user(store: &dyn Store, email: &str, password: &str) {
    let hash = bcrypt::hash(password, 4).unwrap();
    store.user_create(email, &hash).unwrap();
}

fn sign_in(client: &Client, email: &str, password: &str) -> Status {
    let body = format!(
        "email={}&password={}",
        email.replace('@', "%40"),
        password
    );
    client
        .post("/admin/login")
        .header(ContentType::Form)
        .body(body)
        .dispatch()
        .status()
}

#[test]
fn home_page_renders() {
    let app = app();
    let resp = app.client.get("/").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("AD Sferruzza Pasticceria"));
    assert!(body.contains("application/ld+json"));
}

#[test]
fn blog_falls_back_to_the_snapshot() {
    let app = app();
    let body = app.client.get("/blog").dispatch().into_string().unwrap();
    assert!(body.contains("I cannoli della tradizione"));

    // Unknown slug shows the newest post.
    let body = app
        .client
        .get("/blog-post?slug=non-esiste")
        .dispatch()
        .into_string()
        .unwrap();
    assert!(body.contains("I cannoli della tradizione"));
}

#[test]
fn disabled_blog_hides_posts() {
    let mut config = test_config(&temp_dir("storage"));
    config.blogs_enabled = false;
    let app = app_with(config);
    let body = app.client.get("/blog").dispatch().into_string().unwrap();
    assert!(!body.contains("I cannoli della tradizione"));
}

#[test]
fn feed_is_xml() {
    let app = app();
    let resp = app.client.get("/feed").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.content_type(), Some(ContentType::XML));
    assert!(resp.into_string().unwrap().contains("<rss"));
}

#[test]
fn contact_success_flag_becomes_a_message() {
    let app = app();
    let resp = app.client.get("/contatti?success=true").dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(resp.headers().get_one("Location"), Some("/contatti"));

    let body = app.client.get("/contatti").dispatch().into_string().unwrap();
    assert!(body.contains(crate::routes::public::CONTACT_SENT));
}

#[test]
fn contact_form_is_stored() {
    let app = app();
    let resp = app
        .client
        .post("/contatti")
        .header(ContentType::Form)
        .body("name=Anna&email=anna%40example.com&phone_code=%2B39&phone_number=333+1234&message=Una+torta")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(resp.headers().get_one("Location"), Some("/contatti?success=true"));

    let docs = app
        .store
        .doc_query(
            crate::models::message::COLLECTION,
            &Query::new("receivedAt", Direction::Desc, 10),
        )
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].data["phone"], "+39 333 1234");
}

#[test]
fn incomplete_contact_form_is_refused() {
    let app = app();
    let resp = app
        .client
        .post("/contatti")
        .header(ContentType::Form)
        .body("name=Anna&email=&message=")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(resp.headers().get_one("Location"), Some("/contatti"));
    let body = app.client.get("/contatti").dispatch().into_string().unwrap();
    assert!(body.contains(crate::routes::public::CONTACT_INCOMPLETE));
}

#[test]
fn stored_objects_are_served() {
    let root = temp_dir("objects");
    std::fs::create_dir_all(format!("{}/gallery", root)).unwrap();
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    std::fs::write(format!("{}/gallery/a.png", root), png).unwrap();
    let app = app_with(test_config(&root));

    let resp = app.client.get("/o/gallery%2Fa.png?alt=media").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.content_type(), Some(ContentType::PNG));
    assert_eq!(resp.headers().get_one("Cache-Control"), Some(crate::blob::CACHE_CONTROL));
    assert_eq!(resp.into_bytes().unwrap(), png.to_vec());

    let resp = app.client.get("/o/gallery%2Fmissing.png").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn console_requires_sign_in() {
    let app = app();
    let resp = app.client.get("/admin").dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(resp.headers().get_one("Location"), Some("/admin/login"));

    let resp = app.client.get("/admin/login").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.headers().get_one("Cache-Control"), Some(crate::routes::security::NO_STORE));
}

#[test]
fn sign_in_opens_the_console_and_logout_closes_it() {
    let app = app();
    add_user(&*app.store, "owner@example.com", "segreta1");

    assert_eq!(sign_in(&app.client, "owner@example.com", "segreta1"), Status::SeeOther);
    let resp = app.client.get("/admin").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("owner@example.com"));
    assert!(body.contains("Pubblica"));

    app.client.get("/admin/logout").dispatch();
    let resp = app.client.get("/admin").dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
}

#[test]
fn wrong_password_stays_on_the_login_page() {
    let app = app();
    add_user(&*app.store, "owner@example.com", "segreta1");
    let resp = app
        .client
        .post("/admin/login")
        .header(ContentType::Form)
        .body("email=owner%40example.com&password=sbagliata")
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert!(resp.into_string().unwrap().contains("Accesso fallito: credenziali non valide"));
}

#[test]
fn allow_list_refuses_other_users() {
    let mut config = test_config(&temp_dir("storage"));
    config.admin.email_allowlist = vec!["owner@example.com".to_string()];
    let app = app_with(config);
    add_user(&*app.store, "intruder@example.com", "segreta1");

    assert_eq!(sign_in(&app.client, "intruder@example.com", "segreta1"), Status::Ok);
    let resp = app.client.get("/admin").dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
}

#[test]
fn console_lists_featured_with_move_controls() {
    let app = app();
    add_user(&*app.store, "owner@example.com", "segreta1");
    seed_featured(&*app.store, &["A", "B"]);
    sign_in(&app.client, "owner@example.com", "segreta1");

    let body = app.client.get("/admin").dispatch().into_string().unwrap();
    assert!(body.contains("value=\"B,A\""));

    let resp = app
        .client
        .post("/admin/featured/reorder")
        .header(ContentType::Form)
        .body("ids=B%2CA")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    let list = content::featured::list(&*app.store, 10).unwrap();
    assert_eq!(list[0].id, "B");

    let body = app.client.get("/admin").dispatch().into_string().unwrap();
    assert!(body.contains("Ordine aggiornato."));
}

#[test]
fn delete_shows_a_confirmation_first() {
    let app = app();
    add_user(&*app.store, "owner@example.com", "segreta1");
    seed_featured(&*app.store, &["A"]);
    sign_in(&app.client, "owner@example.com", "segreta1");

    let body = app
        .client
        .get("/admin?confirm=featured:A")
        .dispatch()
        .into_string()
        .unwrap();
    assert!(body.contains("Conferma eliminazione"));

    // Without confirm=yes nothing is removed.
    app.client
        .post("/admin/featured/delete")
        .header(ContentType::Form)
        .body("id=A")
        .dispatch();
    assert_eq!(content::featured::list(&*app.store, 10).unwrap().len(), 1);

    app.client
        .post("/admin/featured/delete")
        .header(ContentType::Form)
        .body("id=A&confirm=yes")
        .dispatch();
    assert!(content::featured::list(&*app.store, 10).unwrap().is_empty());
}

#[test]
fn upload_progress_is_idle_before_any_upload() {
    let app = app();
    add_user(&*app.store, "owner@example.com", "segreta1");
    sign_in(&app.client, "owner@example.com", "segreta1");

    let resp = app.client.get("/admin/api/upload-progress/gallery").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let state: serde_json::Value = resp.into_json().unwrap();
    assert_eq!(state["visible"], false);

    let resp = app.client.get("/admin/api/upload-progress/unknown").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn closed_console_without_backend() {
    let mut config = test_config(&temp_dir("storage"));
    config.backend_enabled = false;
    let app = app_with(config);
    let resp = app.client.get("/admin").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert!(resp
        .into_string()
        .unwrap()
        .contains("Area riservata non disponibile"));
}
