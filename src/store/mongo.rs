use std::collections::HashMap;

use mongodb::bson::{doc, Bson, Document as BsonDocument};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions, UpdateOptions};
use mongodb::sync::{Client, Database};
use mongodb::IndexModel;

use crate::models::user::User;

use super::{generate_doc_id, missing_doc, sanitize_field, Direction, Document, Fields, Query, Store};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// MongoDB-backed implementation of the Store trait.
/// Content collections map one-to-one onto Mongo collections keyed by `_id`.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Create a new MongoStore by connecting to the given URI and database name.
    pub fn new(uri: &str, db_name: &str) -> Result<Self, String> {
        let client_options = ClientOptions::parse(uri).map_err(|e| e.to_string())?;
        let client = Client::with_options(client_options).map_err(|e| e.to_string())?;
        let db = client.database(db_name);
        Ok(Self { client, db })
    }

    /// Test connectivity by pinging the server.
    pub fn test_connection(&self) -> Result<(), String> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .map_err(|e| format!("MongoDB connection test failed: {}", e))?;
        Ok(())
    }

    // ── Helper: get next auto-increment ID for a collection ──
    fn next_id(&self, collection_name: &str) -> Result<i64, String> {
        let counters = self.db.collection::<BsonDocument>("_counters");
        let filter = doc! { "_id": collection_name };
        let update = doc! { "$inc": { "seq": 1_i64 } };
        let opts = mongodb::options::FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(mongodb::options::ReturnDocument::After)
            .build();
        let result = counters
            .find_one_and_update(filter, update, opts)
            .map_err(|e| e.to_string())?;
        match result {
            Some(d) => d
                .get_i64("seq")
                .map_err(|e| format!("Failed to get seq: {}", e)),
            None => Err("Failed to generate ID".to_string()),
        }
    }

    fn now() -> String {
        chrono::Utc::now().naive_utc().format(TS_FORMAT).to_string()
    }
}

fn fields_to_bson(fields: &Fields) -> Result<BsonDocument, String> {
    let mut out = mongodb::bson::to_document(fields).map_err(|e| e.to_string())?;
    // `_id` is the document key and is never part of the field map.
    out.remove("_id");
    Ok(out)
}

fn bson_to_document(mut raw: BsonDocument) -> Result<Document, String> {
    let id = match raw.remove("_id") {
        Some(Bson::String(s)) => s,
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(other) => other.to_string(),
        None => return Err("Document without _id".to_string()),
    };
    match Bson::Document(raw).into_relaxed_extjson() {
        serde_json::Value::Object(data) => Ok(Document { id, data }),
        _ => Err("Stored document is not an object".to_string()),
    }
}

fn doc_to_user(d: &BsonDocument) -> Option<User> {
    Some(User {
        id: d.get_i64("id").ok()?,
        email: d.get_str("email").ok()?.to_string(),
        password_hash: d.get_str("password_hash").ok()?.to_string(),
        created_at: d.get_str("created_at").unwrap_or("").to_string(),
        last_login_at: d.get_str("last_login_at").ok().map(|s| s.to_string()),
    })
}

impl Store for MongoStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), String> {
        let unique = |keys: BsonDocument| {
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };

        self.db
            .collection::<BsonDocument>("settings")
            .create_index(unique(doc! { "key": 1 }), None)
            .map_err(|e| e.to_string())?;
        self.db
            .collection::<BsonDocument>("users")
            .create_index(unique(doc! { "email": 1 }), None)
            .map_err(|e| e.to_string())?;
        self.db
            .collection::<BsonDocument>("sessions")
            .create_index(unique(doc! { "token": 1 }), None)
            .map_err(|e| e.to_string())?;

        // Listing indexes for the content collections
        for (coll, field, dir) in [("posts", "date", -1), ("gallery", "uploadedAt", -1), ("featured", "order", 1)] {
            self.db
                .collection::<BsonDocument>(coll)
                .create_index(IndexModel::builder().keys(doc! { field: dir }).build(), None)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn seed_defaults(&self) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>("settings");
        for (key, value) in crate::db::DEFAULT_SETTINGS {
            let opts = UpdateOptions::builder().upsert(true).build();
            coll.update_one(
                doc! { "key": *key },
                doc! { "$setOnInsert": { "key": *key, "value": *value } },
                opts,
            )
            .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        let coll = self.db.collection::<BsonDocument>("settings");
        let d = coll.find_one(doc! { "key": key }, None).ok()??;
        d.get_str("value").ok().map(|s| s.to_string())
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>("settings");
        let opts = UpdateOptions::builder().upsert(true).build();
        coll.update_one(
            doc! { "key": key },
            doc! { "$set": { "key": key, "value": value } },
            opts,
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn setting_all(&self) -> HashMap<String, String> {
        let coll = self.db.collection::<BsonDocument>("settings");
        let mut map = HashMap::new();
        if let Ok(cursor) = coll.find(doc! {}, None) {
            for d in cursor.flatten() {
                if let (Ok(k), Ok(v)) = (d.get_str("key"), d.get_str("value")) {
                    map.insert(k.to_string(), v.to_string());
                }
            }
        }
        map
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_get_by_id(&self, id: i64) -> Option<User> {
        let coll = self.db.collection::<BsonDocument>("users");
        let d = coll.find_one(doc! { "id": id }, None).ok()??;
        doc_to_user(&d)
    }

    fn user_get_by_email(&self, email: &str) -> Option<User> {
        let coll = self.db.collection::<BsonDocument>("users");
        let d = coll
            .find_one(doc! { "email": email.trim().to_lowercase() }, None)
            .ok()??;
        doc_to_user(&d)
    }

    fn user_create(&self, email: &str, password_hash: &str) -> Result<i64, String> {
        let id = self.next_id("users")?;
        let coll = self.db.collection::<BsonDocument>("users");
        coll.insert_one(
            doc! {
                "id": id,
                "email": email.trim().to_lowercase(),
                "password_hash": password_hash,
                "created_at": Self::now(),
                "last_login_at": Bson::Null,
            },
            None,
        )
        .map_err(|e| e.to_string())?;
        Ok(id)
    }

    fn user_count(&self) -> i64 {
        let coll = self.db.collection::<BsonDocument>("users");
        coll.count_documents(doc! {}, None).unwrap_or(0) as i64
    }

    fn user_touch_last_login(&self, id: i64) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>("users");
        coll.update_one(
            doc! { "id": id },
            doc! { "$set": { "last_login_at": Self::now() } },
            None,
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_create(&self, user_id: i64, session_id: &str, expires_at: &str) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>("sessions");
        coll.insert_one(
            doc! {
                "token": session_id,
                "user_id": user_id,
                "created_at": Self::now(),
                "expires_at": expires_at,
            },
            None,
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_get_user(&self, session_id: &str) -> Option<User> {
        let coll = self.db.collection::<BsonDocument>("sessions");
        let d = coll
            .find_one(
                doc! { "token": session_id, "expires_at": { "$gt": Self::now() } },
                None,
            )
            .ok()??;
        let user_id = d.get_i64("user_id").ok()?;
        self.user_get_by_id(user_id)
    }

    fn session_refresh(&self, session_id: &str, expires_at: &str) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>("sessions");
        let res = coll
            .update_one(
                doc! { "token": session_id },
                doc! { "$set": { "expires_at": expires_at } },
                None,
            )
            .map_err(|e| e.to_string())?;
        if res.matched_count == 0 {
            return Err("Session not found".to_string());
        }
        Ok(())
    }

    fn session_delete(&self, session_id: &str) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>("sessions");
        coll.delete_one(doc! { "token": session_id }, None)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn session_cleanup_expired(&self) -> Result<usize, String> {
        let coll = self.db.collection::<BsonDocument>("sessions");
        let res = coll
            .delete_many(doc! { "expires_at": { "$lte": Self::now() } }, None)
            .map_err(|e| e.to_string())?;
        Ok(res.deleted_count as usize)
    }

    // ── Documents ───────────────────────────────────────────────────

    fn doc_get(&self, collection: &str, id: &str) -> Result<Option<Document>, String> {
        let coll = self.db.collection::<BsonDocument>(collection);
        match coll.find_one(doc! { "_id": id }, None).map_err(|e| e.to_string())? {
            Some(raw) => bson_to_document(raw).map(Some),
            None => Ok(None),
        }
    }

    fn doc_set(&self, collection: &str, id: &str, fields: &Fields, merge: bool) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>(collection);
        let body = fields_to_bson(fields)?;
        if merge {
            let opts = UpdateOptions::builder().upsert(true).build();
            coll.update_one(doc! { "_id": id }, doc! { "$set": body }, opts)
                .map_err(|e| e.to_string())?;
        } else {
            let opts = mongodb::options::ReplaceOptions::builder().upsert(true).build();
            coll.replace_one(doc! { "_id": id }, body, opts)
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn doc_add(&self, collection: &str, fields: &Fields) -> Result<String, String> {
        let coll = self.db.collection::<BsonDocument>(collection);
        let id = generate_doc_id();
        let mut body = fields_to_bson(fields)?;
        body.insert("_id", id.clone());
        coll.insert_one(body, None).map_err(|e| e.to_string())?;
        Ok(id)
    }

    fn doc_delete(&self, collection: &str, id: &str) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>(collection);
        coll.delete_one(doc! { "_id": id }, None)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn doc_query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, String> {
        let coll = self.db.collection::<BsonDocument>(collection);
        let dir = match query.direction {
            Direction::Asc => 1,
            Direction::Desc => -1,
        };
        let field = sanitize_field(&query.order_by);
        let opts = FindOptions::builder()
            .sort(doc! { field: dir, "_id": 1 })
            .limit(query.limit as i64)
            .build();
        let cursor = coll.find(doc! {}, opts).map_err(|e| e.to_string())?;
        let mut docs = Vec::new();
        for raw in cursor {
            docs.push(bson_to_document(raw.map_err(|e| e.to_string())?)?);
        }
        Ok(docs)
    }

    fn doc_batch_merge(&self, collection: &str, writes: &[(String, Fields)]) -> Result<(), String> {
        let coll = self.db.collection::<BsonDocument>(collection);
        let mut session = self.client.start_session(None).map_err(|e| e.to_string())?;
        session.start_transaction(None).map_err(|e| e.to_string())?;

        for (id, fields) in writes {
            let body = fields_to_bson(fields)?;
            match coll.update_one_with_session(doc! { "_id": id.as_str() }, doc! { "$set": body }, None, &mut session) {
                Ok(res) if res.matched_count == 0 => {
                    let _ = session.abort_transaction();
                    return Err(missing_doc(id));
                }
                Ok(_) => {}
                Err(e) => {
                    let _ = session.abort_transaction();
                    return Err(e.to_string());
                }
            }
        }

        session.commit_transaction().map_err(|e| e.to_string())
    }
}
