use crate::models::featured::{parse_order, FeaturedProduct, COLLECTION, FOLDER};
use crate::store::{is_missing_doc, Direction, Fields, Query, Store};
use crate::upload::{storage_key, upload_batch, PendingUpload, UploadFile};

use super::{delete_with_blob, now_millis, now_timestamp, validation, BlobOutcome, ContentCtx, ContentError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeaturedInput {
    pub name: String,
    pub text: String,
    pub order: String,
}

/// Add a product with its image. Name and image are required; the order
/// defaults to 1. Returns the new record id.
pub async fn add(
    ctx: &ContentCtx<'_>,
    input: &FeaturedInput,
    image: Option<UploadFile>,
) -> Result<String, ContentError> {
    let name = input.name.trim();
    let text = input.text.trim();
    if name.is_empty() {
        return Err(validation("Nome richiesto"));
    }
    let file = match image {
        Some(f) if !f.data.is_empty() => f,
        _ => return Err(validation("Immagine richiesta")),
    };
    let order = parse_order(&input.order);

    let path = storage_key(FOLDER, "", now_millis(), &file.name);
    let store = ctx.store;
    let report = upload_batch(
        ctx.blobs,
        ctx.refresher,
        ctx.tracker,
        vec![PendingUpload { file, path }],
        |up, url| {
            store.doc_add(
                COLLECTION,
                &FeaturedProduct::new_fields(name, text, url, &up.path, order, &now_timestamp()),
            )
        },
    )
    .await?;

    match report.uploaded.into_iter().next() {
        Some(item) if report.errors.is_empty() => Ok(item.record_id),
        _ => Err(ContentError::Backend(report.errors.join("; "))),
    }
}

/// Inline edit from the product list: merges name, text and order only.
pub fn save_inline(store: &dyn Store, id: &str, input: &FeaturedInput) -> Result<(), ContentError> {
    if id.trim().is_empty() {
        return Err(validation("Prodotto non trovato"));
    }
    let fields = FeaturedProduct::inline_fields(&input.name, &input.text, parse_order(&input.order));
    merge_existing(store, &[(id.trim().to_string(), fields)])
}

/// Persist a visual order: the i-th id gets `order = i + 1`, in one
/// all-or-nothing batch.
pub fn reorder(store: &dyn Store, ids: &[String]) -> Result<(), ContentError> {
    let ids: Vec<&str> = ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if ids.is_empty() {
        return Err(validation("Nessun prodotto da ordinare"));
    }
    let writes: Vec<(String, Fields)> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let mut f = Fields::new();
            f.insert("order".into(), ((i + 1) as i64).into());
            (id.to_string(), f)
        })
        .collect();
    merge_existing(store, &writes)
}

/// A product deleted elsewhere must not come back as an empty card.
fn merge_existing(store: &dyn Store, writes: &[(String, Fields)]) -> Result<(), ContentError> {
    store.doc_batch_merge(COLLECTION, writes).map_err(|e| {
        if is_missing_doc(&e) {
            validation("Prodotto non trovato")
        } else {
            ContentError::Backend(e)
        }
    })
}

/// Ascending by `order`, capped.
pub fn list(store: &dyn Store, cap: usize) -> Result<Vec<FeaturedProduct>, ContentError> {
    let docs = store.doc_query(COLLECTION, &Query::new("order", Direction::Asc, cap))?;
    Ok(docs
        .into_iter()
        .filter_map(|d| FeaturedProduct::from_document(d).ok())
        .collect())
}

pub async fn delete(ctx: &ContentCtx<'_>, id: &str, confirmed: bool) -> Result<BlobOutcome, ContentError> {
    if !confirmed {
        return Err(validation("Conferma richiesta"));
    }
    let doc = ctx
        .store
        .doc_get(COLLECTION, id)?
        .ok_or_else(|| validation("Prodotto non trovato"))?;
    let product = FeaturedProduct::from_document(doc)?;
    delete_with_blob(ctx.store, ctx.blobs, COLLECTION, id, &product.image, &product.path, true).await
}
