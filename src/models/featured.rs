use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::store::{Document, Fields};

pub const COLLECTION: &str = "featured";
pub const FOLDER: &str = "featured";

/// A product card shown on the home page. `order` is a sort key, not
/// a unique position.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedProduct {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_order", deserialize_with = "de_order")]
    pub order: i64,
    #[serde(default)]
    pub created_at: String,
}

fn default_order() -> i64 {
    1
}

fn de_order<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Number(n) => n.as_i64().unwrap_or(1),
        Value::String(s) => parse_order(&s),
        _ => 1,
    })
}

/// Parse an order field the way the console input does: blanks, junk
/// and zero all become 1.
pub fn parse_order(raw: &str) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(n) if n != 0 => n,
        _ => 1,
    }
}

impl FeaturedProduct {
    pub fn from_document(doc: Document) -> Result<Self, String> {
        serde_json::from_value(doc.into_value()).map_err(|e| e.to_string())
    }

    pub fn new_fields(name: &str, text: &str, image: &str, path: &str, order: i64, created_at: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("name".into(), name.into());
        f.insert("text".into(), text.into());
        f.insert("image".into(), image.into());
        f.insert("order".into(), order.into());
        f.insert("createdAt".into(), created_at.into());
        f.insert("path".into(), path.into());
        f
    }

    /// Fields touched by the inline save in the console.
    pub fn inline_fields(name: &str, text: &str, order: i64) -> Fields {
        let mut f = Fields::new();
        f.insert("name".into(), name.trim().into());
        f.insert("text".into(), text.trim().into());
        f.insert("order".into(), order.into());
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_parsing() {
        assert_eq!(parse_order("4"), 4);
        assert_eq!(parse_order(""), 1);
        assert_eq!(parse_order("abc"), 1);
        assert_eq!(parse_order("0"), 1);
    }

    #[test]
    fn order_from_string_or_missing() {
        let doc = Document {
            id: "f1".to_string(),
            data: json!({"name": "Cassata", "order": "3"}).as_object().cloned().unwrap(),
        };
        let p = FeaturedProduct::from_document(doc).unwrap();
        assert_eq!(p.id, "f1");
        assert_eq!(p.order, 3);

        let doc = Document {
            id: "f2".to_string(),
            data: json!({"name": "Cannolo"}).as_object().cloned().unwrap(),
        };
        assert_eq!(FeaturedProduct::from_document(doc).unwrap().order, 1);
    }

    #[test]
    fn inline_fields_only_touch_editable_columns() {
        let f = FeaturedProduct::inline_fields(" Cassata ", "€ 25", 2);
        assert_eq!(f.len(), 3);
        assert_eq!(f["name"], "Cassata");
        assert!(!f.contains_key("image"));
    }
}
