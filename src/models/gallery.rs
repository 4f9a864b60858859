use serde::{Deserialize, Serialize};

use crate::store::{Document, Fields};

pub const COLLECTION: &str = "gallery";
pub const FOLDER: &str = "gallery";
pub const DEFAULT_ALT: &str = "Foto galleria";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPhoto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: String,
    /// Blob path; authoritative target when deleting.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub uploaded_at: String,
}

impl GalleryPhoto {
    pub fn from_document(doc: Document) -> Result<Self, String> {
        serde_json::from_value(doc.into_value()).map_err(|e| e.to_string())
    }

    /// Record fields for a freshly uploaded photo. A blank alt text falls
    /// back to the generic label.
    pub fn new_fields(url: &str, alt: &str, path: &str, uploaded_at: &str) -> Fields {
        let alt = alt.trim();
        let mut f = Fields::new();
        f.insert("url".into(), url.into());
        f.insert(
            "alt".into(),
            if alt.is_empty() { DEFAULT_ALT } else { alt }.into(),
        );
        f.insert("path".into(), path.into());
        f.insert("uploadedAt".into(), uploaded_at.into());
        f
    }

    pub fn alt_text(&self) -> &str {
        if self.alt.trim().is_empty() {
            DEFAULT_ALT
        } else {
            &self.alt
        }
    }

    /// Last path segment, shown under the thumbnail in the console.
    pub fn file_label(&self) -> &str {
        match self.path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "foto",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_alt_uses_default() {
        let f = GalleryPhoto::new_fields("u", "   ", "gallery/x.jpg", "2024-01-01T00:00:00.000Z");
        assert_eq!(f["alt"], DEFAULT_ALT);
        let f = GalleryPhoto::new_fields("u", " Cannoli ", "gallery/x.jpg", "t");
        assert_eq!(f["alt"], "Cannoli");
    }

    #[test]
    fn file_label_is_last_segment() {
        let p = GalleryPhoto {
            path: "gallery/1700-torta.jpg".to_string(),
            ..Default::default()
        };
        assert_eq!(p.file_label(), "1700-torta.jpg");
        assert_eq!(GalleryPhoto::default().file_label(), "foto");
    }
}
