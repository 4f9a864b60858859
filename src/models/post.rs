use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::store::{Document, Fields};

pub const COLLECTION: &str = "posts";

/// A blog article. The slug is the document key and never changes once
/// the post exists.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_read_time", deserialize_with = "de_read_time")]
    pub read_time: u32,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default, deserialize_with = "de_paragraphs")]
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// Form payload of the post editor. `editing` carries the slug of the post
/// being edited, empty in create mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostForm {
    pub editing: String,
    pub title: String,
    pub date: String,
    pub read_time: String,
    pub excerpt: String,
    pub content: String,
    pub seo_title: String,
    pub seo_description: String,
}

fn default_read_time() -> u32 {
    3
}

// Snapshots written by hand carry readTime as either a number or a string.
fn de_read_time<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Number(n) => n.as_u64().map(|n| n as u32).unwrap_or(3),
        Value::String(s) => s.trim().parse().unwrap_or(3),
        _ => 3,
    }
    .max(1))
}

// Content is normally an array of paragraphs; a plain string is one paragraph.
fn de_paragraphs<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|i| match i {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

impl Post {
    /// Build from a stored document; the document key wins over any
    /// `slug` field inside the body.
    pub fn from_document(doc: Document) -> Result<Self, String> {
        let mut post: Post =
            serde_json::from_value(Value::Object(doc.data)).map_err(|e| e.to_string())?;
        post.slug = doc.id;
        Ok(post)
    }

    /// Field map written on publish. Optional fields are only present when
    /// set, so a merge write leaves previously stored values alone.
    pub fn to_fields(&self) -> Fields {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Fields::new(),
        }
    }

    /// Title shown in `<title>` and social tags.
    pub fn display_title(&self) -> &str {
        match self.seo_title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.title,
        }
    }

    pub fn display_description(&self) -> &str {
        match self.seo_description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => &self.excerpt,
        }
    }

    /// The image used for social previews: the dedicated one, else the cover.
    pub fn social_image(&self) -> Option<&str> {
        self.og_image
            .as_deref()
            .or(self.image.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Sort newest first by `date`. ISO dates compare correctly as strings.
pub fn sort_by_date_desc(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}
