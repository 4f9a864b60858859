use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct InstagramMedia {
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Shape of `instagram.json`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InstagramSnapshot {
    #[serde(default)]
    pub media: Vec<InstagramMedia>,
}
