use serde::{Deserialize, Serialize};

/// Metadata describing a website, used to prefill a bookmark.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebsiteMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub favicon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Fields a single metadata source managed to extract. Empty strings count as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
}

/// The reduced shape the bookmark editor consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebsiteInfoSimple {
    pub name: String,
    pub favicon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub domain: String,
}
