//! Wire shapes returned by the issue tracker and the chat service.

use std::collections::HashMap;

use serde::Deserialize;

/// `GET /rest/api/3/search` response. Only the first page is ever read.
#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<RawRecord>,
}

/// One issue as the tracker returns it. Every field is optional here;
/// presence is checked during normalization.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawRecord {
    pub key: Option<String>,
    pub fields: Option<RawFields>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawFields {
    pub summary: Option<String>,
    pub status: Option<NamedValue>,
    pub assignee: Option<RawUser>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub issuetype: Option<NamedValue>,
    pub priority: Option<NamedValue>,
    /// Custom fields (sprint lives here under an instance-specific id).
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NamedValue {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawUser {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// Error body shared by both services.
#[derive(Deserialize, Debug, Default)]
pub struct ApiMessage {
    pub message: Option<String>,
    #[serde(rename = "errorMessages", default)]
    pub error_messages: Vec<String>,
}

impl ApiMessage {
    pub fn into_text(self) -> Option<String> {
        self.message
            .filter(|m| !m.is_empty())
            .or_else(|| (!self.error_messages.is_empty()).then(|| self.error_messages.join("; ")))
    }
}

/// `POST /api/v4/files` response.
#[derive(Deserialize, Debug)]
pub struct FileUploadResponse {
    #[serde(default)]
    pub file_infos: Vec<FileInfo>,
}

#[derive(Deserialize, Debug)]
pub struct FileInfo {
    pub id: String,
}

/// `GET /api/v4/channels/{id}/posts` response.
#[derive(Deserialize, Debug, Default)]
pub struct ChannelPosts {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub posts: HashMap<String, serde_json::Value>,
}

impl ChannelPosts {
    /// Post ids in channel order, plus any the order list missed.
    pub fn post_ids(&self) -> Vec<String> {
        let mut ids = self.order.clone();
        let mut extra: Vec<String> = self
            .posts
            .keys()
            .filter(|id| !self.order.contains(id))
            .cloned()
            .collect();
        extra.sort();
        ids.extend(extra);
        ids
    }
}
