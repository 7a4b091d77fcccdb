use serde::{Deserialize, Serialize};

/// Opaque handle returned by the chat service for an uploaded file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How posts appear in the channel.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BotIdentity {
    pub username: String,
    pub display_name: String,
    pub icon_url: String,
    pub notification_sound: String,
}

impl Default for BotIdentity {
    fn default() -> Self {
        Self {
            username: "test-automation".to_string(),
            display_name: "Jira Bot".to_string(),
            icon_url: "https://jira.atlassian.com/favicon.ico".to_string(),
            notification_sound: "bing".to_string(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PostProps {
    pub from_bot: bool,
    pub override_username: String,
    pub override_icon_url: String,
    pub notification_sound: String,
}

/// Body of `POST /api/v4/posts`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPayload {
    pub channel_id: String,
    pub username: String,
    pub message: String,
    pub props: PostProps,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<FileId>,
}

impl DeliveryPayload {
    pub fn new(channel: &str, message: &str, identity: &BotIdentity) -> Self {
        Self {
            channel_id: channel.to_string(),
            username: identity.username.clone(),
            message: message.to_string(),
            props: PostProps {
                from_bot: true,
                override_username: identity.display_name.clone(),
                override_icon_url: identity.icon_url.clone(),
                notification_sound: identity.notification_sound.clone(),
            },
            file_ids: Vec::new(),
        }
    }

    pub fn with_files(mut self, files: &[FileId]) -> Self {
        self.file_ids = files.to_vec();
        self
    }
}
