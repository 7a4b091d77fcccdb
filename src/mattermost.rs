//! Chat delivery: text posts, file uploads and the channel clear utility.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::client::remote_error;
use crate::config::MattermostSettings;
use crate::error::{DigestError, Result};
use crate::responses::{ChannelPosts, FileUploadResponse};
use crate::types::{BotIdentity, DeliveryPayload, FileId};

const SERVICE: &str = "Mattermost";

/// Delay between edits in [`MattermostClient::clear_channel`].
pub const CLEAR_PACE: Duration = Duration::from_millis(100);

pub struct MattermostClient {
    http: Client,
    base_url: String,
    token: String,
    identity: BotIdentity,
    pace: Duration,
}

/// Outcome of a channel clear.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearSummary {
    pub cleared: usize,
    pub failed: usize,
}

impl MattermostClient {
    /// Fails with a configuration error before any request if the
    /// location or token is missing.
    pub fn from_config(settings: &MattermostSettings) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: settings.base_url()?.to_string(),
            token: settings.token()?.to_string(),
            identity: settings.identity.clone(),
            pace: CLEAR_PACE,
        })
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4{path}", self.base_url)
    }

    pub async fn post_text(&self, channel: &str, text: &str) -> Result<()> {
        self.send_post(&DeliveryPayload::new(channel, text, &self.identity))
            .await
    }

    /// Post `text` with previously uploaded files attached, in the given order.
    pub async fn post_with_files(&self, channel: &str, text: &str, files: &[FileId]) -> Result<()> {
        let payload = DeliveryPayload::new(channel, text, &self.identity).with_files(files);
        self.send_post(&payload).await
    }

    async fn send_post(&self, payload: &DeliveryPayload) -> Result<()> {
        let response = self
            .request(self.http.post(self.url("/posts")))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(SERVICE, response).await);
        }

        info!(
            channel = %payload.channel_id,
            files = payload.file_ids.len(),
            "posted to channel"
        );
        Ok(())
    }

    /// Upload a local file to `channel`, returning its handle.
    pub async fn upload_file(&self, channel: &str, path: &Path) -> Result<FileId> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        let data = std::fs::read(path).map_err(|e| DigestError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let size = data.len();

        let part = Part::bytes(data)
            .file_name(filename.clone())
            .mime_str(guess_content_type(&filename))?;
        let form = Form::new()
            .text("channel_id", channel.to_string())
            .part("files", part);

        let response = self
            .request(self.http.post(self.url("/files")))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(SERVICE, response).await);
        }

        let uploaded: FileUploadResponse = response.json().await?;
        let id = uploaded
            .file_infos
            .into_iter()
            .next()
            .map(|info| FileId(info.id))
            .ok_or_else(|| DigestError::MissingFileHandle(filename.clone()))?;

        debug!(file = %filename, size, id = %id.as_str(), "file uploaded");
        Ok(id)
    }

    /// Overwrite every post in `channel` with an empty message. Edits are
    /// paced; a failed edit is logged and skipped.
    pub async fn clear_channel(&self, channel: &str) -> Result<ClearSummary> {
        let response = self
            .request(self.http.get(self.url(&format!("/channels/{channel}/posts"))))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(SERVICE, response).await);
        }

        let posts: ChannelPosts = response.json().await?;
        let ids = posts.post_ids();
        let mut summary = ClearSummary::default();

        for (index, post_id) in ids.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pace).await;
            }

            match self.blank_post(post_id).await {
                Ok(()) => summary.cleared += 1,
                Err(e) => {
                    warn!(post = %post_id, error = %e, "failed to clear post");
                    summary.failed += 1;
                }
            }
        }

        info!(
            channel,
            cleared = summary.cleared,
            failed = summary.failed,
            "channel cleared"
        );
        Ok(summary)
    }

    async fn blank_post(&self, post_id: &str) -> Result<()> {
        let response = self
            .request(self.http.put(self.url(&format!("/posts/{post_id}"))))
            .json(&json!({ "id": post_id, "message": "", "props": {} }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(SERVICE, response).await);
        }
        Ok(())
    }
}

fn guess_content_type(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
