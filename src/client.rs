use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use crate::config::JiraSettings;
use crate::error::{DigestError, Result};
use crate::jql::Jql;
use crate::responses::{ApiMessage, RawRecord, SearchResponse};

const SEARCH_PATH: &str = "/rest/api/3/search";

/// Auth header for a tracker token: `user:secret` is sent as Basic,
/// anything else as a Bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Credential {
    Basic { user: String, secret: String },
    Bearer(String),
}

impl Credential {
    fn parse(token: &str) -> Self {
        match token.split_once(':') {
            Some((user, secret)) => Credential::Basic {
                user: user.to_string(),
                secret: secret.to_string(),
            },
            None => Credential::Bearer(token.to_string()),
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::Basic { user, secret } => request.basic_auth(user, Some(secret)),
            Credential::Bearer(token) => request.bearer_auth(token),
        }
    }
}

/// Read-only client for the tracker's search endpoint.
#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    credential: Credential,
}

impl JiraClient {
    /// Fails with a configuration error before any request if the
    /// location or credential is missing.
    pub fn from_config(settings: &JiraSettings) -> Result<Self> {
        let base_url = settings.base_url()?.to_string();
        let credential = Credential::parse(settings.token()?);

        Ok(Self {
            http: Client::new(),
            base_url,
            credential,
        })
    }

    /// Number of issues matching `jql`.
    pub async fn count(&self, jql: &Jql) -> Result<u64> {
        let page = self.search_page(jql, Some(0)).await?;
        Ok(page.total)
    }

    /// First page of issues matching `jql`.
    pub async fn search(&self, jql: &Jql) -> Result<Vec<RawRecord>> {
        let page = self.search_page(jql, None).await?;
        Ok(page.issues)
    }

    async fn search_page(&self, jql: &Jql, max_results: Option<u32>) -> Result<SearchResponse> {
        let expression = jql.to_string();
        debug!(jql = %expression, "querying tracker");

        let mut request = self
            .http
            .get(format!("{}{SEARCH_PATH}", self.base_url))
            .header("Accept", "application/json")
            .query(&[("jql", expression.as_str())]);

        if let Some(max) = max_results {
            request = request.query(&[("maxResults", max)]);
        }

        let response = self.credential.apply(request).send().await?;

        if !response.status().is_success() {
            return Err(remote_error("Jira", response).await);
        }

        Ok(response.json().await?)
    }
}

/// Turn a non-success response into a `RemoteService` error, using the
/// upstream message when the body carries one.
pub(crate) async fn remote_error(service: &'static str, response: Response) -> DigestError {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("<failed to read response body>")
        .to_string();

    let message = match response.text().await {
        Ok(body) => serde_json::from_str::<ApiMessage>(&body)
            .ok()
            .and_then(ApiMessage::into_text)
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            .unwrap_or(fallback),
        Err(_) => fallback,
    };

    DigestError::RemoteService {
        service,
        status: status.as_u16(),
        message,
    }
}
