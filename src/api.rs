use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::error::{FetchError, TocError};
use crate::formats::TocNode;

pub const DEFAULT_API_BASE: &str = "https://api.parliament.nsw.gov.au/api/hansard/search/daily";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SITE_ORIGIN: &str = "https://www.parliament.nsw.gov.au";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";
const POOL_MAX_IDLE_PER_HOST: usize = 32;

#[async_trait]
pub trait TocSource: Send + Sync {
    async fn fetch_toc(&self, day_id: &str) -> Result<Vec<TocNode>, TocError>;
}

#[async_trait]
pub trait FragmentSource: Send + Sync {
    /// One attempt at fetching the raw markup for `topic_id`.
    async fn fetch_fragment(&self, topic_id: &str) -> Result<String, FetchError>;
}

/// Shared pooled client for both Hansard endpoints.
#[derive(Debug, Clone)]
pub struct HansardClient {
    client: reqwest::Client,
    api_base: Url,
}

impl HansardClient {
    pub fn new(api_base: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut api_base = Url::parse(api_base).context("parse api base url")?;
        if api_base.scheme() != "http" && api_base.scheme() != "https" {
            anyhow::bail!("api base must be http/https: {api_base}");
        }
        if api_base.cannot_be_a_base() {
            anyhow::bail!("api base cannot carry path segments: {api_base}");
        }
        api_base.set_query(None);
        api_base.set_fragment(None);

        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .user_agent(BROWSER_USER_AGENT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .timeout(timeout)
            .build()
            .context("build hansard http client")?;

        Ok(Self { client, api_base })
    }

    fn endpoint(&self, route: &[&str], id: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(route);
            segments.push(id);
        }
        url
    }

    pub fn toc_url(&self, day_id: &str) -> Url {
        self.endpoint(&["tableofcontentsbydate"], day_id)
    }

    pub fn fragment_url(&self, topic_id: &str) -> Url {
        self.endpoint(&["fragment", "html"], topic_id)
    }

    async fn post_empty(&self, url: Url) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(url)
            .header(header::CONTENT_LENGTH, "0")
            .send()
            .await
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.8"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
    headers.insert(
        header::REFERER,
        HeaderValue::from_static("https://www.parliament.nsw.gov.au/"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    headers
}

#[async_trait]
impl TocSource for HansardClient {
    async fn fetch_toc(&self, day_id: &str) -> Result<Vec<TocNode>, TocError> {
        let day_id = day_id.trim();
        if day_id.is_empty() {
            return Err(TocError::EmptyDayId);
        }

        let url = self.toc_url(day_id);
        tracing::debug!(day_id, %url, "fetch table of contents");
        let transport = |err: reqwest::Error| TocError::Transport {
            day_id: day_id.to_owned(),
            message: format!("{err:#}"),
        };

        let response = self.post_empty(url).await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TocError::Status {
                day_id: day_id.to_owned(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(transport)?;
        decode_toc(day_id, &body)
    }
}

#[async_trait]
impl FragmentSource for HansardClient {
    async fn fetch_fragment(&self, topic_id: &str) -> Result<String, FetchError> {
        let topic_id = topic_id.trim();
        if topic_id.is_empty() {
            return Err(FetchError::EmptyTopicId);
        }

        let response = self
            .post_empty(self.fragment_url(topic_id))
            .await
            .map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(classify_transport)?;
        decode_fragment(&body)
    }
}

fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(format!("{err:#}"))
    }
}

/// Decodes a JSON body that may itself be a JSON string holding the document.
pub fn decode_json_payload(body: &str) -> Result<serde_json::Value, serde_json::Error> {
    let first: serde_json::Value = serde_json::from_str(body)?;
    match first {
        serde_json::Value::String(inner) => serde_json::from_str(&inner),
        other => Ok(other),
    }
}

pub fn decode_toc(day_id: &str, body: &str) -> Result<Vec<TocNode>, TocError> {
    if body.trim().is_empty() {
        return Err(TocError::EmptyBody {
            day_id: day_id.to_owned(),
        });
    }
    let decode_err = |err: serde_json::Error| TocError::Decode {
        day_id: day_id.to_owned(),
        message: err.to_string(),
    };

    let value = decode_json_payload(body).map_err(decode_err)?;
    let roots: Vec<TocNode> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(decode_err)?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(value).map_err(decode_err)?],
        other => {
            return Err(TocError::Decode {
                day_id: day_id.to_owned(),
                message: format!("expected a list of nodes, got {other}"),
            });
        }
    };

    if roots.is_empty() {
        return Err(TocError::NoEntries {
            day_id: day_id.to_owned(),
        });
    }
    Ok(roots)
}

pub fn decode_fragment(body: &str) -> Result<String, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }
    let value =
        decode_json_payload(body).map_err(|err| FetchError::MalformedPayload(err.to_string()))?;
    let html = value
        .get("DocumentHtml")
        .and_then(|v| v.as_str())
        .ok_or_else(|| FetchError::MalformedPayload("missing `DocumentHtml` string".to_owned()))?;
    if html.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(html.to_owned())
}
