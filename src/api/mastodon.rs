//! Mastodon API client

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::auth::Credentials;
use crate::models::{Item, NotificationKind, PageRequest, Relation, TimelineIdentity};

use super::{FetchError, FetchPage, Page};

const DEFAULT_PAGE_LIMIT: usize = 40;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Mastodon API client
pub struct MastodonClient {
    client: Client,
    instance: String,
    access_token: String,
    page_limit: usize,
    notification_types: Vec<NotificationKind>,
    timeout: Duration,
}

impl MastodonClient {
    /// Create a new Mastodon client for the given credentials
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            client: Client::new(),
            instance: credentials.instance_url.trim_end_matches('/').to_string(),
            access_token: credentials.access_token.clone(),
            page_limit: DEFAULT_PAGE_LIMIT,
            notification_types: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Items requested per page
    pub const fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    /// Restrict notifications to these types (empty means all)
    pub fn with_notification_types(mut self, types: Vec<NotificationKind>) -> Self {
        self.notification_types = types;
        self
    }

    /// Per-request timeout
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build API URL
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v1{}", self.instance, endpoint)
    }

    /// URL of the most recent page of a paginated timeline
    fn latest_url(&self, identity: &TimelineIdentity) -> String {
        let limit = self.page_limit;
        match identity {
            TimelineIdentity::Home => self.api_url(&format!("/timelines/home?limit={limit}")),
            TimelineIdentity::Local => {
                self.api_url(&format!("/timelines/public?local=true&limit={limit}"))
            }
            TimelineIdentity::Public => self.api_url(&format!("/timelines/public?limit={limit}")),
            TimelineIdentity::Bookmarks => self.api_url(&format!("/bookmarks?limit={limit}")),
            TimelineIdentity::Account(id) => self.api_url(&format!(
                "/accounts/{}/statuses?limit={limit}",
                urlencoding::encode(id)
            )),
            TimelineIdentity::List(id) => self.api_url(&format!(
                "/timelines/list/{}?limit={limit}",
                urlencoding::encode(id)
            )),
            TimelineIdentity::Notifications => {
                let mut url = self.api_url(&format!("/notifications?limit={limit}"));
                for kind in &self.notification_types {
                    url.push_str("&types[]=");
                    url.push_str(&urlencoding::encode(kind.as_str()));
                }
                url
            }
            TimelineIdentity::Thread(id) => {
                self.api_url(&format!("/statuses/{}", urlencoding::encode(id)))
            }
        }
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<(T, HeaderMap), FetchError> {
        let response = self.get(url).await?;
        let headers = response.headers().clone();
        let body = response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to parse response: {e}")))?;
        Ok((body, headers))
    }

    async fn fetch_statuses(&self, url: &str) -> Result<Page, FetchError> {
        let (statuses, headers) = self.get_json::<Vec<MastodonStatus>>(url).await?;
        let (next, prev) = page_tokens(&headers);
        Ok(Page::new(
            statuses.into_iter().map(MastodonStatus::into_item).collect(),
            next,
            prev,
        ))
    }

    async fn fetch_notifications(&self, url: &str) -> Result<Page, FetchError> {
        let (notifications, headers) = self.get_json::<Vec<MastodonNotification>>(url).await?;
        let (next, prev) = page_tokens(&headers);
        Ok(Page::new(
            notifications
                .into_iter()
                .map(MastodonNotification::into_item)
                .collect(),
            next,
            prev,
        ))
    }

    async fn fetch_thread(&self, status_id: &str) -> Result<Page, FetchError> {
        let id = urlencoding::encode(status_id);
        let status_url = self.api_url(&format!("/statuses/{id}"));
        let context_url = self.api_url(&format!("/statuses/{id}/context"));

        let (status, context) = tokio::try_join!(
            self.get_json::<MastodonStatus>(&status_url),
            self.get_json::<MastodonContext>(&context_url),
        )?;

        let mut items: Vec<Item> = context
            .0
            .ancestors
            .into_iter()
            .map(MastodonStatus::into_item)
            .collect();
        items.push(status.0.into_item());
        items.extend(
            context
                .0
                .descendants
                .into_iter()
                .map(MastodonStatus::into_item),
        );

        // The context endpoint is not paginated
        Ok(Page::new(items, None, None))
    }
}

impl FetchPage for MastodonClient {
    async fn fetch_page(
        &self,
        identity: &TimelineIdentity,
        request: &PageRequest,
    ) -> Result<Page, FetchError> {
        if let TimelineIdentity::Thread(id) = identity {
            return self.fetch_thread(id).await;
        }

        let url = match &request.token {
            Some(token) => {
                if !token.starts_with(&self.instance) {
                    return Err(FetchError::Network(format!(
                        "Refusing to follow cursor outside {}",
                        self.instance
                    )));
                }
                token.clone()
            }
            None => self.latest_url(identity),
        };

        match identity {
            TimelineIdentity::Notifications => self.fetch_notifications(&url).await,
            _ => self.fetch_statuses(&url).await,
        }
    }
}

/// Map non-success responses onto the error taxonomy
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<MastodonError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited { retry_after },
        _ => FetchError::Network(format!("Mastodon error {status}: {message}")),
    })
}

/// Backoff hint from `Retry-After` (seconds) or `X-RateLimit-Reset` (timestamp)
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(secs) = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        return Some(Duration::from_secs(secs));
    }

    headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
        .map(|reset| {
            let wait = reset.with_timezone(&Utc) - Utc::now();
            wait.to_std().unwrap_or(Duration::ZERO)
        })
}

/// Cursor tokens from the `Link` header as `(next, prev)`.
///
/// Mastodon's `rel="prev"` points at newer items (our forward direction) and
/// `rel="next"` at older ones (our backward direction).
fn page_tokens(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let Some(link) = headers.get(LINK).and_then(|v| v.to_str().ok()) else {
        return (None, None);
    };
    let (older, newer) = parse_link_header(link);
    (newer, older)
}

/// Parse a `Link` header into its `(rel="next", rel="prev")` URLs
fn parse_link_header(value: &str) -> (Option<String>, Option<String>) {
    let mut next = None;
    let mut prev = None;

    for part in value.split(',') {
        let mut segments = part.split(';');
        let Some(url) = segments.next() else {
            continue;
        };
        let url = url.trim().trim_start_matches('<').trim_end_matches('>');
        if url.is_empty() {
            continue;
        }

        for param in segments {
            let param = param.trim();
            let Some(rel) = param.strip_prefix("rel=") else {
                continue;
            };
            match rel.trim_matches('"') {
                "next" => next = Some(url.to_string()),
                "prev" => prev = Some(url.to_string()),
                _ => {}
            }
        }
    }

    (next, prev)
}

/// Convert status HTML into plain text
fn strip_html(html: &str) -> String {
    let text = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p><p>", "\n\n");

    let text = regex_lite::Regex::new(r"<[^>]+>")
        .map(|re| re.replace_all(&text, "").to_string())
        .unwrap_or(text);

    html_escape::decode_html_entities(&text).trim().to_string()
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

// ==================== API Types ====================

#[derive(Debug, Deserialize)]
struct MastodonError {
    error: String,
}

#[derive(Debug, Deserialize)]
struct MastodonStatus {
    id: String,
    created_at: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    spoiler_text: String,
    url: Option<String>,
    account: MastodonAccount,
    reblog: Option<Box<Self>>,
    in_reply_to_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MastodonAccount {
    #[serde(default)]
    username: String,
    #[serde(default)]
    acct: String,
}

impl MastodonAccount {
    fn handle(self) -> String {
        if self.acct.is_empty() {
            self.username
        } else {
            self.acct
        }
    }
}

#[derive(Debug, Deserialize)]
struct MastodonContext {
    ancestors: Vec<MastodonStatus>,
    descendants: Vec<MastodonStatus>,
}

#[derive(Debug, Deserialize)]
struct MastodonNotification {
    id: String,
    #[serde(rename = "type")]
    kind: NotificationKind,
    created_at: String,
    account: MastodonAccount,
    status: Option<MastodonStatus>,
}

impl MastodonStatus {
    fn body(&self) -> String {
        let content = strip_html(&self.content);
        if self.spoiler_text.is_empty() {
            content
        } else {
            format!("CW: {}\n\n{}", self.spoiler_text, content)
        }
    }

    fn into_item(self) -> Item {
        // Boosts keep the wrapper id so the same status boosted twice stays distinct
        if let Some(reblog) = self.reblog {
            let inner = reblog.into_item();
            return Item {
                id: self.id,
                created_at: parse_time(&self.created_at),
                relation: inner.status_id.clone().map(Relation::Boost),
                ..inner
            };
        }

        let body = self.body();
        Item {
            status_id: Some(self.id.clone()),
            id: self.id,
            author: self.account.handle(),
            body,
            created_at: parse_time(&self.created_at),
            relation: self.in_reply_to_id.map(Relation::ReplyTo),
            notification: None,
            url: self.url,
            read: false,
        }
    }
}

impl MastodonNotification {
    fn into_item(self) -> Item {
        let status = self.status.map(MastodonStatus::into_item);
        Item {
            id: self.id,
            author: self.account.handle(),
            body: status.as_ref().map(|s| s.body.clone()).unwrap_or_default(),
            created_at: parse_time(&self.created_at),
            relation: status.as_ref().and_then(|s| s.relation.clone()),
            notification: Some(self.kind),
            status_id: status.as_ref().and_then(|s| s.status_id.clone()),
            url: status.and_then(|s| s.url),
            read: false,
        }
    }
}
