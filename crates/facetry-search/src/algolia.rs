//! Algolia REST backend.
//!
//! Reads go to the DSN host (`{app}-dsn.algolia.net`), writes to the
//! primary host (`{app}.algolia.net`); a configured host overrides both.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use facetry_core::{Error, ProviderConfig, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::backend::{IndexInfo, IndexSettings, SearchBackend, SubQueryResponse};
use crate::document::IndexDocument;
use crate::planner::SubQuery;

const APP_ID_HEADER: &str = "x-algolia-application-id";
const API_KEY_HEADER: &str = "x-algolia-api-key";
const TASK_POLL_START: Duration = Duration::from_millis(100);
const TASK_POLL_MAX: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct MultiQueryResponse {
    #[serde(default)]
    results: Vec<SubQueryResponse>,
}

#[derive(Debug, Deserialize)]
struct ListIndicesResponse {
    #[serde(default)]
    items: Vec<IndexInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResponse {
    #[serde(rename = "taskID")]
    task_id: u64,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    status: String,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    action: &'static str,
    body: &'a IndexDocument,
}

/// [`SearchBackend`] over the Algolia REST API.
#[derive(Debug, Clone)]
pub struct AlgoliaBackend {
    client: reqwest::Client,
    read_host: Url,
    write_host: Url,
    batch_size: usize,
    task_timeout: Duration,
}

impl AlgoliaBackend {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unusable credentials or hosts.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            APP_ID_HEADER,
            HeaderValue::from_str(&config.app_id)
                .map_err(|_| Error::config("app_id is not a valid header value"))?,
        );
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| Error::config("api_key is not a valid header value"))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::backend_with_source("Failed to create HTTP client", e))?;

        let (read_host, write_host) = match config.host.as_deref() {
            Some(host) => (parse_host(host)?, parse_host(host)?),
            None => (
                parse_host(&format!("https://{}-dsn.algolia.net", config.app_id))?,
                parse_host(&format!("https://{}.algolia.net", config.app_id))?,
            ),
        };

        log::debug!("Algolia backend: read host {read_host}, write host {write_host}");
        Ok(Self {
            client,
            read_host,
            write_host,
            batch_size: config.batch_size.max(1),
            task_timeout: config.request_timeout(),
        })
    }

    fn request(&self, method: Method, read: bool, segments: &[&str]) -> Result<RequestBuilder> {
        let mut url = if read {
            self.read_host.clone()
        } else {
            self.write_host.clone()
        };
        url.path_segments_mut()
            .map_err(|()| Error::config("engine host cannot carry a path"))?
            .pop_if_empty()
            .push("1")
            .extend(segments);
        Ok(self.client.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::backend_with_source(format!("{what}: request failed"), e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(format!("{what}: HTTP {status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| Error::backend_with_source(format!("{what}: invalid response"), e))
    }

    async fn save_chunk(&self, index: &str, documents: &[IndexDocument]) -> Result<TaskResponse> {
        let requests: Vec<BatchRequest<'_>> = documents
            .iter()
            .map(|body| BatchRequest {
                action: "updateObject",
                body,
            })
            .collect();
        let request = self
            .request(Method::POST, false, &["indexes", index, "batch"])?
            .json(&json!({ "requests": requests }));
        self.send(request, "batch").await
    }

    /// Poll an engine task until it is published.
    async fn wait_for_task(&self, index: &str, task_id: u64) -> Result<()> {
        let deadline = Instant::now() + self.task_timeout;
        let task = task_id.to_string();
        let mut delay = TASK_POLL_START;
        loop {
            let request = self.request(Method::GET, false, &["indexes", index, "task", &task])?;
            let status: TaskStatus = self.send(request, "task status").await?;
            if status.status == "published" {
                return Ok(());
            }
            if Instant::now() + delay > deadline {
                return Err(Error::timeout(
                    format!("task {task_id} on '{index}'"),
                    self.task_timeout.as_secs(),
                ));
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(TASK_POLL_MAX);
        }
    }
}

fn parse_host(host: &str) -> Result<Url> {
    Url::parse(host).map_err(|e| Error::config(format!("Invalid engine host '{host}': {e}")))
}

#[async_trait]
impl SearchBackend for AlgoliaBackend {
    async fn multi_search(&self, queries: &[SubQuery]) -> Result<Vec<SubQueryResponse>> {
        let request = self
            .request(Method::POST, true, &["indexes", "*", "queries"])?
            .json(&json!({ "requests": queries, "strategy": "none" }));
        let response: MultiQueryResponse = self.send(request, "multi-query").await?;
        Ok(response.results)
    }

    async fn save_objects(&self, index: &str, documents: &[IndexDocument]) -> Result<()> {
        let tasks = futures::future::try_join_all(
            documents
                .chunks(self.batch_size)
                .map(|chunk| self.save_chunk(index, chunk)),
        )
        .await?;
        log::debug!(
            "Sent {} documents to '{index}' in {} batches",
            documents.len(),
            tasks.len()
        );
        Ok(())
    }

    async fn delete_by(&self, index: &str, facet_filters: &[Vec<String>]) -> Result<()> {
        let request = self
            .request(Method::POST, false, &["indexes", index, "deleteByQuery"])?
            .json(&json!({ "facetFilters": facet_filters }));
        let _: TaskResponse = self.send(request, "delete by").await?;
        Ok(())
    }

    async fn clear_objects(&self, index: &str) -> Result<()> {
        let request = self.request(Method::POST, false, &["indexes", index, "clear"])?;
        let _: TaskResponse = self.send(request, "clear").await?;
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self
            .request(Method::GET, true, &["indexes", index, "settings"])?
            .send()
            .await
            .map_err(|e| Error::backend_with_source("settings: request failed", e))?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::backend(format!("settings: HTTP {status}"))),
        }
    }

    async fn list_indices(&self) -> Result<Vec<IndexInfo>> {
        let request = self.request(Method::GET, true, &["indexes"])?;
        let response: ListIndicesResponse = self.send(request, "list indexes").await?;
        Ok(response.items)
    }

    async fn set_settings(&self, index: &str, settings: &IndexSettings) -> Result<()> {
        let request = self
            .request(Method::PUT, false, &["indexes", index, "settings"])?
            .json(settings);
        let task: TaskResponse = self.send(request, "set settings").await?;
        self.wait_for_task(index, task.task_id).await
    }

    fn name(&self) -> &str {
        "algolia"
    }
}
