use super::{Fingerprint, HealthStatus, RetryPolicy, SearchEngineClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::schema::{create_index_body, field_type};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
struct ClusterHealthResponse {
    status: HealthStatus,
}

/// Elasticsearch-compatible engine over its REST API
pub struct HttpEngineClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
    request_timeout: Duration,
    create_timeout: Duration,
    wait_for_status: HealthStatus,
}

impl HttpEngineClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut client = Self::with_policy(&config.engine_url, config.http.retry_policy())?;
        client.request_timeout = Duration::from_secs(config.http.request_timeout_secs);
        client.create_timeout = Duration::from_secs(config.http.create_timeout_secs);
        client.wait_for_status = config.readiness.wait_for_status;
        Ok(client)
    }

    pub fn with_policy(base_url: &str, retry: RetryPolicy) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Endpoints join relative to the base, so a path prefix must end in '/'
        if !base_url.path().ends_with('/') {
            let prefixed = format!("{}/", base_url.path());
            base_url.set_path(&prefixed);
        }
        // Mapping responses of large indices are big; the engine gzips on request
        let client = Client::builder().gzip(true).build()?;
        Ok(Self {
            client,
            base_url,
            retry,
            request_timeout: Duration::from_secs(30),
            create_timeout: Duration::from_secs(60),
            wait_for_status: HealthStatus::Yellow,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid engine URL: {}", e)))
    }

    /// Send with the inner retry policy: network failures and allow-listed
    /// statuses are retried with backoff, every other response is returned as is.
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let mut attempt: u32 = 0;
        loop {
            let req = request.try_clone().ok_or_else(|| {
                Error::Config(format!("{} request cannot be retried", operation))
            })?;

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    if !self.retry.is_retryable_status(status) || !self.retry.can_retry(attempt) {
                        return Ok(response);
                    }
                    debug!(
                        operation,
                        attempt = attempt + 1,
                        status = status.as_u16(),
                        "Retrying after retryable status"
                    );
                }
                Err(e) if e.is_builder() => return Err(Error::Http(e)),
                Err(e) => {
                    if !self.retry.can_retry(attempt) {
                        return Err(Error::Transient {
                            operation: operation.to_string(),
                            attempts: attempt + 1,
                            message: e.to_string(),
                        });
                    }
                    debug!(operation, attempt = attempt + 1, error = %e, "Retrying after network error");
                }
            }

            tokio::time::sleep(self.retry.delay_for(attempt)).await;
            attempt += 1;
        }
    }
}

async fn body_text(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

#[async_trait]
impl SearchEngineClient for HttpEngineClient {
    async fn health(&self, timeout: Duration) -> Result<HealthStatus> {
        let url = self.endpoint("_cluster/health")?;
        // Let the server give up on waiting before the client times out
        let server_wait = format!("{}ms", (timeout * 3 / 4).as_millis());
        let request = self
            .client
            .get(url)
            .query(&[
                ("wait_for_status", self.wait_for_status.as_str()),
                ("timeout", server_wait.as_str()),
            ])
            .timeout(timeout);

        let response = self.send("cluster health", request).await?;
        match response.status() {
            // 408: the server-side wait elapsed, the body still reports the status
            StatusCode::OK | StatusCode::REQUEST_TIMEOUT => {
                let parsed = response.json::<ClusterHealthResponse>().await?;
                Ok(parsed.status)
            }
            status => Err(Error::UnexpectedResponse {
                operation: "cluster health".to_string(),
                status: status.as_u16(),
                body: body_text(response).await,
            }),
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = self.endpoint(index)?;
        let request = self.client.head(url).timeout(self.request_timeout);

        let response = self.send("index exists", request).await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::UnexpectedResponse {
                operation: format!("index exists '{}'", index),
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn get_fingerprint(&self, index: &str, fields: &[&str]) -> Result<Fingerprint> {
        let url = self.endpoint(&format!("{}/_mapping", index))?;
        let request = self.client.get(url).timeout(self.request_timeout);

        let response = self.send("get mapping", request).await?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(Error::IndexNotFound(index.to_string())),
            status => {
                return Err(Error::UnexpectedResponse {
                    operation: format!("get mapping '{}'", index),
                    status: status.as_u16(),
                    body: body_text(response).await,
                })
            }
        }

        let body: Value = response.json().await?;
        // Aliases answer under the concrete index name
        let root = body
            .get(index)
            .or_else(|| body.as_object().and_then(|indices| indices.values().next()));
        let mappings = root.and_then(|r| r.get("mappings"));

        let mut fingerprint = Fingerprint::new();
        if let Some(mappings) = mappings {
            for field in fields {
                if let Some(kind) = field_type(mappings, field) {
                    fingerprint.insert(field.to_string(), kind.to_string());
                }
            }
        }

        debug!("Observed fingerprint for {}: {:?}", index, fingerprint);
        Ok(fingerprint)
    }

    async fn create_index(&self, index: &str, settings: &Value, mapping: &Value) -> Result<()> {
        let url = self.endpoint(index)?;
        let body = create_index_body(settings, mapping);
        let request = self
            .client
            .put(url)
            .json(&body)
            .timeout(self.create_timeout);

        let response = self.send("create index", request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = body_text(response).await;
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            return Err(Error::IndexAlreadyExists(index.to_string()));
        }

        Err(Error::EngineWrite {
            operation: format!("create index '{}'", index),
            status: status.as_u16(),
            body,
        })
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let url = self.endpoint(index)?;
        let request = self.client.delete(url).timeout(self.request_timeout);

        let response = self.send("delete index", request).await?;
        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NOT_FOUND => Ok(()),
            status => Err(Error::EngineWrite {
                operation: format!("delete index '{}'", index),
                status: status.as_u16(),
                body: body_text(response).await,
            }),
        }
    }

    async fn upsert_template(&self, name: &str, body: &Value) -> Result<()> {
        let url = self.endpoint(&format!("_scripts/{}", name))?;
        let payload = json!({
            "script": {
                "lang": "mustache",
                "source": serde_json::to_string(body)?,
            }
        });
        let request = self
            .client
            .post(url)
            .json(&payload)
            .timeout(self.request_timeout);

        let response = self.send("upsert template", request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(Error::EngineWrite {
            operation: format!("upsert template '{}'", name),
            status: status.as_u16(),
            body: body_text(response).await,
        })
    }
}
