use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::sse::{error_details, process_sse};
use crate::types::{ChatCompletionChunk, ChatCompletionRequest};

const DEFAULT_API_URL: &str = "https://router.huggingface.co/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A boxed stream of decoded chat-completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// A service that streams chat completions.
///
/// [`InferenceClient`] is the production implementation; the relay only
/// depends on this trait.
#[async_trait::async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Issue a streaming chat-completion request.
    ///
    /// Errors that happen before the first byte (connection, HTTP status) are
    /// returned directly; errors after that arrive as items of the stream.
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream>;
}

/// Client for the Hugging Face inference router's chat-completions API.
#[derive(Clone)]
pub struct InferenceClient {
    authorization: HeaderValue,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl InferenceClient {
    /// Create a new client for the default endpoint.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_options(token, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `timeout` bounds connecting and waiting for the response headers.  A
    /// reply that is already streaming is never cut off.
    pub fn with_options(
        token: impl Into<String>,
        base_url: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = http_client_builder(timeout).build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Self::with_http_client(token, base_url, timeout, client)
    }

    /// Create a new client around a caller-configured HTTP client.
    ///
    /// `timeout` bounds the wait for the response headers; connect and read
    /// limits are whatever `client` was built with.
    pub fn with_http_client(
        token: impl Into<String>,
        base_url: Option<&str>,
        timeout: Duration,
        client: ReqwestClient,
    ) -> Result<Self> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::authentication("API token is empty"));
        }
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::authentication("API token contains invalid characters"))?;
        authorization.set_sensitive(true);

        Ok(Self {
            authorization,
            client,
            base_url: normalize_base_url(base_url.unwrap_or(DEFAULT_API_URL))?,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request, chunk, and failure.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The chat-completions endpoint.
    pub fn endpoint(&self) -> Result<Url> {
        Ok(self.base_url.join("chat/completions")?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        headers.insert(header::AUTHORIZATION, self.authorization.clone());
        headers
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let (error_type, error_message) = serde_json::from_str::<serde_json::Value>(&error_body)
            .ok()
            .and_then(|value| error_details(&value))
            .unwrap_or_else(|| (None, error_body.clone()));

        match status_code {
            400 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message, request_id),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message, request_id),
        }
    }

    fn record_error(&self, error: &Error) {
        CLIENT_REQUEST_ERRORS.click();
        if let Some(logger) = &self.logger {
            logger.log_error(error);
        }
    }
}

#[async_trait::async_trait]
impl ChatCompletion for InferenceClient {
    async fn stream_chat(&self, mut request: ChatCompletionRequest) -> Result<ChunkStream> {
        request.stream = true;
        CLIENT_REQUESTS.click();
        if let Some(logger) = &self.logger {
            logger.log_request(&request);
        }

        let url = self.endpoint()?;
        let start = Instant::now();
        let send = self
            .client
            .post(url)
            .headers(self.default_headers())
            .json(&request)
            .send();
        let response = tokio::time::timeout(self.timeout, send).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = match response {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let err = self.map_send_error(e);
                self.record_error(&err);
                return Err(err);
            }
            Err(_) => {
                let err = Error::timeout(
                    format!("No response within {}s", self.timeout.as_secs_f64()),
                    Some(self.timeout.as_secs_f64()),
                );
                self.record_error(&err);
                return Err(err);
            }
        };

        if !response.status().is_success() {
            let err = Self::process_error_response(response).await;
            self.record_error(&err);
            return Err(err);
        }

        let logger = self.logger.clone();
        let chunks = process_sse(response.bytes_stream()).inspect(move |item| {
            if let Some(logger) = &logger {
                match item {
                    Ok(chunk) => logger.log_chunk(chunk),
                    Err(err) => logger.log_error(err),
                }
            }
        });
        Ok(Box::pin(chunks))
    }
}

impl fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

/// HTTP client settings shared by every [`InferenceClient`].
///
/// Only connecting is bounded here; `stream_chat` bounds the wait for headers.
fn http_client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    ReqwestClient::builder().connect_timeout(timeout)
}

/// Parses `base_url` and makes sure relative joins append to its path.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("{base_url} cannot be used as a base URL"),
            None,
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
