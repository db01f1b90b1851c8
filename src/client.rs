use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{CompletionRequest, CompletionResponse};

/// The endpoint the chat client talks to when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://health-assistant-backend-production.up.railway.app/chat";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Something that can turn a conversation into a single answer.
///
/// [`CompletionClient`] is the HTTP implementation; the chat session is
/// generic over this trait so it can be driven by other backends.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends `request` and returns the full answer text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] for a non-success status and
    /// [`Error::InvalidResponse`] when the response carries no answer.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Client for the completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Duration,
}

impl CompletionClient {
    /// Create a new client for the default endpoint.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(endpoint: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.unwrap_or(DEFAULT_ENDPOINT))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::validation(
                format!("unsupported endpoint scheme: {}", endpoint.scheme()),
                Some("endpoint".to_string()),
            ));
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// The URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create and return default headers for endpoint requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
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

    async fn parse_response(&self, response: Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::server(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        parsed.into_answer().ok_or_else(Error::invalid_response)
    }
}

#[async_trait::async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        debug!(
            model = %request.model,
            turns = request.conversation.len(),
            endpoint = %self.endpoint,
            "sending completion request"
        );

        let result = match self
            .client
            .post(self.endpoint.clone())
            .headers(self.default_headers())
            .json(request)
            .send()
            .await
        {
            Ok(response) => self.parse_response(response).await,
            Err(e) => Err(self.map_send_error(e)),
        };

        let elapsed = start.elapsed().as_secs_f64();
        CLIENT_REQUEST_DURATION.add(elapsed);
        match &result {
            Ok(answer) => debug!(elapsed, answer_len = answer.len(), "completion received"),
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                warn!(elapsed, error = %err, "completion request failed");
            }
        }
        result
    }
}
