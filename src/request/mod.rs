//! Resilient request execution against vendor APIs
//!
//! A [`RequestExecutor`] sends one prepared request, retries transient
//! statuses with jittered backoff and folds every failure into a [`Fault`].

mod backoff;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use url::Url;

use crate::model::{DEFAULT_TIMEOUT, Fault, FaultContext, NormalizedOutcome, RawResponse};
use crate::service::notifier::FaultNotifier;

pub use backoff::{Backoff, RetryPolicy, backoff_delay};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Client(err)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Everything needed to send one request
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Name of the request type, used in fault messages
    pub caller: String,
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub credentials: Option<BasicAuth>,
}

impl PreparedRequest {
    /// A JSON request (`Accept` and `Content-Type` set to `application/json`)
    pub fn new(caller: impl Into<String>, method: Method, url: Url) -> Self {
        Self {
            caller: caller.into(),
            method,
            url,
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: None,
            credentials: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}

/// Sends a single HTTP attempt
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;

    /// Per-attempt timeout, when the transport enforces one
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// reqwest-backed transport with one timeout for connect and total time
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let started = Instant::now();

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(auth) = &request.credentials {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(TransportError::from_reqwest)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(TransportError::from_reqwest)?;

        Ok(RawResponse {
            status,
            body,
            elapsed: started.elapsed(),
        })
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}

/// Executes prepared requests with timeout, retry and failure escalation
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    notifier: Arc<dyn FaultNotifier>,
}

impl RequestExecutor {
    /// Executor over a reqwest client; `None` uses the default 45 second timeout
    pub fn new(
        timeout: Option<Duration>,
        notifier: Arc<dyn FaultNotifier>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(timeout.unwrap_or(DEFAULT_TIMEOUT))?;
        Ok(Self::with_transport(Arc::new(transport), notifier))
    }

    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        notifier: Arc<dyn FaultNotifier>,
    ) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            notifier,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.transport.timeout()
    }

    /// Send the request, retrying transient statuses
    ///
    /// Returns the first successful response. Any other resolution is
    /// reported to the notifier once and returned as a fault; retries are
    /// reported individually with their attempt number.
    pub async fn execute(&self, request: &PreparedRequest) -> Result<RawResponse, Fault> {
        let mut backoff = Backoff::new(&self.policy);
        let mut retries = 0u32;

        loop {
            tracing::debug!(
                caller = %request.caller,
                method = %request.method,
                url = %request.url,
                attempt = retries + 1,
                "Sending vendor request"
            );

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(caller = %request.caller, url = %request.url, error = %err, "Vendor request failed");
                    let fault = Fault::Network {
                        caller: request.caller.clone(),
                        message: err.to_string(),
                    };
                    self.notifier.notify(&fault, FaultContext::None);
                    return Err(fault);
                }
            };

            if response.is_success() {
                tracing::debug!(
                    caller = %request.caller,
                    status = response.status,
                    elapsed_ms = response.elapsed.as_millis() as u64,
                    "Vendor request succeeded"
                );
                return Ok(response);
            }

            let fault = Fault::Http {
                caller: request.caller.clone(),
                status: response.status,
            };

            if retries < self.policy.max_retries
                && self.policy.should_retry(&request.method, response.status)
            {
                retries += 1;
                self.notifier
                    .notify(&fault, FaultContext::Retry { attempt: retries });
                let delay = backoff.next_delay(retries);
                tracing::debug!(
                    caller = %request.caller,
                    status = response.status,
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying vendor request"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            tracing::warn!(caller = %request.caller, status = response.status, "Unexpected HTTP response");
            self.notifier.notify(&fault, FaultContext::None);
            return Err(fault);
        }
    }

    /// Execute the request and normalize the response with `handle`
    ///
    /// Transport and HTTP failures become `{success: false, errors: {network: true}}`
    /// with the fault attached.
    pub async fn fetch<F>(&self, request: &PreparedRequest, handle: F) -> NormalizedOutcome
    where
        F: FnOnce(RawResponse) -> NormalizedOutcome,
    {
        match self.execute(request).await {
            Ok(response) => handle(response),
            Err(fault) => NormalizedOutcome::network_failure(fault),
        }
    }
}
