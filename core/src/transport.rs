//! Executes `HttpRequest` values over the network.
//!
//! `Transport` is the single I/O seam of the harness. `UreqTransport` wraps
//! one `ureq::Agent`, so connections are pooled across the sequential calls
//! of a test run. Status codes are never turned into errors here.

use std::io::ErrorKind;
use std::time::Duration;

use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Sends one request and returns the raw response.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    max_response_size: u64,
}

impl UreqTransport {
    pub fn new(timeout: Duration, allow_insecure: bool, max_response_size: u64) -> Self {
        let mut builder = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout));
        if allow_insecure {
            builder = builder.tls_config(TlsConfig::builder().disable_verification(true).build());
        }
        Self {
            agent: builder.build().new_agent(),
            max_response_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.request_timeout(),
            config.allow_insecure_requests,
            config.max_response_size,
        )
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Head, _) => with_headers(self.agent.head(url), request).call(),
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), request).call(),
            (HttpMethod::Options, _) => with_headers(self.agent.options(url), request).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url), request).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), request).send_empty(),
        };
        let mut response = result.map_err(|err| classify(request, &err))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_response_size)
            .read_to_string()
            .map_err(|err| classify(request, &err))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn classify(request: &HttpRequest, err: &ureq::Error) -> ApiError {
    let method = request.method;
    let url = request.url.clone();
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout { method, url },
        ureq::Error::Io(io) if io.kind() == ErrorKind::TimedOut => ApiError::Timeout { method, url },
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            ApiError::Connection {
                method,
                url,
                message: err.to_string(),
            }
        }
        _ => ApiError::Request {
            method,
            url,
            message: err.to_string(),
        },
    }
}
