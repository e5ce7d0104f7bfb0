//! HTTP transport backed by reqwest.
//!
//! Builds a configured client from [`TransportOptions`] and opens streamed
//! requests with a JSON body.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::{ClientError, Transport, TransportResponse};
use crate::model::StreamRequest;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Add extra headers to a request if specified in transport options.
///
/// # Example
/// ```ignore
/// let mut req = client.post(url);
/// req = add_extra_headers(req, &transport_options.extra_headers);
/// ```
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// [`Transport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    options: TransportOptions,
}

impl HttpClient {
    /// Create a transport with its own connection pool.
    pub fn new(options: TransportOptions) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(&options)?,
            options,
        })
    }

    /// Create a transport reusing an existing reqwest client. The timeout
    /// and proxy of `options` are ignored; headers and token still apply.
    pub fn with_client(client: Client, options: TransportOptions) -> Self {
        Self { client, options }
    }

    fn build_request(&self, request: &StreamRequest) -> RequestBuilder {
        let mut req = self
            .client
            .request(request.method.clone(), &request.url)
            .header(ACCEPT, "text/event-stream");

        if let Some(token) = &self.options.bearer_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }

        req = add_extra_headers(req, &self.options.extra_headers);

        match &request.body {
            Value::Null => req,
            body => req.json(body),
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, ClientError> {
        let send = self.build_request(request).send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::StreamCancelled),
            response = send => response?,
        };

        let status = response.status();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed();

        Ok(TransportResponse::new(status, body))
    }
}
