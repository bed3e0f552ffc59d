//! reqwest-backed transport speaking the OMF ingress header convention.

use crate::{ServerParams, Transport, TransportError, TransportResult};
use async_trait::async_trait;
use omf_protocol_types::{headers, Message};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// Longest response body excerpt kept in debug logs.
const MAX_LOGGED_BODY: usize = 256;

/// HTTPS transport for a single relay endpoint.
pub struct HttpsTransport {
    params: ServerParams,
    url: Url,
    client: Client,
}

impl HttpsTransport {
    /// Build the HTTP client for `params`.
    ///
    /// Fails when the endpoint URL is invalid or the TLS stack cannot be
    /// initialised; callers treat this as a communications-layer startup
    /// failure.
    pub fn new(params: ServerParams) -> TransportResult<Self> {
        let url = params.endpoint_url()?;

        if !params.verify_certificates {
            warn!(
                endpoint = %url,
                "Certificate and host name verification disabled; use only against test relays"
            );
        }

        let client = Client::builder()
            .timeout(params.request_timeout)
            .connect_timeout(params.connect_timeout)
            .danger_accept_invalid_certs(!params.verify_certificates)
            .build()
            .map_err(|e| TransportError::Init(format!("Failed to build HTTP client: {}", e)))?;

        debug!(endpoint = %url, "Ingress transport ready");

        Ok(Self {
            params,
            url,
            client,
        })
    }

    pub fn params(&self) -> &ServerParams {
        &self.params
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpsTransport {
    async fn send(&self, message: &Message) -> TransportResult<u16> {
        debug!(
            message_id = %message.message_id(),
            messagetype = message.category().as_str(),
            action = message.action().as_str(),
            bytes = message.payload().len(),
            "Posting message"
        );

        let response = self
            .client
            .post(self.url.clone())
            .header(headers::PRODUCER_TOKEN, &self.params.producer_token)
            .header(headers::MESSAGE_TYPE, message.category().as_str())
            .header(headers::ACTION, message.action().as_str())
            .header(headers::MESSAGE_FORMAT, &self.params.message_format)
            .header(headers::OMF_VERSION, &self.params.header_version)
            .header(CONTENT_TYPE, "application/json")
            .body(message.payload().to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(MAX_LOGGED_BODY).collect();
            debug!(
                message_id = %message.message_id(),
                status = status.as_u16(),
                body = %excerpt,
                "Relay answered with a non-success status"
            );
        }

        Ok(status.as_u16())
    }
}
