//! Connection parameters for the relay ingress endpoint.

use crate::{TransportError, TransportResult};
use omf_protocol_types::{DEFAULT_INGRESS_URN, MESSAGE_FORMAT_JSON, OMF_HEADER_VERSION};
use std::time::Duration;
use url::Url;

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Values that remain constant across every message sent by the process.
#[derive(Debug, Clone)]
pub struct ServerParams {
    /// Relay host name or address.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Ingress path; must start with `/`.
    pub urn: String,
    /// Opaque producer token identifying this publisher.
    pub producer_token: String,
    /// Value of the `omfversion` header.
    pub header_version: String,
    /// Value of the `messageformat` header.
    pub message_format: String,
    /// URL scheme. Always `https` against a real relay.
    pub scheme: String,
    /// Verify the relay certificate and host name.
    pub verify_certificates: bool,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
}

impl ServerParams {
    /// Parameters for an HTTPS relay on the default ingress path.
    pub fn new(host: impl Into<String>, port: u16, producer_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            urn: DEFAULT_INGRESS_URN.to_string(),
            producer_token: producer_token.into(),
            header_version: OMF_HEADER_VERSION.to_string(),
            message_format: MESSAGE_FORMAT_JSON.to_string(),
            scheme: "https".to_string(),
            verify_certificates: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the ingress path. Values not starting with `/` are ignored
    /// and the current path is kept.
    pub fn with_urn(mut self, urn: &str) -> Self {
        if urn.starts_with('/') {
            self.urn = urn.to_string();
        }
        self
    }

    pub fn with_certificate_verification(mut self, verify: bool) -> Self {
        self.verify_certificates = verify;
        self
    }

    /// Use plain `http`. Only meant for local test endpoints.
    pub fn with_plain_http(mut self) -> Self {
        self.scheme = "http".to_string();
        self
    }

    pub fn with_timeouts(mut self, request: Duration, connect: Duration) -> Self {
        self.request_timeout = request;
        self.connect_timeout = connect;
        self
    }

    /// `host:port`, as it appears in log lines.
    pub fn host_in_post(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full ingress URL.
    pub fn endpoint_url(&self) -> TransportResult<Url> {
        if self.host.trim().is_empty() {
            return Err(TransportError::InvalidEndpoint("empty host".to_string()));
        }
        if !self.urn.starts_with('/') {
            return Err(TransportError::InvalidEndpoint(format!(
                "URN must start with '/': {}",
                self.urn
            )));
        }

        let raw = format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.urn);
        Url::parse(&raw).map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_relay_conventions() {
        let params = ServerParams::new("relay.local", 8118, "token");
        assert_eq!(params.urn, "/ingress/messages");
        assert_eq!(params.header_version, "1.0");
        assert_eq!(params.message_format, "JSON");
        assert_eq!(params.scheme, "https");
        assert!(params.verify_certificates);
        assert_eq!(params.request_timeout, Duration::from_secs(30));
        assert_eq!(params.host_in_post(), "relay.local:8118");
    }

    #[test]
    fn endpoint_url_combines_parts() {
        let url = ServerParams::new("relay.local", 8118, "t").endpoint_url().unwrap();
        assert_eq!(url.as_str(), "https://relay.local:8118/ingress/messages");
    }

    #[test]
    fn urn_override_requires_leading_slash() {
        let params = ServerParams::new("h", 1, "t").with_urn("/omf");
        assert_eq!(params.urn, "/omf");

        let params = ServerParams::new("h", 1, "t").with_urn("omf");
        assert_eq!(params.urn, "/ingress/messages");
    }

    #[test]
    fn empty_host_is_invalid() {
        let err = ServerParams::new("  ", 8118, "t").endpoint_url().unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint(_)));
    }

    #[test]
    fn plain_http_for_local_endpoints() {
        let url = ServerParams::new("127.0.0.1", 9000, "t")
            .with_plain_http()
            .endpoint_url()
            .unwrap();
        assert_eq!(url.scheme(), "http");
    }
}
