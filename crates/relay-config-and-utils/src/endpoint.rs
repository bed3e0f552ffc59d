//! Relay endpoint and run mode derived from the positional arguments.

use crate::{CoreError, CoreResult, Settings};
use ingress_transport::ServerParams;
use omf_protocol_types::DEFAULT_INGRESS_URN;
use std::fmt;

/// What the process does after start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Publish to the relay with certificate verification.
    Publish,
    /// Publish without verifying the relay certificate.
    NoCertCheck,
    /// Run the internal self-test suite and exit.
    SelfTest,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Publish => write!(f, "publish"),
            RunMode::NoCertCheck => write!(f, "publish (no certificate check)"),
            RunMode::SelfTest => write!(f, "self-test"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    pub urn: String,
    pub mode: RunMode,
}

impl EndpointConfig {
    /// Interpret `<HOST> <PORT> [URN] [tests|noCertCheck]`.
    ///
    /// The first extra argument is taken as the URN only when it starts
    /// with `/`. The last extra argument selects the mode by its first
    /// letter: `t`/`T` for the self-test, `n`/`N` to skip certificate
    /// checks. Anything else leaves the default mode.
    pub fn from_args(host: &str, port: u16, extra: &[String]) -> CoreResult<Self> {
        if extra.len() > 2 {
            return Err(CoreError::Config(format!(
                "expected at most 2 extra arguments, got {}",
                extra.len()
            )));
        }
        if host.trim().is_empty() {
            return Err(CoreError::Config("relay host is empty".to_string()));
        }

        let urn = extra
            .first()
            .filter(|arg| arg.starts_with('/'))
            .cloned()
            .unwrap_or_else(|| DEFAULT_INGRESS_URN.to_string());

        let mode = match extra.last().and_then(|arg| arg.chars().next()) {
            Some('t' | 'T') => RunMode::SelfTest,
            Some('n' | 'N') => RunMode::NoCertCheck,
            _ => RunMode::Publish,
        };

        Ok(Self {
            host: host.to_string(),
            port,
            urn,
            mode,
        })
    }

    pub fn verify_certificates(&self) -> bool {
        self.mode != RunMode::NoCertCheck
    }

    /// Transport parameters for this endpoint.
    pub fn server_params(&self, producer_token: &str, settings: &Settings) -> ServerParams {
        ServerParams::new(self.host.clone(), self.port, producer_token)
            .with_urn(&self.urn)
            .with_certificate_verification(self.verify_certificates())
            .with_timeouts(settings.request_timeout(), settings.connect_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn defaults_without_extras() {
        let config = EndpointConfig::from_args("relay.local", 8118, &[]).unwrap();
        assert_eq!(config.urn, "/ingress/messages");
        assert_eq!(config.mode, RunMode::Publish);
        assert!(config.verify_certificates());
    }

    #[test]
    fn urn_must_start_with_slash() {
        let config =
            EndpointConfig::from_args("relay.local", 8118, &args(&["/custom/path"])).unwrap();
        assert_eq!(config.urn, "/custom/path");

        let config = EndpointConfig::from_args("relay.local", 8118, &args(&["custom"])).unwrap();
        assert_eq!(config.urn, "/ingress/messages");
        assert_eq!(config.mode, RunMode::Publish);
    }

    #[test]
    fn mode_comes_from_last_argument() {
        let config = EndpointConfig::from_args("h", 1, &args(&["tests"])).unwrap();
        assert_eq!(config.mode, RunMode::SelfTest);

        let config = EndpointConfig::from_args("h", 1, &args(&["NoCertCheck"])).unwrap();
        assert_eq!(config.mode, RunMode::NoCertCheck);
        assert!(!config.verify_certificates());

        let config = EndpointConfig::from_args("h", 1, &args(&["/x", "Tests"])).unwrap();
        assert_eq!(config.urn, "/x");
        assert_eq!(config.mode, RunMode::SelfTest);

        let config = EndpointConfig::from_args("h", 1, &args(&["tests", "other"])).unwrap();
        assert_eq!(config.mode, RunMode::Publish);
    }

    #[test]
    fn too_many_extras_rejected() {
        let err = EndpointConfig::from_args("h", 1, &args(&["/x", "t", "n"])).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn server_params_carry_endpoint_and_timeouts() {
        let settings = Settings {
            request_timeout_secs: 7,
            connect_timeout_secs: 3,
            ..Settings::default()
        };
        let config = EndpointConfig::from_args("relay.local", 5460, &args(&["/omf", "n"])).unwrap();
        let params = config.server_params("token", &settings);

        assert_eq!(params.host_in_post(), "relay.local:5460");
        assert_eq!(params.urn, "/omf");
        assert_eq!(params.producer_token, "token");
        assert!(!params.verify_certificates);
        assert_eq!(params.request_timeout.as_secs(), 7);
        assert_eq!(params.connect_timeout.as_secs(), 3);
        assert_eq!(
            params.endpoint_url().unwrap().as_str(),
            "https://relay.local:5460/omf"
        );
    }
}
