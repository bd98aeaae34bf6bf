//! Typed error hierarchy shared by every component in this crate.
//!
//! Classifies each failure as fatal (never retried), retryable (upstream
//! transient), or operational, and carries exactly the fields needed to
//! render the external HTTP mapping.

#[derive(Clone, Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no credential on file, or refresh failed; visit /auth/login")]
    NeedsLogin,
    #[error("authorization code exchange rejected: {0}")]
    AuthCodeRejected(String),
    #[error("upstream rate limited")]
    UpstreamRateLimited { retry_after: Option<String>, body: String },
    #[error("upstream error {status}: {body}")]
    UpstreamError { status: u16, body: String },
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamRateLimited { .. } | Self::UpstreamError { .. } | Self::UpstreamUnreachable(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::AuthCodeRejected(_))
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NeedsLogin => "needs_login",
            Self::AuthCodeRejected(_) => "auth_code_rejected",
            Self::UpstreamRateLimited { .. } => "upstream_rate_limited",
            Self::UpstreamError { .. } => "upstream_error",
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::StreamInterrupted(_) => "stream_interrupted",
        }
    }

    /// External HTTP status this error maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::NeedsLogin => 401,
            Self::AuthCodeRejected(_) => 502,
            Self::UpstreamRateLimited { .. } => 429,
            Self::UpstreamError { status, .. } => *status,
            Self::UpstreamUnreachable(_) => 502,
            Self::StreamInterrupted(_) => 502,
        }
    }

    /// Classify a non-2xx Anthropic response into the appropriate variant.
    /// 401 is handled by the caller (one-shot refresh+retry) before this is
    /// reached for the terminal case.
    pub fn from_upstream_status(status: u16, body: String, retry_after: Option<String>) -> Self {
        match status {
            429 => Self::UpstreamRateLimited { retry_after, body },
            401 => Self::NeedsLogin,
            _ => Self::UpstreamError { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GatewayError::UpstreamRateLimited { retry_after: None, body: "x".into() }.is_retryable());
        assert!(GatewayError::UpstreamError { status: 500, body: "x".into() }.is_retryable());
        assert!(GatewayError::UpstreamUnreachable("x".into()).is_retryable());
        assert!(!GatewayError::InvalidRequest("x".into()).is_retryable());
    }

    #[test]
    fn fatal_classification() {
        assert!(GatewayError::InvalidRequest("bad".into()).is_fatal());
        assert!(GatewayError::AuthCodeRejected("bad".into()).is_fatal());
        assert!(!GatewayError::NeedsLogin.is_fatal());
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(GatewayError::InvalidRequest("x".into()).http_status(), 400);
        assert_eq!(GatewayError::NeedsLogin.http_status(), 401);
        assert_eq!(GatewayError::AuthCodeRejected("x".into()).http_status(), 502);
        assert_eq!(
            GatewayError::UpstreamRateLimited { retry_after: None, body: "x".into() }.http_status(),
            429
        );
        assert_eq!(
            GatewayError::UpstreamError { status: 503, body: "x".into() }.http_status(),
            503
        );
        assert_eq!(GatewayError::UpstreamUnreachable("x".into()).http_status(), 502);
    }

    #[test]
    fn from_upstream_status_mapping() {
        assert!(matches!(
            GatewayError::from_upstream_status(429, "slow down".into(), Some("2".into())),
            GatewayError::UpstreamRateLimited { .. }
        ));
        assert!(matches!(
            GatewayError::from_upstream_status(500, "oops".into(), None),
            GatewayError::UpstreamError { status: 500, .. }
        ));
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(GatewayError::NeedsLogin.error_kind(), "needs_login");
        assert_eq!(
            GatewayError::UpstreamRateLimited { retry_after: None, body: "x".into() }.error_kind(),
            "upstream_rate_limited"
        );
    }
}
