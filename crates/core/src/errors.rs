use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failure kinds surfaced by the three discovery operations. Every caller
/// sees exactly one of these; none are retried inside the core.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("product not found: {0}")]
    NotFound(String),
    #[error("recommendation delegate unavailable: {0}")]
    RecommendationUnavailable(String),
    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DiscoveryError {
    /// Stable kind label for structured logs and error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFilter(_) => "invalid_filter",
            Self::NotFound(_) => "not_found",
            Self::RecommendationUnavailable(_) => "recommendation_unavailable",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// Client errors are the caller's fault; everything else is a
    /// dependency failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFilter(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_labels() {
        assert_eq!(DiscoveryError::InvalidFilter("x".into()).kind(), "invalid_filter");
        assert_eq!(DiscoveryError::NotFound("p".into()).kind(), "not_found");
        assert_eq!(
            DiscoveryError::RecommendationUnavailable("timeout".into()).kind(),
            "recommendation_unavailable"
        );
        assert_eq!(DiscoveryError::StoreUnavailable("down".into()).kind(), "store_unavailable");
    }

    #[test]
    fn only_filter_and_lookup_failures_are_client_errors() {
        assert!(DiscoveryError::InvalidFilter("bad limit".into()).is_client_error());
        assert!(DiscoveryError::NotFound("prod-404".into()).is_client_error());
        assert!(!DiscoveryError::RecommendationUnavailable("503".into()).is_client_error());
        assert!(!DiscoveryError::StoreUnavailable("pool closed".into()).is_client_error());
    }

    #[test]
    fn display_includes_detail() {
        let error = DiscoveryError::NotFound("prod-404".into());
        assert_eq!(error.to_string(), "product not found: prod-404");
    }
}
