//! Mock variable discovery for testing.
//!
//! Provides a scripted implementation of the VariableDiscovery trait so the
//! pipeline can be exercised without fetching real module sources.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::discovery::{DiscoveryOutcome, DiscoveryRequest, VariableDiscovery};
use crate::error::{IacError, IacResult};

/// Predefined response for one source URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this outcome.
    Outcome(DiscoveryOutcome),
    /// Fail the call with a discovery error.
    Failure(String),
    /// Sleep, then return the outcome.
    Delayed(Duration, DiscoveryOutcome),
    /// Panic inside the call.
    Panic(String),
}

/// Mock discovery port.
///
/// Responses are keyed by source URL. Calls for unknown URLs fail with a
/// discovery error. Every request is captured for verification.
#[derive(Clone, Default)]
pub struct MockDiscovery {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    captured_requests: Arc<RwLock<Vec<DiscoveryRequest>>>,
}

impl MockDiscovery {
    /// Create a new mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `outcome` for `source_url`.
    pub fn with_outcome(self, source_url: impl Into<String>, outcome: DiscoveryOutcome) -> Self {
        self.with_response(source_url, MockResponse::Outcome(outcome))
    }

    /// Fail calls for `source_url`.
    pub fn with_failure(self, source_url: impl Into<String>, message: impl Into<String>) -> Self {
        self.with_response(source_url, MockResponse::Failure(message.into()))
    }

    pub fn with_response(self, source_url: impl Into<String>, response: MockResponse) -> Self {
        self.responses.write().insert(source_url.into(), response);
        self
    }

    /// Get all captured requests.
    pub fn requests(&self) -> Vec<DiscoveryRequest> {
        self.captured_requests.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_requests.read().len()
    }

    /// Clear all captured requests.
    pub fn clear_requests(&self) {
        self.captured_requests.write().clear();
    }
}

#[async_trait]
impl VariableDiscovery for MockDiscovery {
    async fn discover(&self, request: &DiscoveryRequest) -> IacResult<DiscoveryOutcome> {
        self.captured_requests.write().push(request.clone());

        let response = self.responses.read().get(&request.source_url).cloned();
        match response {
            Some(MockResponse::Outcome(outcome)) => Ok(outcome),
            Some(MockResponse::Failure(message)) => Err(IacError::Discovery(message)),
            Some(MockResponse::Delayed(delay, outcome)) => {
                tokio::time::sleep(delay).await;
                Ok(outcome)
            }
            Some(MockResponse::Panic(message)) => panic!("{}", message),
            None => Err(IacError::Discovery(format!(
                "no mock response for {}",
                request.source_url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> DiscoveryRequest {
        DiscoveryRequest {
            source_url: url.to_string(),
            git_ref: None,
            path: None,
            max_workers: Some(8),
        }
    }

    #[tokio::test]
    async fn test_mock_discovery_outcome() {
        let discovery = MockDiscovery::new().with_outcome(
            "https://github.com/a/b",
            DiscoveryOutcome::default().with_warning("deprecated input"),
        );

        let outcome = discovery.discover(&request("https://github.com/a/b")).await.unwrap();
        assert_eq!(outcome.warnings, vec!["deprecated input"]);
        assert_eq!(discovery.call_count(), 1);
        assert_eq!(discovery.requests()[0].max_workers, Some(8));
    }

    #[tokio::test]
    async fn test_mock_discovery_failure_and_unknown() {
        let discovery = MockDiscovery::new().with_failure("https://github.com/a/b", "clone failed");

        let err = discovery.discover(&request("https://github.com/a/b")).await.unwrap_err();
        assert!(err.to_string().contains("clone failed"));

        let err = discovery.discover(&request("https://github.com/x/y")).await.unwrap_err();
        assert!(matches!(err, IacError::Discovery(_)));

        discovery.clear_requests();
        assert_eq!(discovery.call_count(), 0);
    }
}
