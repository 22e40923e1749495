//! Resource-type filtering for the scrape path: image, font, and media
//! requests are irrelevant to text/structure extraction and meaningfully
//! slow page load, so they are aborted at the CDP fetch layer.
//!
//! The policy must be installed before navigation begins; requests issued
//! before interception is enabled are not covered.

use crate::error::{RenderError, Result};
use headless_chrome::Tab;
use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision};
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::FailRequest;
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Network::{ErrorReason, ResourceType};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the policy does with a paused request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Abort with `BlockedByClient`
    Abort,
    /// Continue unmodified
    Allow,
}

/// Whether a resource type is blocked on the scrape path
pub fn should_block(resource_type: &ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::Image | ResourceType::Font | ResourceType::Media
    )
}

/// Counters for decisions made by a filter, readable after the page is gone
#[derive(Debug, Default)]
pub struct FilterStats {
    aborted: AtomicUsize,
    allowed: AtomicUsize,
}

impl FilterStats {
    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::Relaxed)
    }

    pub fn allowed(&self) -> usize {
        self.allowed.load(Ordering::Relaxed)
    }
}

/// Request interceptor that aborts non-essential resource loads
#[derive(Default)]
pub struct ResourceFilter {
    stats: Arc<FilterStats>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Arc<FilterStats> {
        self.stats.clone()
    }

    /// Decide and record the fate of one request by resource type
    pub fn decide(&self, resource_type: &ResourceType) -> FilterDecision {
        if should_block(resource_type) {
            self.stats.aborted.fetch_add(1, Ordering::Relaxed);
            FilterDecision::Abort
        } else {
            self.stats.allowed.fetch_add(1, Ordering::Relaxed);
            FilterDecision::Allow
        }
    }
}

impl RequestInterceptor for ResourceFilter {
    fn intercept(
        &self,
        _transport: Arc<Transport>,
        _session_id: SessionId,
        event: RequestPausedEvent,
    ) -> RequestPausedDecision {
        let params = event.params;

        match self.decide(&params.resource_Type) {
            FilterDecision::Abort => {
                log::debug!(
                    "blocking {:?} request: {}",
                    params.resource_Type,
                    params.request.url
                );
                RequestPausedDecision::Fail(FailRequest {
                    request_id: params.request_id,
                    error_reason: ErrorReason::BlockedByClient,
                })
            }
            FilterDecision::Allow => RequestPausedDecision::Continue(None),
        }
    }
}

/// Enable fetch-domain interception on the tab and attach the filter.
/// Returns the filter's counters. Call before the first navigation.
pub fn install(tab: &Arc<Tab>) -> Result<Arc<FilterStats>> {
    let filter = Arc::new(ResourceFilter::new());
    let stats = filter.stats();

    tab.enable_fetch(None, None).map_err(|e| {
        RenderError::Navigation(format!("failed to enable request interception: {}", e))
    })?;
    tab.enable_request_interception(filter).map_err(|e| {
        RenderError::Navigation(format!("failed to attach resource filter: {}", e))
    })?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_resource_types() {
        assert!(should_block(&ResourceType::Image));
        assert!(should_block(&ResourceType::Font));
        assert!(should_block(&ResourceType::Media));
    }

    #[test]
    fn test_allowed_resource_types() {
        assert!(!should_block(&ResourceType::Document));
        assert!(!should_block(&ResourceType::Stylesheet));
        assert!(!should_block(&ResourceType::Script));
        assert!(!should_block(&ResourceType::Fetch));
        assert!(!should_block(&ResourceType::Other));
    }

    #[test]
    fn test_decisions_are_counted() {
        let filter = ResourceFilter::new();
        let stats = filter.stats();

        // A page load issuing a mix of resource requests: everything the
        // policy covers is aborted, everything else continues.
        let stream = [
            ResourceType::Document,
            ResourceType::Script,
            ResourceType::Image,
            ResourceType::Image,
            ResourceType::Font,
            ResourceType::Stylesheet,
            ResourceType::Media,
            ResourceType::Fetch,
        ];

        for resource_type in &stream {
            let decision = filter.decide(resource_type);
            assert_eq!(
                decision == FilterDecision::Abort,
                should_block(resource_type)
            );
        }

        assert_eq!(stats.aborted(), 4);
        assert_eq!(stats.allowed(), 4);
    }
}
